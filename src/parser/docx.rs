//! DOCX ingestion: open as zip, walk `word/document.xml`,
//! map run formatting (bold/italic/strike) to `<strong>/<em>/<s>`, split
//! on `Heading*` paragraph styles, inline images from `word/media/` via
//! the `word/_rels/document.xml.rels` relationship map. New module, but
//! grounded in the same zip+quick_xml path-stack walking idiom the
//! teacher uses for FB2/EPUB (`local_name`, tolerant-of-malformed-XML
//! event loop).

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use base64::Engine;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::{ParseError, ParsedBook, RawChapter, finalize, html};

pub fn parse(bytes: &[u8]) -> Result<ParsedBook, ParseError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ParseError::Archive(e.to_string()))?;

    let doc_data = read_zip_entry(&mut archive, "word/document.xml")
        .map_err(|_| ParseError::Malformed("missing word/document.xml".to_string()))?;
    let rels = read_zip_entry_opt(&mut archive, "word/_rels/document.xml.rels")
        .map(|d| parse_rels(&d))
        .unwrap_or_default();
    let core = read_zip_entry_opt(&mut archive, "docProps/core.xml").map(|d| parse_core_props(&d));

    let mut chapters = split_document(&doc_data, &rels, &mut archive);
    let title = core
        .as_ref()
        .and_then(|c| c.title.clone())
        .or_else(|| chapters.first().map(|c| c.title.clone()))
        .unwrap_or_else(|| "Untitled".to_string());
    let author = core.and_then(|c| c.author).unwrap_or_default();

    if chapters.is_empty() {
        chapters.push(RawChapter {
            title: title.clone(),
            html: String::new(),
        });
    }

    Ok(finalize(
        title,
        author,
        chapters
            .into_iter()
            .map(|c| RawChapter {
                title: c.title,
                html: html::sanitize(&c.html),
            })
            .collect(),
    ))
}

struct CoreProps {
    title: Option<String>,
    author: Option<String>,
}

fn parse_core_props(data: &[u8]) -> CoreProps {
    let mut xml = Reader::from_reader(data);
    xml.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current_text = String::new();
    let mut title = None;
    let mut author = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) | Err(_) => break,
            Ok(Event::Start(ref e)) => {
                path.push(local_name(e.name().as_ref()));
                current_text.clear();
            }
            Ok(Event::End(_)) => {
                let tag = path.pop().unwrap_or_default();
                let text = current_text.trim().to_string();
                if !text.is_empty() {
                    match tag.as_str() {
                        "title" if title.is_none() => title = Some(text),
                        "creator" if author.is_none() => author = Some(text),
                        _ => {}
                    }
                }
                current_text.clear();
            }
            Ok(Event::Text(ref e)) => {
                if let Ok(text) = e.decode() {
                    current_text.push_str(&text);
                }
            }
            _ => {}
        }
        buf.clear();
    }

    CoreProps { title, author }
}

fn parse_rels(data: &[u8]) -> HashMap<String, String> {
    let mut xml = Reader::from_reader(data);
    xml.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) | Err(_) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == "relationship" {
                    let mut id = String::new();
                    let mut target = String::new();
                    for attr in e.attributes().flatten() {
                        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
                        let val = attr.unescape_value().unwrap_or_default();
                        match key {
                            "Id" => id = val.to_string(),
                            "Target" => target = val.to_string(),
                            _ => {}
                        }
                    }
                    if !id.is_empty() {
                        rels.insert(id, target);
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }
    rels
}

/// Splits `word/document.xml` into chapters at `Heading*`-styled
/// paragraphs, mapping run formatting and inlining `<w:drawing>` images.
fn split_document<R: Read + Seek>(
    doc_data: &[u8],
    rels: &HashMap<String, String>,
    archive: &mut zip::ZipArchive<R>,
) -> Vec<RawChapter> {
    let mut xml = Reader::from_reader(doc_data);
    xml.config_mut().trim_text(true);
    xml.config_mut().check_end_names = false;
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();

    let mut chapters: Vec<RawChapter> = Vec::new();
    let mut cur_html = String::new();
    let mut cur_title: Option<String> = None;
    let mut started = false;

    let mut in_p = false;
    let mut para_html = String::new();
    let mut para_plain = String::new();
    let mut para_is_heading = false;

    let mut run_bold = false;
    let mut run_italic = false;
    let mut run_strike = false;
    let mut run_text = String::new();

    macro_rules! flush_chapter {
        () => {
            if started && (!cur_html.trim().is_empty() || cur_title.is_some()) {
                let n = chapters.len() + 1;
                chapters.push(RawChapter {
                    title: cur_title.take().unwrap_or_else(|| format!("Chapter {n}")),
                    html: std::mem::take(&mut cur_html),
                });
            }
            cur_html.clear();
            cur_title = None;
        };
    }

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) | Err(_) => break,

            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "p" => {
                        in_p = true;
                        para_html.clear();
                        para_plain.clear();
                        para_is_heading = false;
                    }
                    "r" => {
                        run_bold = false;
                        run_italic = false;
                        run_strike = false;
                        run_text.clear();
                    }
                    _ => {}
                }
                path.push(local);
            }

            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "pstyle" => {
                        if let Some(val) = attr_value(e, "val") {
                            para_is_heading = val.to_ascii_lowercase().starts_with("heading")
                                || val.eq_ignore_ascii_case("title");
                        }
                    }
                    "b" => run_bold = !is_val_off(e),
                    "i" => run_italic = !is_val_off(e),
                    "strike" => run_strike = !is_val_off(e),
                    "blip" => {
                        if in_p && let Some(rid) = attr_value(e, "embed")
                            && let Some(target) = rels.get(&rid)
                        {
                            let path = resolve_media_path(target);
                            if let Some(data) = read_zip_entry_opt(archive, &path) {
                                let mime = guess_image_mime(&path);
                                let b64 = base64::engine::general_purpose::STANDARD.encode(&data);
                                para_html.push_str("<img src=\"data:");
                                para_html.push_str(mime);
                                para_html.push_str(";base64,");
                                para_html.push_str(&b64);
                                para_html.push_str("\">");
                            }
                        }
                    }
                    "br" => run_text.push_str("\u{2028}"),
                    _ => {}
                }
            }

            Ok(Event::End(_)) => {
                let local = path.pop().unwrap_or_default();
                match local.as_str() {
                    "r" => {
                        if !run_text.is_empty() {
                            let escaped = html_escape::encode_text(&run_text).replace('\u{2028}', "<br>");
                            para_plain.push_str(&run_text);
                            let mut wrapped = escaped.into_owned();
                            if run_strike {
                                wrapped = format!("<s>{wrapped}</s>");
                            }
                            if run_italic {
                                wrapped = format!("<em>{wrapped}</em>");
                            }
                            if run_bold {
                                wrapped = format!("<strong>{wrapped}</strong>");
                            }
                            para_html.push_str(&wrapped);
                        }
                    }
                    "p" => {
                        in_p = false;
                        if para_is_heading {
                            let text = para_plain.trim().to_string();
                            if !text.is_empty() {
                                flush_chapter!();
                                started = true;
                                cur_title = Some(text.clone());
                                cur_html.push_str("<h2>");
                                cur_html.push_str(&html_escape::encode_text(&text));
                                cur_html.push_str("</h2>");
                            }
                        } else if !para_html.trim().is_empty() {
                            started = true;
                            cur_html.push_str("<p>");
                            cur_html.push_str(&para_html);
                            cur_html.push_str("</p>");
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::Text(ref e)) => {
                if path.last().map(|s| s.as_str()) == Some("t")
                    && let Ok(text) = e.decode()
                {
                    run_text.push_str(&text);
                }
            }

            _ => {}
        }
        buf.clear();
    }

    flush_chapter!();
    chapters
}

fn is_val_off(e: &quick_xml::events::BytesStart<'_>) -> bool {
    matches!(attr_value(e, "val").as_deref(), Some("0") | Some("false"))
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        let local = key.rsplit(':').next().unwrap_or(key);
        if local == name {
            Some(attr.unescape_value().unwrap_or_default().to_string())
        } else {
            None
        }
    })
}

fn resolve_media_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix("/") {
        stripped.to_string()
    } else {
        format!("word/{target}")
    }
}

fn guess_image_mime(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

fn local_name(raw: &[u8]) -> String {
    let s = std::str::from_utf8(raw).unwrap_or("");
    match s.rfind(':') {
        Some(i) => s[i + 1..].to_lowercase(),
        None => s.to_lowercase(),
    }
}

fn read_to_vec(mut entry: impl Read) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(data)
}

fn read_zip_entry<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> std::io::Result<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    read_to_vec(entry)
}

fn read_zip_entry_opt<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    read_zip_entry(archive, name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_docx(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = zip::ZipWriter::new(cursor);
        let opts = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn splits_on_heading_style_and_maps_formatting() {
        let doc = br#"<w:document xmlns:w="ns">
          <w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Chapter One</w:t></w:r></w:p>
            <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r><w:r><w:t> plain</w:t></w:r></w:p>
          </w:body>
        </w:document>"#;
        let docx = make_docx(&[("word/document.xml", doc)]);
        let book = parse(&docx).unwrap();
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].title, "Chapter One");
        assert!(book.chapters[0].html.contains("<strong>bold</strong>"));
        assert!(book.chapters[0].html.contains("plain"));
    }

    #[test]
    fn inlines_media_via_relationships() {
        let doc = br#"<w:document xmlns:w="ns">
          <w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Pic</w:t></w:r></w:p>
            <w:p><w:r><w:drawing><a:blip r:embed="rId4" xmlns:a="a" xmlns:r="r"/></w:drawing></w:r></w:p>
          </w:body>
        </w:document>"#;
        let rels = br#"<Relationships><Relationship Id="rId4" Target="media/image1.png"/></Relationships>"#;
        let docx = make_docx(&[
            ("word/document.xml", doc),
            ("word/_rels/document.xml.rels", rels),
            ("word/media/image1.png", b"\x89PNGfakepng"),
        ]);
        let book = parse(&docx).unwrap();
        assert!(book.chapters[0].html.contains("data:image/png;base64,"));
    }
}
