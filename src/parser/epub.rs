//! EPUB ingestion: unzip, `container.xml` → `.opf`, walk
//! the spine in order, split each spine document by heading elements
//! into chapters, inline referenced images as `data:` URLs read straight
//! from the zip. Generalized from the teacher's
//! `scanner/parsers/epub.rs` container/OPF-walking idiom — that module
//! stops at metadata and a single cover image; this one also walks every
//! spine document's body to produce chapter HTML.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use base64::Engine;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::{ParseError, ParsedBook, RawChapter, finalize, html};

pub fn parse(bytes: &[u8]) -> Result<ParsedBook, ParseError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ParseError::Archive(e.to_string()))?;

    let opf_path = find_opf_path(&mut archive)?;
    let opf_data =
        read_zip_entry(&mut archive, &opf_path).map_err(|e| ParseError::Archive(e.to_string()))?;
    let opf_dir = match opf_path.rfind('/') {
        Some(i) => opf_path[..=i].to_string(),
        None => String::new(),
    };

    let info = parse_opf(&opf_data);

    let mut chapters: Vec<RawChapter> = Vec::new();
    for item_href in &info.spine_hrefs {
        let doc_path = resolve_path(&opf_dir, item_href);
        let Some(doc_data) = read_zip_entry_opt(&mut archive, &doc_path) else {
            continue;
        };
        let doc_dir = match doc_path.rfind('/') {
            Some(i) => doc_path[..=i].to_string(),
            None => String::new(),
        };
        chapters.append(&mut split_document(&doc_data, &doc_dir, &mut archive));
    }

    let title = info.title.clone().unwrap_or_else(|| "Untitled".to_string());
    if chapters.is_empty() {
        chapters.push(RawChapter {
            title: title.clone(),
            html: String::new(),
        });
    }

    let author = info.authors.join(", ");
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

fn find_opf_path<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<String, ParseError> {
    if let Ok(entry) = archive.by_name("META-INF/container.xml") {
        let data = read_to_vec(entry).map_err(|e| ParseError::Archive(e.to_string()))?;
        if let Some(path) = parse_container_xml(&data) {
            return Ok(path);
        }
    }

    let mut opf_files = Vec::new();
    for i in 0..archive.len() {
        if let Ok(entry) = archive.by_index(i)
            && entry.name().ends_with(".opf")
        {
            opf_files.push(entry.name().to_string());
        }
    }
    match opf_files.len() {
        1 => Ok(opf_files.remove(0)),
        0 => Err(ParseError::Malformed("no OPF file found in EPUB".to_string())),
        _ => opf_files
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Malformed("multiple OPF files found in EPUB".to_string())),
    }
}

fn parse_container_xml(data: &[u8]) -> Option<String> {
    let mut xml = Reader::from_reader(data);
    xml.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut rootfiles: Vec<(String, bool)> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) | Err(_) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == "rootfile" {
                    let mut full_path = None;
                    let mut is_opf = false;
                    for attr in e.attributes().flatten() {
                        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
                        let val = attr.unescape_value().unwrap_or_default();
                        if key == "full-path" {
                            full_path = Some(val.to_string());
                        }
                        if key == "media-type" && val == "application/oebps-package+xml" {
                            is_opf = true;
                        }
                    }
                    if let Some(path) = full_path {
                        rootfiles.push((path, is_opf));
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    match rootfiles.len() {
        0 => None,
        1 => Some(rootfiles.remove(0).0),
        _ => rootfiles.into_iter().find(|(_, is_opf)| *is_opf).map(|(p, _)| p),
    }
}

struct OpfInfo {
    title: Option<String>,
    authors: Vec<String>,
    spine_hrefs: Vec<String>,
}

fn parse_opf(data: &[u8]) -> OpfInfo {
    let mut xml = Reader::from_reader(data);
    xml.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();

    let mut manifest: HashMap<String, String> = HashMap::new();
    let mut spine_idrefs: Vec<String> = Vec::new();
    let mut title: Option<String> = None;
    let mut creator_role: Option<String> = None;
    let mut creators_aut: Vec<String> = Vec::new();
    let mut creators_all: Vec<String> = Vec::new();
    let mut current_text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) | Err(_) => break,

            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref());
                handle_manifest_and_creator(&local, e, &mut manifest, &mut spine_idrefs, &mut creator_role);
                path.push(local);
                current_text.clear();
            }

            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());
                handle_manifest_and_creator(&local, e, &mut manifest, &mut spine_idrefs, &mut creator_role);
            }

            Ok(Event::End(_)) => {
                let tag = path.pop().unwrap_or_default();
                let text = current_text.trim().to_string();
                match tag.as_str() {
                    "title" if path_in_metadata(&path) && title.is_none() && !text.is_empty() => {
                        title = Some(text);
                    }
                    "creator" if path_in_metadata(&path) && !text.is_empty() => {
                        if creator_role.as_deref() == Some("aut") {
                            creators_aut.push(text.clone());
                        }
                        creators_all.push(text);
                        creator_role = None;
                    }
                    _ => {}
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

    let authors = if !creators_aut.is_empty() { creators_aut } else { creators_all };
    let spine_hrefs = spine_idrefs
        .iter()
        .filter_map(|id| manifest.get(id).cloned())
        .collect();

    OpfInfo { title, authors, spine_hrefs }
}

fn handle_manifest_and_creator(
    local: &str,
    e: &quick_xml::events::BytesStart<'_>,
    manifest: &mut HashMap<String, String>,
    spine_idrefs: &mut Vec<String>,
    creator_role: &mut Option<String>,
) {
    if local == "item" {
        let mut id = String::new();
        let mut href = String::new();
        for attr in e.attributes().flatten() {
            let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
            let val = attr.unescape_value().unwrap_or_default();
            match key {
                "id" => id = val.to_string(),
                "href" => href = val.to_string(),
                _ => {}
            }
        }
        if !id.is_empty() {
            manifest.insert(id, href);
        }
    }

    if local == "itemref" {
        for attr in e.attributes().flatten() {
            let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
            if key == "idref" {
                let val = attr.unescape_value().unwrap_or_default();
                spine_idrefs.push(val.to_string());
            }
        }
    }

    if local == "creator" {
        *creator_role = None;
        for attr in e.attributes().flatten() {
            let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
            if key == "role" || key.ends_with(":role") {
                let val = attr.unescape_value().unwrap_or_default();
                *creator_role = Some(val.to_string());
            }
        }
    }
}

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Splits one spine document's body into chapters at heading boundaries —
/// a single spine item may become multiple chapters — mapping run
/// formatting and inlining images along the way.
fn split_document<R: Read + Seek>(
    doc_data: &[u8],
    doc_dir: &str,
    archive: &mut zip::ZipArchive<R>,
) -> Vec<RawChapter> {
    let mut xml = Reader::from_reader(doc_data);
    xml.config_mut().trim_text(true);
    xml.config_mut().check_end_names = false;
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();

    let mut in_body = false;
    let mut chapters: Vec<RawChapter> = Vec::new();
    let mut cur_html = String::new();
    let mut cur_title: Option<String> = None;
    let mut in_heading = false;
    let mut heading_buf = String::new();
    let mut started = false;

    macro_rules! flush {
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
                if local == "body" {
                    in_body = true;
                } else if in_body {
                    if HEADINGS.contains(&local.as_str()) {
                        flush!();
                        started = true;
                        in_heading = true;
                        heading_buf.clear();
                    } else {
                        push_open(&local, &mut cur_html);
                    }
                }
                path.push(local);
            }

            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());
                if in_body {
                    if local == "img" {
                        inline_image(e, doc_dir, archive, &mut cur_html);
                    } else if local == "br" {
                        cur_html.push_str("<br>");
                    }
                }
            }

            Ok(Event::End(_)) => {
                let local = path.pop().unwrap_or_default();
                if local == "body" {
                    in_body = false;
                } else if HEADINGS.contains(&local.as_str()) {
                    in_heading = false;
                    let text = heading_buf.trim().to_string();
                    if !text.is_empty() {
                        if cur_title.is_none() {
                            cur_title = Some(text.clone());
                        }
                        cur_html.push_str("<h2>");
                        cur_html.push_str(&html_escape::encode_text(&text));
                        cur_html.push_str("</h2>");
                    }
                } else if in_body {
                    push_close(&local, &mut cur_html);
                }
            }

            Ok(Event::Text(ref e)) => {
                let text = e.decode().unwrap_or_default();
                if in_heading {
                    heading_buf.push_str(&text);
                } else if in_body {
                    cur_html.push_str(&html_escape::encode_text(&text));
                }
            }

            _ => {}
        }
        buf.clear();
    }

    flush!();
    chapters
}

fn push_open(local: &str, out: &mut String) {
    match local {
        "p" | "div" => out.push_str("<p>"),
        "b" | "strong" => out.push_str("<strong>"),
        "i" | "em" => out.push_str("<em>"),
        "s" | "strike" | "del" => out.push_str("<s>"),
        "sub" => out.push_str("<sub>"),
        "sup" => out.push_str("<sup>"),
        _ => {}
    }
}

fn push_close(local: &str, out: &mut String) {
    match local {
        "p" | "div" => out.push_str("</p>"),
        "b" | "strong" => out.push_str("</strong>"),
        "i" | "em" => out.push_str("</em>"),
        "s" | "strike" | "del" => out.push_str("</s>"),
        "sub" => out.push_str("</sub>"),
        "sup" => out.push_str("</sup>"),
        _ => {}
    }
}

fn inline_image<R: Read + Seek>(
    e: &quick_xml::events::BytesStart<'_>,
    doc_dir: &str,
    archive: &mut zip::ZipArchive<R>,
    out: &mut String,
) {
    let Some(src) = e.attributes().flatten().find_map(|attr| {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        if key == "src" {
            Some(attr.unescape_value().unwrap_or_default().to_string())
        } else {
            None
        }
    }) else {
        return;
    };
    let img_path = resolve_path(doc_dir, &src);
    let Some(data) = read_zip_entry_opt(archive, &img_path) else {
        return;
    };
    let mime = guess_image_mime(&img_path);
    let b64 = base64::engine::general_purpose::STANDARD.encode(&data);
    out.push_str("<img src=\"data:");
    out.push_str(mime);
    out.push_str(";base64,");
    out.push_str(&b64);
    out.push_str("\">");
}

fn guess_image_mime(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "image/jpeg"
    }
}

fn resolve_path(base_dir: &str, href: &str) -> String {
    let href = href.split(['#', '?']).next().unwrap_or(href);
    if href.starts_with('/') {
        href.trim_start_matches('/').to_string()
    } else {
        format!("{base_dir}{href}")
    }
}

fn local_name(raw: &[u8]) -> String {
    let s = std::str::from_utf8(raw).unwrap_or("");
    match s.rfind(':') {
        Some(i) => s[i + 1..].to_lowercase(),
        None => s.to_lowercase(),
    }
}

fn path_in_metadata(path: &[String]) -> bool {
    path.iter().any(|s| s == "metadata")
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

    fn make_epub(entries: &[(&str, &[u8])]) -> Vec<u8> {
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

    const CONTAINER: &[u8] = br#"<container><rootfiles><rootfile full-path="OPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#;

    fn opf(spine_ids: &str) -> Vec<u8> {
        format!(
            r#"<package xmlns:dc="http://purl.org/dc/elements/1.1/">
              <metadata>
                <dc:title>Test Book</dc:title>
                <dc:creator opf:role="aut">Jane Doe</dc:creator>
              </metadata>
              <manifest>
                <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
              </manifest>
              <spine>{spine_ids}</spine>
            </package>"#
        )
        .into_bytes()
    }

    #[test]
    fn parses_title_author_and_single_chapter() {
        let ch1 = br#"<html><body><h1>Intro</h1><p>Hello <b>world</b>.</p></body></html>"#;
        let epub = make_epub(&[
            ("META-INF/container.xml", CONTAINER),
            ("OPS/content.opf", &opf(r#"<itemref idref="ch1"/>"#)),
            ("OPS/ch1.xhtml", ch1),
        ]);
        let book = parse(&epub).unwrap();
        assert_eq!(book.title, "Test Book");
        assert_eq!(book.author, "Jane Doe");
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].title, "Intro");
        assert!(book.chapters[0].html.contains("Hello <strong>world</strong>"));
    }

    #[test]
    fn splits_single_spine_item_on_headings() {
        let ch1 = br#"<html><body><h1>One</h1><p>A</p><h1>Two</h1><p>B</p></body></html>"#;
        let epub = make_epub(&[
            ("META-INF/container.xml", CONTAINER),
            ("OPS/content.opf", &opf(r#"<itemref idref="ch1"/>"#)),
            ("OPS/ch1.xhtml", ch1),
        ]);
        let book = parse(&epub).unwrap();
        assert_eq!(book.chapters.len(), 2);
        assert_eq!(book.chapters[0].title, "One");
        assert_eq!(book.chapters[1].title, "Two");
    }

    #[test]
    fn inlines_images_as_data_urls() {
        let ch1 = br#"<html><body><h1>Pic</h1><img src="img/cover.jpg"/></body></html>"#;
        let epub = make_epub(&[
            ("META-INF/container.xml", CONTAINER),
            ("OPS/content.opf", &opf(r#"<itemref idref="ch1"/>"#)),
            ("OPS/ch1.xhtml", ch1),
            ("OPS/img/cover.jpg", b"\xFF\xD8\xFFjpegdata"),
        ]);
        let book = parse(&epub).unwrap();
        assert!(book.chapters[0].html.contains("data:image/jpeg;base64,"));
    }
}
