//! FB2 ingestion: `title-info` for title/author, each
//! top-level `<section>` under `<body>` becomes a chapter, `<binary>`
//! elements become an id→data-URL map resolved against `<image href>`.
//! Generalized from the teacher's `scanner/parsers/fb2.rs` metadata-only
//! extractor — same tolerant-of-malformed-XML, path-stack walking idiom,
//! extended to also emit chapter HTML instead of stopping at metadata.

use std::collections::HashMap;

use base64::Engine;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::{ParseError, ParsedBook, RawChapter, finalize, html};

/// Placeholder written in place of an unresolved `<image>` reference;
/// binaries live at the end of the document, after the body, so image
/// references are resolved in a second pass over the built-up chapter
/// HTML rather than inline during the single-pass walk.
const IMG_MARK: char = '\u{0}';

pub fn parse(bytes: &[u8]) -> Result<ParsedBook, ParseError> {
    let mut xml = Reader::from_reader(bytes);
    xml.config_mut().trim_text(true);
    xml.config_mut().check_end_names = false;
    xml.config_mut().check_comments = false;

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();

    let mut book_title = String::new();
    let mut author_first = String::new();
    let mut author_last = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut description_done = false;

    let mut binaries: HashMap<String, String> = HashMap::new();
    let mut cur_binary_id: Option<String> = None;
    let mut cur_binary_type = String::new();
    let mut cur_binary_data = String::new();

    let mut chapters: Vec<RawChapter> = Vec::new();
    let mut chapter_buf = String::new();
    let mut chapter_title: Option<String> = None;
    let mut chapter_started = false;

    let mut in_title = false;
    let mut title_buf = String::new();

    macro_rules! flush_chapter {
        () => {
            if chapter_started && (!chapter_buf.trim().is_empty() || chapter_title.is_some()) {
                let n = chapters.len() + 1;
                chapters.push(RawChapter {
                    title: chapter_title
                        .take()
                        .unwrap_or_else(|| format!("Chapter {n}")),
                    html: std::mem::take(&mut chapter_buf),
                });
            }
            chapter_buf.clear();
            chapter_title = None;
        };
    }

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Err(_) => break,

            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref());

                if local == "section" && path.last().map(|s| s.as_str()) == Some("body") {
                    flush_chapter!();
                    chapter_started = true;
                }

                if local == "title" {
                    in_title = true;
                    title_buf.clear();
                }

                if local == "binary" {
                    let mut id = None;
                    let mut ctype = String::new();
                    for attr in e.attributes().flatten() {
                        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
                        let val = attr.unescape_value().unwrap_or_default();
                        match key {
                            "id" => id = Some(val.to_string()),
                            "content-type" => ctype = val.to_string(),
                            _ => {}
                        }
                    }
                    cur_binary_id = id;
                    cur_binary_type = ctype;
                    cur_binary_data.clear();
                }

                if local == "author" && path_contains(&path, "title-info") {
                    author_first.clear();
                    author_last.clear();
                }

                if description_done && cur_binary_id.is_none() && !in_title {
                    push_open_tag(&local, e, &mut chapter_buf);
                }

                path.push(local);
            }

            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());

                if description_done && cur_binary_id.is_none() {
                    if local == "image" {
                        if let Some(id) = image_href(e) {
                            chapter_buf.push(IMG_MARK);
                            chapter_buf.push_str(&format!("IMG:{id}"));
                            chapter_buf.push(IMG_MARK);
                        }
                    } else if local == "empty-line" {
                        // no-op: fb2 uses this purely as a visual spacer
                    }
                }
            }

            Ok(Event::End(_)) => {
                let local = path.pop().unwrap_or_default();

                match local.as_str() {
                    "title" => {
                        in_title = false;
                        if description_done {
                            let text = title_buf.trim().to_string();
                            if !text.is_empty() {
                                if chapter_started && chapter_title.is_none() {
                                    chapter_title = Some(text.clone());
                                }
                                chapter_buf.push_str("<h2>");
                                chapter_buf.push_str(&html_escape::encode_text(&text));
                                chapter_buf.push_str("</h2>");
                            }
                        }
                    }
                    "author" if path_contains(&path, "title-info") => {
                        let first = author_first.trim();
                        let last = author_last.trim();
                        let full = match (first.is_empty(), last.is_empty()) {
                            (false, false) => format!("{first} {last}"),
                            (true, false) => last.to_string(),
                            (false, true) => first.to_string(),
                            _ => String::new(),
                        };
                        if !full.is_empty() {
                            authors.push(full);
                        }
                    }
                    "description" => description_done = true,
                    "binary" => {
                        if let Some(id) = cur_binary_id.take() {
                            let clean: String =
                                cur_binary_data.chars().filter(|c| !c.is_whitespace()).collect();
                            if let Ok(decoded) =
                                base64::engine::general_purpose::STANDARD.decode(&clean)
                            {
                                let re_encoded =
                                    base64::engine::general_purpose::STANDARD.encode(&decoded);
                                binaries.insert(
                                    id,
                                    format!("data:{cur_binary_type};base64,{re_encoded}"),
                                );
                            }
                        }
                        cur_binary_type.clear();
                        cur_binary_data.clear();
                    }
                    "body" if !chapter_started => {
                        // body with no <section> at all: whatever accumulated
                        // becomes a single chapter so content isn't dropped.
                        chapter_started = true;
                        flush_chapter!();
                    }
                    _ => {
                        if description_done && cur_binary_id.is_none() && !in_title {
                            push_close_tag(&local, &mut chapter_buf);
                        }
                    }
                }
            }

            Ok(Event::Text(ref e)) => {
                let text = e.decode().unwrap_or_default();

                if cur_binary_id.is_some() {
                    cur_binary_data.push_str(&text);
                    buf.clear();
                    continue;
                }

                if in_title {
                    title_buf.push_str(&text);
                    buf.clear();
                    continue;
                }

                if !description_done {
                    let tag = path.last().map(|s| s.as_str()).unwrap_or("");
                    if tag == "book-title" && path_contains(&path, "title-info") {
                        if book_title.is_empty() {
                            book_title = text.trim().to_string();
                        }
                    } else if tag == "first-name" && path_contains(&path, "author") {
                        author_first.push_str(&text);
                    } else if tag == "last-name" && path_contains(&path, "author") {
                        author_last.push_str(&text);
                    }
                } else if cur_binary_id.is_none() {
                    chapter_buf.push_str(&html_escape::encode_text(&text));
                }
            }

            _ => {}
        }
        buf.clear();
    }

    flush_chapter!();

    // Resolve deferred <image href="#id"> placeholders now that every
    // <binary> has been collected.
    for chapter in &mut chapters {
        chapter.html = resolve_image_marks(&chapter.html, &binaries);
    }

    let title = if book_title.is_empty() {
        "Untitled".to_string()
    } else {
        book_title
    };
    let author = authors.join(", ");

    if chapters.is_empty() {
        chapters.push(RawChapter {
            title: title.clone(),
            html: String::new(),
        });
    }

    Ok(finalize(title, author, chapters.into_iter().map(|c| RawChapter {
        title: c.title,
        html: html::sanitize(&c.html),
    }).collect()))
}

fn push_open_tag(local: &str, e: &quick_xml::events::BytesStart<'_>, out: &mut String) {
    match local {
        "p" => out.push_str("<p>"),
        "emphasis" => out.push_str("<em>"),
        "strong" => out.push_str("<strong>"),
        "strikethrough" => out.push_str("<s>"),
        "sub" => out.push_str("<sub>"),
        "sup" => out.push_str("<sup>"),
        "image" => {
            if let Some(id) = image_href(e) {
                out.push(IMG_MARK);
                out.push_str(&format!("IMG:{id}"));
                out.push(IMG_MARK);
            }
        }
        _ => {}
    }
}

fn push_close_tag(local: &str, out: &mut String) {
    match local {
        "p" => out.push_str("</p>"),
        "emphasis" => out.push_str("</em>"),
        "strong" => out.push_str("</strong>"),
        "strikethrough" => out.push_str("</s>"),
        "sub" => out.push_str("</sub>"),
        "sup" => out.push_str("</sup>"),
        _ => {}
    }
}

fn image_href(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        if key.ends_with("href") {
            let val = attr.unescape_value().unwrap_or_default();
            let id = val.trim_start_matches('#').to_string();
            if !id.is_empty() {
                return Some(id);
            }
        }
    }
    None
}

fn resolve_image_marks(html: &str, binaries: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find(IMG_MARK) {
        out.push_str(&rest[..start]);
        let after = &rest[start + IMG_MARK.len_utf8()..];
        let Some(end) = after.find(IMG_MARK) else {
            out.push_str(after);
            rest = "";
            break;
        };
        let token = &after[..end];
        if let Some(id) = token.strip_prefix("IMG:") {
            let resolved = binaries.get(id).or_else(|| {
                binaries
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(id))
                    .map(|(_, v)| v)
            });
            if let Some(url) = resolved {
                out.push_str("<img src=\"");
                out.push_str(url);
                out.push_str("\">");
            }
        }
        rest = &after[end + IMG_MARK.len_utf8()..];
    }
    out.push_str(rest);
    out
}

fn local_name(raw: &[u8]) -> String {
    let s = std::str::from_utf8(raw).unwrap_or("");
    match s.rfind(':') {
        Some(i) => s[i + 1..].to_lowercase(),
        None => s.to_lowercase(),
    }
}

fn path_contains(path: &[String], tag: &str) -> bool {
    path.iter().any(|s| s == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(body: &str, binaries: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0"?>
<FictionBook>
  <description>
    <title-info>
      <book-title>Sample Book</book-title>
      <author><first-name>Jane</first-name><last-name>Doe</last-name></author>
      <lang>en</lang>
    </title-info>
  </description>
  <body>{body}</body>
  {binaries}
</FictionBook>"#
        )
        .into_bytes()
    }

    #[test]
    fn extracts_title_and_author() {
        let xml = sample("<section><title><p>Ch1</p></title><p>Hello world.</p></section>", "");
        let book = parse(&xml).unwrap();
        assert_eq!(book.title, "Sample Book");
        assert_eq!(book.author, "Jane Doe");
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].title, "Ch1");
        assert!(book.chapters[0].html.contains("Hello world."));
        assert!(book.chapters[0].html.contains("<h2>Ch1</h2>"));
    }

    #[test]
    fn each_top_level_section_is_a_chapter() {
        let xml = sample(
            "<section><title><p>One</p></title><p>A</p></section><section><title><p>Two</p></title><p>B</p></section>",
            "",
        );
        let book = parse(&xml).unwrap();
        assert_eq!(book.chapters.len(), 2);
        assert_eq!(book.chapters[0].title, "One");
        assert_eq!(book.chapters[1].title, "Two");
    }

    #[test]
    fn nested_sections_flatten_into_parent_chapter() {
        let xml = sample(
            "<section><title><p>Outer</p></title><p>A</p><section><title><p>Inner</p></title><p>B</p></section></section>",
            "",
        );
        let book = parse(&xml).unwrap();
        assert_eq!(book.chapters.len(), 1);
        assert!(book.chapters[0].html.contains("A"));
        assert!(book.chapters[0].html.contains("<h2>Inner</h2>"));
        assert!(book.chapters[0].html.contains("B"));
    }

    #[test]
    fn inline_formatting_is_mapped() {
        let xml = sample(
            "<section><p><emphasis>it</emphasis> and <strikethrough>gone</strikethrough> and <a href=\"x\">link</a></p></section>",
            "",
        );
        let book = parse(&xml).unwrap();
        let html = &book.chapters[0].html;
        assert!(html.contains("<em>it</em>"));
        assert!(html.contains("<s>gone</s>"));
        assert!(html.contains("link"));
        assert!(!html.contains("<a"));
    }

    #[test]
    fn binary_images_are_inlined_as_data_urls() {
        let img = base64::engine::general_purpose::STANDARD.encode(b"\xFF\xD8\xFF");
        let xml = sample(
            r#"<section><p>before</p><image href="#cover1"/></section>"#,
            &format!(r#"<binary id="cover1" content-type="image/jpeg">{img}</binary>"#),
        );
        let book = parse(&xml).unwrap();
        assert!(book.chapters[0].html.contains("data:image/jpeg;base64,"));
    }
}
