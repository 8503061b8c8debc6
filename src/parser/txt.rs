//! TXT ingestion: title from the filename stem, one chapter, blank-line
//! paragraphs, HTML-escaped throughout.

use super::{ParseError, ParsedBook, RawChapter, finalize, html};

pub fn parse(stem: &str, bytes: &[u8]) -> Result<ParsedBook, ParseError> {
    let text = String::from_utf8_lossy(bytes).into_owned();
    let body = html::paragraphs_from_plain_text(&text);

    Ok(finalize(
        stem.to_string(),
        String::new(),
        vec![RawChapter {
            title: stem.to_string(),
            html: body,
        }],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_one_chapter_with_paragraphs() {
        let book = parse("novel", b"Para one.\n\nPara two.").unwrap();
        assert_eq!(book.title, "novel");
        assert_eq!(book.author, "");
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(
            book.chapters[0].html,
            "<article><p>Para one.</p><p>Para two.</p></article>"
        );
    }

    #[test]
    fn escapes_html_in_body() {
        let book = parse("x", b"a < b & c").unwrap();
        assert!(book.chapters[0].html.contains("a &lt; b &amp; c"));
    }
}
