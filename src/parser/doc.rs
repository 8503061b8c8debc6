//! Legacy DOC ingestion: best-effort text extraction
//! from the pre-OOXML binary format — scan for UTF-16LE runs, fall back
//! to ASCII runs of ≥ 30 printable characters, normalize line endings,
//! wrap as a single chapter. Grounded in the teacher's
//! tolerant-of-malformed-input philosophy (scanner parsers return
//! partial results rather than erroring on anything short of an
//! unreadable archive).
//!
//! When both a UTF-16LE run and an ASCII run are present and non-empty,
//! UTF-16LE wins — this mirrors the legacy extractor this module is
//! modeled on.

use super::{ParseError, ParsedBook, RawChapter, finalize, html};

const MIN_ASCII_RUN: usize = 30;

pub fn parse(stem: &str, bytes: &[u8]) -> Result<ParsedBook, ParseError> {
    let utf16_text = extract_utf16le_runs(bytes);
    let text = if !utf16_text.trim().is_empty() {
        utf16_text
    } else {
        extract_ascii_runs(bytes)
    };

    let normalized = normalize_line_endings(&text);
    let body = html::paragraphs_from_plain_text(&normalized);

    Ok(finalize(
        stem.to_string(),
        String::new(),
        vec![RawChapter {
            title: stem.to_string(),
            html: body,
        }],
    ))
}

/// Scans for runs of two-byte little-endian code units that decode to
/// printable (or whitespace) characters, joining runs with a blank line.
fn extract_utf16le_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    let mut cur = String::new();
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        let unit = u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        match char::from_u32(unit as u32) {
            Some(c) if is_text_char(c) => {
                cur.push(c);
                i += 2;
            }
            _ => {
                flush_run(&mut runs, &mut cur);
                i += 1;
            }
        }
    }
    flush_run(&mut runs, &mut cur);
    runs.join("\n\n")
}

/// Scans for runs of ASCII printable bytes at least `MIN_ASCII_RUN` long.
fn extract_ascii_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    let mut cur = String::new();
    for &b in bytes {
        let c = b as char;
        if b.is_ascii() && is_text_char(c) {
            cur.push(c);
        } else {
            if cur.chars().count() >= MIN_ASCII_RUN {
                runs.push(std::mem::take(&mut cur));
            } else {
                cur.clear();
            }
        }
    }
    if cur.chars().count() >= MIN_ASCII_RUN {
        runs.push(cur);
    }
    runs.join("\n\n")
}

fn flush_run(runs: &mut Vec<String>, cur: &mut String) {
    let trimmed = cur.trim();
    if !trimmed.is_empty() {
        runs.push(trimmed.to_string());
    }
    cur.clear();
}

fn is_text_char(c: char) -> bool {
    c == '\n' || c == '\r' || c == '\t' || (!c.is_control() && c != '\u{FFFD}')
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn extracts_utf16le_text() {
        let bytes = utf16le("Hello from a legacy document with enough length.");
        let book = parse("report", &bytes).unwrap();
        assert!(book.chapters[0].html.contains("Hello from a legacy document"));
    }

    #[test]
    fn falls_back_to_ascii_runs_when_no_utf16_present() {
        let mut bytes = vec![0u8, 1, 2, 3];
        bytes.extend_from_slice(b"This is a long enough ascii run of printable text.");
        bytes.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x01]);
        let book = parse("legacy", &bytes).unwrap();
        assert!(book.chapters[0].html.contains("This is a long enough ascii run"));
    }

    #[test]
    fn prefers_utf16_over_ascii_when_both_present() {
        let mut bytes = utf16le("UTF16 preferred content here for the test.");
        bytes.extend_from_slice(b"This is a long enough ascii run that should be ignored today.");
        let book = parse("mixed", &bytes).unwrap();
        assert!(book.chapters[0].html.contains("UTF16 preferred content"));
        assert!(!book.chapters[0].html.contains("should be ignored"));
    }

    #[test]
    fn short_ascii_runs_are_discarded() {
        let bytes = b"short".to_vec();
        let book = parse("tiny", &bytes).unwrap();
        assert_eq!(book.chapters[0].html, "<article></article>");
    }
}
