//! Book ingestion: five formats in, one normalized tree out. Each format
//! module produces a `ParsedBook`; this module only dispatches by
//! extension and assigns opaque chapter ids.

pub mod doc;
pub mod docx;
pub mod epub;
pub mod fb2;
pub mod html;
pub mod txt;

use crate::db::models::new_id;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ParsedChapter {
    pub id: String,
    pub title: String,
    pub html: String,
}

#[derive(Debug, Clone, serde::Serialize, Default)]
pub struct ParsedBook {
    pub title: String,
    pub author: String,
    pub chapters: Vec<ParsedChapter>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported file extension")]
    UnsupportedExtension,
    #[error("malformed archive: {0}")]
    Archive(String),
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// A chapter still missing its id — every format module builds these,
/// letting this module be the single place ids are minted: chapter ids
/// are opaque and unique within the result.
pub(crate) struct RawChapter {
    pub title: String,
    pub html: String,
}

fn finalize(title: String, author: String, chapters: Vec<RawChapter>) -> ParsedBook {
    ParsedBook {
        title,
        author,
        chapters: chapters
            .into_iter()
            .map(|c| ParsedChapter {
                id: new_id(),
                title: c.title,
                html: html::wrap_article(&c.html),
            })
            .collect(),
    }
}

/// Dispatches on the lowercased filename extension.
pub fn parse(filename: &str, bytes: &[u8]) -> Result<ParsedBook, ParseError> {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    match ext.as_str() {
        "txt" => txt::parse(stem, bytes),
        "epub" => epub::parse(bytes),
        "fb2" => fb2::parse(bytes),
        "docx" => docx::parse(bytes),
        "doc" => doc::parse(stem, bytes),
        _ => Err(ParseError::UnsupportedExtension),
    }
}
