//! `POST /api/upload/{font,sound,image,book}`. Multipart intake: one file
//! field, gated by the upload kind's size/MIME/extension policy before a
//! single byte reaches the object store or parser.

use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::parser;
use crate::response::Data;
use crate::state::AppState;
use crate::storage::UploadKind;

fn parse_kind(raw: &str) -> Result<UploadKind, AppError> {
    match raw {
        "font" => Ok(UploadKind::Font),
        "sound" => Ok(UploadKind::Sound),
        "image" => Ok(UploadKind::Image),
        "book" => Ok(UploadKind::Book),
        _ => Err(AppError::NotFound("upload kind".to_string())),
    }
}

fn extension_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
    declared_mime: Option<String>,
}

/// Drains the first file field off the multipart body, enforcing the
/// kind's byte cap as data streams in rather than after the fact.
async fn take_file_field(
    mut multipart: Multipart,
    kind: UploadKind,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation("file", format!("invalid multipart body: {e}")))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let declared_mime = field.content_type().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::PayloadTooLarge)?
            .to_vec();
        if bytes.len() as u64 > kind.max_bytes() {
            return Err(AppError::PayloadTooLarge);
        }
        return Ok(UploadedFile {
            filename,
            bytes,
            declared_mime,
        });
    }
    Err(AppError::validation("file", "no file field present"))
}

/// Validates extension and MIME against the kind's whitelist, preferring
/// the content-sniffed type over the client-declared one: both must match.
fn validate_policy(kind: UploadKind, file: &UploadedFile) -> Result<(), AppError> {
    let ext = extension_of(&file.filename);
    if !kind.allowed_extensions().contains(&ext.as_str()) {
        return Err(AppError::validation(
            "file",
            format!("extension .{ext} is not allowed for upload kind {:?}", kind),
        ));
    }

    let sniffed = infer::get(&file.bytes).map(|t| t.mime_type().to_string());
    let candidate = sniffed.or_else(|| file.declared_mime.clone());
    // Plain-text formats (txt, fb2, docx-as-zip-but-infer-may-miss-office,
    // doc heuristics) often sniff as nothing or as generic octet-stream;
    // fall back to the declared content-type rather than reject outright.
    let mime_ok = match candidate {
        Some(mime) => kind.allowed_mime_types().contains(&mime.as_str()),
        None => kind == UploadKind::Book,
    };
    if !mime_ok {
        return Err(AppError::validation(
            "file",
            "file content does not match an allowed MIME type for this upload kind",
        ));
    }
    Ok(())
}

#[derive(Serialize, ToSchema)]
pub struct UploadedAssetView {
    pub url: String,
}

#[utoipa::path(post, path = "/api/upload/{kind}", tag = "upload", responses((status = 201, body = UploadedAssetView)))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let file = take_file_field(multipart, kind).await?;
    validate_policy(kind, &file)?;

    if kind == UploadKind::Book {
        let parsed = parser::parse(&file.filename, &file.bytes)
            .map_err(|e| AppError::validation("file", e.to_string()))?;
        return Ok(Data(serde_json::to_value(parsed).expect("ParsedBook always serializes")));
    }

    let mime = file
        .declared_mime
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let stored = state.store.put(kind, &file.bytes, &mime).await?;
    Ok(Data(
        serde_json::to_value(UploadedAssetView { url: stored.url }).expect("StoredObject always serializes"),
    ))
}
