pub mod local;
pub mod s3;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Font,
    Sound,
    Image,
    Book,
}

impl UploadKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            UploadKind::Font => "fonts",
            UploadKind::Sound => "sounds",
            UploadKind::Image => "images",
            UploadKind::Book => "books",
        }
    }

    /// Per-kind size cap, in bytes.
    pub fn max_bytes(&self) -> u64 {
        match self {
            UploadKind::Font => 400 * 1024,
            UploadKind::Sound => 2 * 1024 * 1024,
            UploadKind::Image => 5 * 1024 * 1024,
            UploadKind::Book => 50 * 1024 * 1024,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Font => &["ttf", "otf", "woff", "woff2"],
            UploadKind::Sound => &["mp3", "ogg", "wav", "m4a"],
            UploadKind::Image => &["png", "jpg", "jpeg", "gif", "webp"],
            UploadKind::Book => &["txt", "epub", "fb2", "docx", "doc"],
        }
    }

    pub fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Font => &[
                "font/ttf",
                "font/otf",
                "font/woff",
                "font/woff2",
                "application/font-woff",
                "application/octet-stream",
            ],
            UploadKind::Sound => &["audio/mpeg", "audio/ogg", "audio/wav", "audio/x-wav", "audio/mp4"],
            UploadKind::Image => &["image/png", "image/jpeg", "image/gif", "image/webp"],
            UploadKind::Book => &[
                "text/plain",
                "application/epub+zip",
                "application/zip",
                "application/x-fictionbook+xml",
                "text/xml",
                "application/xml",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/msword",
                "application/octet-stream",
            ],
        }
    }
}

pub struct StoredObject {
    pub url: String,
}

pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        kind: UploadKind,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<StoredObject, AppError>;

    async fn delete(&self, url: &str) -> Result<(), AppError>;

    /// HEAD-probes a known key so `/health` can report object-store status.
    async fn probe(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub enum ObjectStoreHandle {
    Local(std::sync::Arc<local::LocalFsStore>),
    S3(std::sync::Arc<s3::S3Store>),
}

impl ObjectStoreHandle {
    pub async fn put(
        &self,
        kind: UploadKind,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<StoredObject, AppError> {
        match self {
            ObjectStoreHandle::Local(s) => s.put(kind, bytes, mime_type).await,
            ObjectStoreHandle::S3(s) => s.put(kind, bytes, mime_type).await,
        }
    }

    pub async fn delete(&self, url: &str) -> Result<(), AppError> {
        match self {
            ObjectStoreHandle::Local(s) => s.delete(url).await,
            ObjectStoreHandle::S3(s) => s.delete(url).await,
        }
    }

    pub async fn probe(&self) -> Result<(), AppError> {
        match self {
            ObjectStoreHandle::Local(s) => s.probe().await,
            ObjectStoreHandle::S3(s) => s.probe().await,
        }
    }
}

/// Builds the configured backend: local filesystem in dev, S3-compatible
/// in prod, selected by `StorageConfig`'s variant. Object
/// keys are HMAC'd over random bytes using `secret` purely so they're
/// unguessable, not because the key itself is sensitive.
pub async fn build_store(
    storage: &crate::config::StorageConfig,
    secret: Vec<u8>,
) -> Result<ObjectStoreHandle, AppError> {
    match storage {
        crate::config::StorageConfig::Local { root_path } => {
            Ok(ObjectStoreHandle::Local(std::sync::Arc::new(
                local::LocalFsStore::new(root_path.clone(), "/objects".to_string(), secret),
            )))
        }
        crate::config::StorageConfig::S3 {
            endpoint,
            bucket,
            region,
            access_key,
            secret_key,
            force_path_style,
            public_url,
        } => {
            let store = s3::S3Store::new(
                endpoint.clone(),
                region.clone(),
                access_key.clone(),
                secret_key.clone(),
                *force_path_style,
                bucket.clone(),
                public_url.clone(),
                secret,
            )
            .await;
            Ok(ObjectStoreHandle::S3(std::sync::Arc::new(store)))
        }
    }
}

/// Random opaque object key, the same HMAC-token-over-random-state idiom
/// the teacher uses for upload tokens, prefixed by kind.
pub fn object_key(kind: UploadKind, secret: &[u8]) -> String {
    let random: [u8; 16] = rand::random();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts a key of any size");
    mac.update(b"object-key:");
    mac.update(&random);
    let token = hex::encode(mac.finalize().into_bytes());
    format!("{}/{}", kind.prefix(), token)
}
