use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use crate::error::AppError;

use super::{ObjectStore, StoredObject, UploadKind, object_key};

/// Filesystem-backed object store used in development. Objects are written
/// under `root_path/<kind>/<token>` and served back from the configured
/// public base (e.g. by a reverse proxy in front of `root_path`).
pub struct LocalFsStore {
    root_path: PathBuf,
    public_base: String,
    secret: Vec<u8>,
}

impl LocalFsStore {
    pub fn new(root_path: PathBuf, public_base: String, secret: Vec<u8>) -> Self {
        Self {
            root_path,
            public_base,
            secret,
        }
    }
}

impl ObjectStore for LocalFsStore {
    async fn put(
        &self,
        kind: UploadKind,
        bytes: &[u8],
        _mime_type: &str,
    ) -> Result<StoredObject, AppError> {
        let key = object_key(kind, &self.secret);
        let path = self.root_path.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("failed to create storage dir: {e}")))?;
        }
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create object file: {e}")))?;
        file.write_all(bytes)
            .await
            .map_err(|e| AppError::Internal(format!("failed to write object: {e}")))?;

        Ok(StoredObject {
            url: format!("{}/{}", self.public_base.trim_end_matches('/'), key),
        })
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let Some(key) = url.strip_prefix(&format!("{}/", self.public_base.trim_end_matches('/')))
        else {
            return Ok(());
        };
        let path = self.root_path.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("failed to delete object: {e}"))),
        }
    }

    async fn probe(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| AppError::Unavailable(format!("storage root unreachable: {e}")))
    }
}
