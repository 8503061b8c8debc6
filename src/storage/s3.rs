use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::AppError;

use super::{ObjectStore, StoredObject, UploadKind, object_key};

/// S3-compatible object store used in production.
pub struct S3Store {
    client: Client,
    bucket: String,
    public_url: String,
    secret: Vec<u8>,
}

impl S3Store {
    pub async fn new(
        endpoint: Option<String>,
        region: String,
        access_key: String,
        secret_key: String,
        force_path_style: bool,
        bucket: String,
        public_url: String,
        secret: Vec<u8>,
    ) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "leaflet-server",
        );
        let mut builder = aws_sdk_s3::config::Builder::new()
            .region(aws_sdk_s3::config::Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(force_path_style)
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest());
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());
        Self {
            client,
            bucket,
            public_url,
            secret,
        }
    }
}

impl ObjectStore for S3Store {
    async fn put(
        &self,
        kind: UploadKind,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<StoredObject, AppError> {
        let key = object_key(kind, &self.secret);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("S3 put_object failed: {e}")))?;

        Ok(StoredObject {
            url: format!("{}/{}", self.public_url.trim_end_matches('/'), key),
        })
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let Some(key) = url.strip_prefix(&format!("{}/", self.public_url.trim_end_matches('/')))
        else {
            return Ok(());
        };
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("S3 delete_object failed: {e}")))?;
        Ok(())
    }

    async fn probe(&self) -> Result<(), AppError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("S3 bucket unreachable: {e}")))?;
        Ok(())
    }
}
