//! Object storage for product photos.

use async_trait::async_trait;
use mockall::automock;
use s3::creds::error::CredentialsError;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(#[from] S3Error),

    #[error("invalid storage credentials: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("storage rejected the upload: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

#[automock]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores the blob under `upload.key` and returns its public URL.
    async fn put(&self, upload: Upload) -> Result<String, StorageError>;
}

pub fn photo_key(product_id: &str, index: usize) -> String {
    format!("products/{product_id}/photo_{}.png", index + 1)
}

/// S3 bucket addressed path-style at the configured endpoint. Requests are
/// SigV4-signed with the configured access key.
pub struct S3Storage {
    bucket: Box<Bucket>,
    public_url: String,
}

impl S3Storage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )?;
        let bucket = Bucket::new(&config.bucket, region, credentials)?.with_path_style();

        Ok(S3Storage {
            bucket,
            public_url: config.public_url,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, upload: Upload) -> Result<String, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(&upload.key, &upload.body, &upload.content_type)
            .await?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            let text = String::from_utf8_lossy(response.as_slice()).into_owned();
            return Err(StorageError::Rejected(format!("{status}: {text}")));
        }

        log::debug!("Uploaded {}", upload.key);
        Ok(self.public_url(&upload.key))
    }
}
