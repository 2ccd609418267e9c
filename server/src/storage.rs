use std::path::PathBuf;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use syncboard_shared::history_format::{decode_history_file, encode_history_file};
use syncboard_shared::{HistoryFileData, HistoryFileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no stored history")]
    NotFound,
    #[error("history io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] HistoryFileError),
    #[error("s3 request failed: {0}")]
    S3(String),
}

/// Durable backend for the canvas history.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_history(&self) -> Result<HistoryFileData, StorageError>;
    async fn save_history(&self, data: &HistoryFileData) -> Result<(), StorageError>;
}

pub struct FileStorage {
    history_dir: PathBuf,
    canvas: String,
}

impl FileStorage {
    pub fn new(history_dir: PathBuf, canvas: impl Into<String>) -> Self {
        Self {
            history_dir,
            canvas: canvas.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.history_dir.join(format!("{}.bin", self.canvas))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load_history(&self) -> Result<HistoryFileData, StorageError> {
        let payload = match tokio::fs::read(self.path()).await {
            Ok(payload) => payload,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound)
            }
            Err(error) => return Err(error.into()),
        };
        Ok(decode_history_file(&payload)?)
    }

    async fn save_history(&self, data: &HistoryFileData) -> Result<(), StorageError> {
        let payload = encode_history_file(data)?;
        tokio::fs::create_dir_all(&self.history_dir).await?;
        // Readers only ever see a complete file.
        let staging = self.history_dir.join(format!("{}.bin.tmp", self.canvas));
        tokio::fs::write(&staging, payload).await?;
        tokio::fs::rename(&staging, self.path()).await?;
        Ok(())
    }
}

/// Where the history object lives and how to reach it. Unset fields fall
/// back to the AWS default chain (env, profile, instance metadata).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3StorageConfig {
    /// Only a complete key pair overrides the default provider chain.
    fn static_credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Some(Credentials::new(key, secret, None, None, "syncboard")),
            _ => None,
        }
    }

    fn object_key(&self, canvas: &str) -> String {
        let prefix = self.prefix.as_deref().unwrap_or_default().trim_matches('/');
        if prefix.is_empty() {
            format!("{canvas}.bin")
        } else {
            format!("{prefix}/{canvas}.bin")
        }
    }

    async fn client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(credentials) = self.static_credentials() {
            loader = loader.credentials_provider(credentials);
        }
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk);
        builder.set_endpoint_url(self.endpoint_url.clone());
        let s3 = builder.force_path_style(self.force_path_style).build();
        Client::from_conf(s3)
    }
}

pub struct S3Storage {
    bucket: String,
    key: String,
    client: Client,
}

impl S3Storage {
    pub async fn connect(config: &S3StorageConfig, canvas: &str) -> Self {
        Self {
            bucket: config.bucket.clone(),
            key: config.object_key(canvas),
            client: config.client().await,
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn load_history(&self) -> Result<HistoryFileData, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;
        let output = match response {
            Ok(output) => output,
            Err(error) => {
                if let Some(service_error) = error.as_service_error() {
                    if service_error.is_no_such_key() {
                        return Err(StorageError::NotFound);
                    }
                }
                return Err(StorageError::S3(format!("get {}: {error:?}", self.key)));
            }
        };
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|error| StorageError::S3(format!("read {}: {error:?}", self.key)))?
            .into_bytes();
        Ok(decode_history_file(&bytes)?)
    }

    async fn save_history(&self, data: &HistoryFileData) -> Result<(), StorageError> {
        let body = ByteStream::from(encode_history_file(data)?);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(body)
            .send()
            .await
            .map_err(|error| StorageError::S3(format!("put {}: {error:?}", self.key)))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
