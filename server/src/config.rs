use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::history::DEFAULT_HISTORY_CAP;
use crate::storage::S3StorageConfig;

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:5174,http://localhost:5175";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,
    /// Maximum number of draw operations kept; oldest are evicted first.
    #[arg(long, env = "HISTORY_CAP", default_value_t = DEFAULT_HISTORY_CAP)]
    pub history_cap: usize,
    /// Persist history as a file in this directory.
    #[arg(long, env = "HISTORY_DIR")]
    pub history_dir: Option<PathBuf>,
    /// Name of the stored history object, without extension.
    #[arg(long, env = "CANVAS_NAME", default_value = "canvas")]
    pub canvas_name: String,
    /// Persist history to this S3 bucket instead of a local file.
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,
    #[arg(long, env = "S3_PREFIX")]
    pub s3_prefix: Option<String>,
    #[arg(long, env = "S3_REGION")]
    pub s3_region: Option<String>,
    #[arg(long, env = "S3_ENDPOINT_URL")]
    pub s3_endpoint_url: Option<String>,
    #[arg(long, env = "S3_FORCE_PATH_STYLE")]
    pub s3_force_path_style: bool,
    #[arg(long, env = "S3_ACCESS_KEY_ID", hide_env_values = true)]
    pub s3_access_key_id: Option<String>,
    #[arg(long, env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub s3_secret_access_key: Option<String>,
    #[arg(long, env = "FLUSH_INTERVAL_SECS", default_value_t = 60)]
    pub flush_interval_secs: u64,
    /// Comma-separated origins allowed to call the HTTP endpoints.
    #[arg(long, env = "CORS_ORIGINS", default_value = DEFAULT_CORS_ORIGINS, value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Where the canvas history is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Memory,
    File(PathBuf),
    S3(S3StorageConfig),
}

impl Args {
    /// S3 wins over a local directory when both are configured.
    pub fn backend(&self) -> Backend {
        if let Some(bucket) = self.s3_bucket.clone().filter(|bucket| !bucket.is_empty()) {
            return Backend::S3(S3StorageConfig {
                bucket,
                prefix: self.s3_prefix.clone(),
                region: self.s3_region.clone(),
                endpoint_url: self.s3_endpoint_url.clone(),
                force_path_style: self.s3_force_path_style,
                access_key_id: self.s3_access_key_id.clone(),
                secret_access_key: self.s3_secret_access_key.clone(),
            });
        }
        match &self.history_dir {
            Some(dir) => Backend::File(dir.clone()),
            None => Backend::Memory,
        }
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}
