//! File upload to S3-compatible object storage.
//!
//! Uploads never return an error: every failure is reported in the
//! `UploadOutcome` so callers check `error` instead of matching on a
//! `Result`.

use std::path::Path;
use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Uploads can be large, so allow more time than API calls.
const UPLOAD_TIMEOUT_SECS: u64 = 120;

pub const UPLOAD_SUCCESS: &str = "success";
pub const UPLOAD_INVALID_DESTINATION: &str = "invalid_destination";
pub const UPLOAD_READ_FAILED: &str = "read_failed";
pub const UPLOAD_NETWORK_ERROR: &str = "network_error";
pub const UPLOAD_NOT_CONFIGURED: &str = "not_configured";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub error: Option<String>,
    pub file_path: Option<String>,
    pub code: Option<String>,
}

impl UploadOutcome {
    fn success(file_path: String) -> Self {
        Self {
            error: None,
            file_path: Some(file_path),
            code: Some(UPLOAD_SUCCESS.to_string()),
        }
    }

    fn failure(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            file_path: None,
            code: Some(code.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Normalize an object key: no leading slash, no empty or `..` segments.
fn normalize_destination(destination: &str) -> Option<String> {
    let trimmed = destination.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let valid = trimmed
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    valid.then(|| trimmed.to_string())
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct Uploader {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl Uploader {
    pub fn new(endpoint: &str, bucket: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.trim_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    /// Put `file` at `destination` inside the bucket.
    pub async fn upload(&self, file: &Path, destination: &str) -> UploadOutcome {
        let Some(key) = normalize_destination(destination) else {
            return UploadOutcome::failure(
                UPLOAD_INVALID_DESTINATION,
                format!("Invalid destination path: {:?}", destination),
            );
        };

        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Failed to read upload source");
                return UploadOutcome::failure(
                    UPLOAD_READ_FAILED,
                    format!("Failed to read {}: {}", file.display(), e),
                );
            }
        };

        let size = bytes.len();
        let mut request = self
            .client
            .put(self.object_url(&key))
            .header(header::CONTENT_TYPE, content_type(file))
            .body(bytes);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(key = %key, size, "Uploaded file");
                UploadOutcome::success(key)
            }
            Ok(response) => {
                let status = response.status();
                warn!(key = %key, %status, "Upload rejected");
                UploadOutcome::failure(
                    &format!("http_{}", status.as_u16()),
                    format!("Upload rejected with status {}", status),
                )
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Upload failed");
                UploadOutcome::failure(UPLOAD_NETWORK_ERROR, e.to_string())
            }
        }
    }
}

/// Outcome used when no object storage endpoint is configured.
pub fn not_configured() -> UploadOutcome {
    UploadOutcome::failure(UPLOAD_NOT_CONFIGURED, "No upload endpoint configured")
}
