//! Google Drive folder listing.
//!
//! Calls the Drive v3 `files.list` endpoint directly. Returns a full current
//! snapshot of a folder's children; the caller diffs against its own record.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use vigia_core::{
    config::StorageConfig,
    error::VigiaError,
    traits::FolderBrowser,
    types::FileRef,
};

/// Drive API listing backend.
pub struct DriveBrowser {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    timeout: std::time::Duration,
}

impl DriveBrowser {
    /// Create from config values.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// Build the `files.list` query for the children of a folder.
fn children_query(folder_id: &str) -> String {
    format!("'{folder_id}' in parents and trashed = false")
}

#[async_trait]
impl FolderBrowser for DriveBrowser {
    fn name(&self) -> &str {
        "drive"
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<FileRef>, VigiaError> {
        let url = format!("{}/files", self.base_url);

        debug!("drive: GET {url} folder={folder_id}");

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", children_query(folder_id).as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1000"),
            ])
            .send()
            .await
            .map_err(|e| VigiaError::Storage(format!("drive list failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(VigiaError::Storage(format!(
                "drive returned {status}: {text}"
            )));
        }

        let parsed: DriveFileList = resp
            .json()
            .await
            .map_err(|e| VigiaError::Storage(format!("drive: failed to parse listing: {e}")))?;

        Ok(parsed
            .files
            .into_iter()
            .map(|f| FileRef::new(f.id, f.name))
            .collect())
    }

    async fn is_available(&self) -> bool {
        if self.access_token.is_empty() {
            warn!("drive: no access token configured");
            return false;
        }
        true
    }
}
