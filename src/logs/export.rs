use crate::error::{DblogError, Result};
use crate::logs::file::{read_shared, LOG_FILE_NAME};
use std::io::ErrorKind;
use std::path::Path;

/// Content type of the downloaded log
pub const CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Full contents of the log file, ready to be handed out as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDownload {
    body: Vec<u8>,
}

impl LogDownload {
    /// Read the whole log file
    ///
    /// # Returns
    /// * `Ok(LogDownload)` - The file's exact bytes
    /// * `Err(DblogError::FileNotFound)` - No log file has been written yet
    /// * `Err(DblogError::FileUnreadable)` - The file exists but cannot be read
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DblogError::FileNotFound(path.to_path_buf()));
        }

        let owned = path.to_path_buf();
        let read = tokio::task::spawn_blocking(move || read_shared(&owned))
            .await
            .map_err(|e| DblogError::FileUnreadable(format!("{}: {}", path.display(), e)))?;

        match read {
            Ok(body) => Ok(Self { body }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DblogError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => Err(DblogError::FileUnreadable(format!("{}: {}", path.display(), e))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", LOG_FILE_NAME)
    }

    /// Exact byte length of the body
    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
