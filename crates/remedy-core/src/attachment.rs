use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RemedyError;
use crate::form::Visibility;

/// Work info attachment slot used for evidence files.
pub const ATTACHMENT_FIELD: &str = "z2AF_Act_Attachment_1";

/// A request to attach a local file to an existing work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRequest {
    pub work_order_id: String,
    pub path: PathBuf,
    /// Name the file is stored under in Remedy.
    pub file_name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl AttachmentRequest {
    pub fn new(work_order_id: &str, path: impl Into<PathBuf>, file_name: &str) -> Self {
        Self {
            work_order_id: work_order_id.to_string(),
            path: path.into(),
            file_name: file_name.to_string(),
            details: String::new(),
            visibility: Visibility::default(),
            content_type: default_content_type(),
        }
    }
}

/// Read the bytes to upload for `path`, keeping at most `cap` bytes.
///
/// Files of `cap` bytes or more are cut to their trailing `cap` bytes; the
/// end of a log is where the useful diagnostics are.
pub fn read_payload(path: &Path, cap: u64) -> Result<Bytes, RemedyError> {
    let unreadable = |source: std::io::Error| RemedyError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(unreadable)?;
    let size = file.metadata().map_err(unreadable)?.len();

    let mut buf = Vec::new();
    if size >= cap {
        file.seek(SeekFrom::Start(size - cap)).map_err(unreadable)?;
        file.take(cap).read_to_end(&mut buf).map_err(unreadable)?;
        info!(
            "truncated {} from {size} to trailing {cap} bytes",
            path.display()
        );
    } else {
        file.read_to_end(&mut buf).map_err(unreadable)?;
    }
    Ok(Bytes::from(buf))
}
