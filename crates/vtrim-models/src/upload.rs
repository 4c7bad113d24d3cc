//! Selected-file identity and upload handles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity of a selected video file.
///
/// Name plus size is the identity key an upload handle is bound to; a handle
/// whose identity no longer matches the active file must not be reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FileIdentity {
    /// Original file name
    pub file_name: String,
    /// File size in bytes
    pub file_size: u64,
}

/// A video file the backend can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoFile {
    /// Path on storage reachable by the backend
    pub path: String,
    /// Original file name
    pub name: String,
    /// File size in bytes
    pub size: u64,
}

impl VideoFile {
    /// Create a new file reference.
    pub fn new(path: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
        }
    }

    /// Identity key for upload-handle binding.
    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            file_name: self.name.clone(),
            file_size: self.size,
        }
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }
}

/// Handle for a file already uploaded to the media service.
///
/// Established by the first upload-performing stage call for a file and
/// reused by every subsequent stage call for that same file, so the file is
/// never uploaded twice. Selecting a new file invalidates the handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadInfo {
    /// Path of the uploaded file on the media service
    pub file_path: String,
    /// Original file name
    pub file_name: String,
    /// File size in bytes
    pub file_size: u64,
    /// Media-service session the upload belongs to
    pub session_id: String,
}

impl UploadInfo {
    /// Identity of the file this handle was established for.
    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            file_name: self.file_name.clone(),
            file_size: self.file_size,
        }
    }

    /// Whether the handle may be reused for the given file.
    pub fn matches(&self, identity: &FileIdentity) -> bool {
        self.identity() == *identity
    }
}
