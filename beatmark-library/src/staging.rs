//! Temporary on-disk copies of uploaded audio
//!
//! The decoder reads from a path and picks its demuxer from the file
//! extension, so uploads are written to a uniquely named temp file that keeps
//! the original extension. The file is removed when the upload is finished
//! or dropped, whichever comes first.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while staging an upload
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file written to temporary storage
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `bytes` to a new temp file in `dir` (or the system temp dir)
    pub fn write(
        dir: Option<&Path>,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Self, StagingError> {
        let suffix = extension_suffix(original_name);
        let mut builder = tempfile::Builder::new();
        builder.prefix("beatmark-").suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(path = %file.path().display(), bytes = bytes.len(), "Staged upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the temp file.
    ///
    /// A failed removal is logged and otherwise ignored.
    pub fn finish(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }
}

/// `.ext` of the uploaded file name, or empty when it has none
fn extension_suffix(original_name: Option<&str>) -> String {
    original_name
        .map(Path::new)
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
