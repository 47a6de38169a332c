//! Uploaded files.
//!
//! [`UploadedFile`] is the capability every upload exposes. Two variants
//! implement it: [`StreamUpload`], which reads through a message [`Body`],
//! and [`TempFileUpload`], which describes a file the server already wrote
//! to a temporary location.
//!
//! [`Body`]: crate::http::Body

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::stream::StreamError;

pub mod stream_upload;
pub mod temp_file;

pub use stream_upload::StreamUpload;
pub use temp_file::{TempFileUpload, UploadDescriptor};

/// Errors produced while reading or moving an uploaded file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploaded file not found: {0}")]
    NotFound(String),

    #[error("failed to move uploaded file from {from} to {to}: {source}")]
    Move {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },

    #[error("upload stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("upload I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Returned when a numeric upload status is not one of the known codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown upload error code {0}")]
pub struct UnknownUploadErrorCode(pub u8);

/// Status of an upload as reported by the server that received it.
///
/// The numbering follows the conventional CGI upload codes; `5` is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "u8")]
#[repr(u8)]
pub enum UploadErrorCode {
    #[default]
    Ok = 0,
    /// Exceeds the server-wide size limit.
    IniSize = 1,
    /// Exceeds the size limit declared by the form.
    FormSize = 2,
    Partial = 3,
    NoFile = 4,
    NoTmpDir = 6,
    CantWrite = 7,
    /// Stopped by a server extension.
    Extension = 8,
}

impl UploadErrorCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl TryFrom<u8> for UploadErrorCode {
    type Error = UnknownUploadErrorCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Ok,
            1 => Self::IniSize,
            2 => Self::FormSize,
            3 => Self::Partial,
            4 => Self::NoFile,
            6 => Self::NoTmpDir,
            7 => Self::CantWrite,
            8 => Self::Extension,
            other => return Err(UnknownUploadErrorCode(other)),
        })
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A file received as part of a request.
pub trait UploadedFile: fmt::Debug + Send + Sync {
    /// Size in bytes, if known.
    fn size(&self) -> Option<u64>;

    fn error(&self) -> UploadErrorCode;

    /// File name sent by the client. Not to be trusted.
    fn client_filename(&self) -> Option<&str>;

    /// Media type sent by the client. Not to be trusted.
    fn client_media_type(&self) -> Option<&str>;

    /// Reads the whole file.
    ///
    /// # Errors
    ///
    /// Fails if the underlying stream or file cannot be read.
    fn content(&self) -> Result<Bytes, UploadError>;

    /// Moves the file to `dir/name` and returns a handle describing it there.
    ///
    /// # Errors
    ///
    /// [`UploadError::NotFound`] if the source no longer exists,
    /// [`UploadError::Move`] if the file could not be moved.
    fn move_to(&self, dir: &Path, name: &str) -> Result<Arc<dyn UploadedFile>, UploadError>;
}

/// Renames `from` to `to`, falling back to copy and remove across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<(), UploadError> {
    if !from.exists() {
        warn!(from = %from.display(), "uploaded file vanished before move");
        return Err(UploadError::NotFound(from.display().to_string()));
    }

    let moved = fs::rename(from, to).or_else(|_| {
        fs::copy(from, to)?;
        fs::remove_file(from)
    });

    match moved {
        Ok(()) => {
            debug!(from = %from.display(), to = %to.display(), "moved uploaded file");
            Ok(())
        }
        Err(source) => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %source,
                "failed to move uploaded file"
            );
            Err(UploadError::Move {
                from: from.display().to_string(),
                to: to.display().to_string(),
                source,
            })
        }
    }
}
