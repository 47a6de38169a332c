use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use super::{move_file, UploadError, UploadErrorCode, UploadedFile};
use crate::http::Body;
use crate::stream::{Stream, TEMP_URI};

/// An upload read through a [`Body`] stream.
///
/// # Examples
///
/// ```
/// use snapshot_http::upload::{StreamUpload, UploadErrorCode, UploadedFile};
/// use snapshot_http::stream::Stream;
///
/// let upload = StreamUpload::new(Stream::from_bytes("hello"), Some(5), UploadErrorCode::Ok)
///     .with_client_filename("hello.txt");
///
/// assert_eq!(upload.size(), Some(5));
/// assert_eq!(upload.client_filename(), Some("hello.txt"));
/// assert_eq!(&upload.content().unwrap()[..], b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct StreamUpload {
    stream: Body,
    size: Option<u64>,
    error: UploadErrorCode,
    client_filename: Option<String>,
    client_media_type: Option<String>,
}

impl StreamUpload {
    /// A `size` of `None` falls back to the stream's own size.
    pub fn new(stream: impl Into<Body>, size: Option<u64>, error: UploadErrorCode) -> Self {
        let stream = stream.into();
        let size = size.or_else(|| stream.lock().size());
        Self {
            stream,
            size,
            error,
            client_filename: None,
            client_media_type: None,
        }
    }

    #[must_use]
    pub fn with_client_filename(mut self, name: impl Into<String>) -> Self {
        self.client_filename = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_client_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.client_media_type = Some(media_type.into());
        self
    }

    pub fn stream(&self) -> &Body {
        &self.stream
    }

    /// Path of the file behind the stream, if there is one.
    fn source_path(&self) -> Option<PathBuf> {
        let stream = self.stream.lock();
        let uri = stream.uri();
        (uri != TEMP_URI && Path::new(uri).is_file()).then(|| PathBuf::from(uri))
    }
}

impl UploadedFile for StreamUpload {
    fn size(&self) -> Option<u64> {
        self.size
    }

    fn error(&self) -> UploadErrorCode {
        self.error
    }

    fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    fn content(&self) -> Result<Bytes, UploadError> {
        let mut stream = self.stream.lock();
        let bytes = if stream.is_seekable() {
            stream.to_bytes()?
        } else {
            stream.contents()?
        };
        Ok(bytes)
    }

    /// File-backed streams are moved on disk; any other stream is written
    /// out to the destination.
    fn move_to(&self, dir: &Path, name: &str) -> Result<Arc<dyn UploadedFile>, UploadError> {
        let target = dir.join(name);
        match self.source_path() {
            Some(source) => move_file(&source, &target)?,
            None => {
                let content = self.content()?;
                fs::write(&target, &content).map_err(|source| UploadError::Move {
                    from: self.stream.lock().uri().to_owned(),
                    to: target.display().to_string(),
                    source,
                })?;
            }
        }

        let mut moved = StreamUpload::new(Stream::open(&target, "r")?, self.size, self.error)
            .with_client_filename(name);
        moved.client_media_type = self.client_media_type.clone();
        Ok(Arc::new(moved))
    }
}
