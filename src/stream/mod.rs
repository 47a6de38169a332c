//! Byte streams over files, memory buffers and pipes.
//!
//! A [`Stream`] owns exactly one [`Resource`]. Its capabilities
//! (readable / writable / seekable) are fixed when it is constructed: the
//! first two come from the access-mode string, the last from the resource.
//! [`Stream::close`] and [`Stream::detach`] clear all three and leave the
//! stream unusable for I/O.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

pub mod mode;
pub mod resource;

pub use mode::{AccessMode, OpenKind};
pub use resource::Resource;

/// Uri reported by in-memory temporary buffers. Streams over it have no known size.
pub const TEMP_URI: &str = "memory://temp";

/// Chunk size used by [`Stream::contents`].
const READ_CHUNK_SIZE: usize = 1024;

/// Errors produced by [`Stream`] operations.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("unknown stream mode: {0:?}")]
    InvalidMode(String),

    #[error("stream is closed")]
    Closed,

    #[error("stream already closed")]
    AlreadyClosed,

    #[error("stream cannot be detached")]
    CannotDetach,

    #[error("stream cannot be read")]
    NotReadable,

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("stream is not readable nor seekable")]
    NotReadableOrSeekable,

    #[error("stream I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode stream metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl StreamError {
    /// Returns `true` for errors caused by the stream's lifecycle or
    /// capabilities rather than by the underlying resource.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::Closed
                | Self::AlreadyClosed
                | Self::CannotDetach
                | Self::NotReadable
                | Self::NotSeekable
                | Self::NotReadableOrSeekable
        )
    }
}

/// Reference point for [`Stream::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Whence {
    #[default]
    Start,
    Current,
    End,
}

impl Whence {
    fn seek_from(self, offset: i64) -> io::Result<SeekFrom> {
        Ok(match self {
            Self::Start => SeekFrom::Start(u64::try_from(offset).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "negative absolute seek offset")
            })?),
            Self::Current => SeekFrom::Current(offset),
            Self::End => SeekFrom::End(offset),
        })
    }
}

/// Snapshot of a stream's metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub stream_type: String,
    pub mode: String,
    pub seekable: bool,
    pub uri: String,
    pub eof: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
    Detached,
}

/// A byte stream with a fixed capability set and an explicit lifecycle.
///
/// # Examples
///
/// ```
/// use snapshot_http::stream::{Stream, Whence};
///
/// let mut stream = Stream::from_bytes("");
/// stream.write(b"abcdef").unwrap();
/// stream.seek(2, Whence::Start).unwrap();
/// assert_eq!(&stream.read(1).unwrap()[..], b"c");
/// ```
#[derive(Debug)]
pub struct Stream {
    resource: Option<Resource>,
    state: State,
    access: AccessMode,
    mode: String,
    uri: String,
    readable: bool,
    writable: bool,
    seekable: bool,
    size: Option<u64>,
    eof: bool,
}

impl Stream {
    /// Wraps an open resource.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidMode`] if `mode` is not a recognised access mode.
    pub fn new(resource: Resource, mode: &str) -> Result<Self, StreamError> {
        let access = AccessMode::parse(mode)?;
        let uri = resource.uri().to_owned();
        let size = if uri == TEMP_URI {
            None
        } else {
            resource.size()
        };

        Ok(Self {
            readable: access.is_readable(),
            writable: access.is_writable(),
            seekable: resource.is_seekable(),
            resource: Some(resource),
            state: State::Open,
            access,
            mode: mode.to_owned(),
            uri,
            size,
            eof: false,
        })
    }

    /// Opens the file at `path` with `mode` and wraps it.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidMode`] for an unknown mode, [`StreamError::Io`]
    /// if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self, StreamError> {
        let access = AccessMode::parse(mode)?;
        let resource = Resource::open(path, access)?;
        Self::new(resource, mode)
    }

    /// A read/write temporary buffer holding `content`, positioned at its start.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self {
            resource: Some(Resource::memory(content)),
            state: State::Open,
            access: AccessMode::READ_WRITE,
            mode: "r+".to_owned(),
            uri: TEMP_URI.to_owned(),
            readable: true,
            writable: true,
            seekable: true,
            size: None,
            eof: false,
        }
    }

    /// An empty read/write temporary buffer.
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Size captured at construction, `None` when unknown.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// The mode string the stream was created with.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Name of the backing resource.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_closed(&self) -> bool {
        self.state != State::Open
    }

    fn resource_mut(&mut self) -> Result<&mut Resource, StreamError> {
        self.resource.as_mut().ok_or(StreamError::Closed)
    }

    /// Reads up to `length` bytes.
    ///
    /// Seekable streams fill the buffer unless they reach end-of-stream.
    /// Non-seekable streams return whatever the first non-empty read yields,
    /// so a pipe never blocks waiting for more than is available.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close/detach, [`StreamError::NotReadable`]
    /// for write-only streams, [`StreamError::Io`] if the resource fails.
    pub fn read(&mut self, length: usize) -> Result<Bytes, StreamError> {
        let readable = self.readable;
        let seekable = self.seekable;
        let resource = self.resource_mut()?;
        if !readable {
            return Err(StreamError::NotReadable);
        }

        let mut buf = BytesMut::zeroed(length);
        let mut filled = 0;
        let mut hit_eof = false;
        while filled < length {
            match resource.read(&mut buf[filled..]) {
                Ok(0) => {
                    hit_eof = true;
                    break;
                }
                Ok(n) => {
                    filled += n;
                    if !seekable {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf.truncate(filled);

        if hit_eof {
            self.eof = true;
        }
        Ok(buf.freeze())
    }

    /// Writes `data`, returning the number of bytes written.
    ///
    /// A stream that is not writable reports `0` instead of failing.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close/detach, [`StreamError::Io`] if the
    /// resource fails.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        let writable = self.writable;
        let resource = self.resource_mut()?;
        if !writable {
            return Ok(0);
        }

        let mut written = 0;
        while written < data.len() {
            match resource.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(written)
    }

    /// Moves the stream position.
    ///
    /// # Errors
    ///
    /// [`StreamError::NotSeekable`] if the stream is not seekable or no longer
    /// open, [`StreamError::Io`] if the resource rejects the position.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<(), StreamError> {
        if !self.seekable {
            return Err(StreamError::NotSeekable);
        }
        let resource = self.resource.as_mut().ok_or(StreamError::NotSeekable)?;
        resource.seek(whence.seek_from(offset)?)?;
        self.eof = false;
        Ok(())
    }

    /// Same as `seek(0, Whence::Start)`.
    pub fn rewind(&mut self) -> Result<(), StreamError> {
        self.seek(0, Whence::Start)
    }

    /// Current position.
    pub fn tell(&mut self) -> Result<u64, StreamError> {
        Ok(self.resource_mut()?.position()?)
    }

    /// Returns `true` once a read has hit the end of the stream.
    pub fn eof(&self) -> Result<bool, StreamError> {
        match self.resource {
            Some(_) => Ok(self.eof),
            None => Err(StreamError::Closed),
        }
    }

    /// Reads from the current position to the end of the stream.
    pub fn contents(&mut self) -> Result<Bytes, StreamError> {
        let mut out = BytesMut::new();
        while !self.eof()? {
            out.extend_from_slice(&self.read(READ_CHUNK_SIZE)?);
        }
        Ok(out.freeze())
    }

    /// Rewinds and returns the whole stream.
    ///
    /// # Errors
    ///
    /// [`StreamError::NotReadableOrSeekable`] unless the stream is both
    /// readable and seekable.
    pub fn to_bytes(&mut self) -> Result<Bytes, StreamError> {
        if !(self.seekable && self.readable) {
            return Err(StreamError::NotReadableOrSeekable);
        }
        self.rewind()?;
        self.contents()
    }

    fn clear_capabilities(&mut self) {
        self.readable = false;
        self.writable = false;
        self.seekable = false;
    }

    /// Releases the resource.
    ///
    /// # Errors
    ///
    /// [`StreamError::AlreadyClosed`] if the stream was closed or detached,
    /// [`StreamError::Io`] if flushing the resource fails.
    pub fn close(&mut self) -> Result<(), StreamError> {
        let mut resource = self.resource.take().ok_or(StreamError::AlreadyClosed)?;
        self.clear_capabilities();
        self.state = State::Closed;
        debug!(uri = %self.uri, "stream closed");

        resource.flush()?;
        Ok(())
    }

    /// Closes the stream and hands the backing data to the caller as a new,
    /// independent [`Resource`].
    ///
    /// # Errors
    ///
    /// [`StreamError::CannotDetach`] if the stream was closed or detached,
    /// [`StreamError::Io`] if the backing file cannot be reopened.
    pub fn detach(&mut self) -> Result<Resource, StreamError> {
        let mut resource = self.resource.take().ok_or(StreamError::CannotDetach)?;
        self.clear_capabilities();
        self.state = State::Detached;
        debug!(uri = %self.uri, mode = %self.mode, "stream detached");

        resource.flush()?;
        Ok(resource.reopen(self.access)?)
    }

    /// The full metadata record.
    pub fn metadata(&self) -> Result<Metadata, StreamError> {
        let resource = self.resource.as_ref().ok_or(StreamError::Closed)?;
        Ok(Metadata {
            stream_type: resource.stream_type().to_owned(),
            mode: self.mode.clone(),
            seekable: resource.is_seekable(),
            uri: resource.uri().to_owned(),
            eof: self.eof,
        })
    }

    /// One field of the metadata record, `None` for unknown keys.
    pub fn metadata_value(&self, key: &str) -> Result<Option<Value>, StreamError> {
        let metadata = self.metadata()?;
        trace!(key, "stream metadata lookup");
        match serde_json::to_value(metadata)? {
            Value::Object(mut fields) => Ok(fields.remove(key)),
            _ => Ok(None),
        }
    }
}
