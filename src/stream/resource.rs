//! The byte-oriented resources a [`Stream`](super::Stream) can wrap.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{AccessMode, TEMP_URI};

enum Backing {
    File { file: File, path: PathBuf },
    Memory(Cursor<Vec<u8>>),
    Reader { inner: Box<dyn Read + Send>, consumed: u64 },
    Writer { inner: Box<dyn Write + Send>, produced: u64 },
}

/// An open byte resource: a file, an in-memory buffer or one end of a pipe.
///
/// `Resource` implements [`Read`], [`Write`] and [`Seek`] directly, which is
/// how callers use the handle returned by [`Stream::detach`](super::Stream::detach).
/// Operations the backing does not support fail with
/// [`io::ErrorKind::Unsupported`].
pub struct Resource {
    backing: Backing,
    uri: String,
}

impl Resource {
    /// Wraps an already-open file. `path` is kept so the file can be
    /// reopened after a detach.
    pub fn file(file: File, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            uri: path.to_string_lossy().into_owned(),
            backing: Backing::File { file, path },
        }
    }

    /// Opens `path` with the options `mode` describes.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> io::Result<Self> {
        let path = path.as_ref();
        let file = mode.open_options().open(path)?;
        Ok(Self::file(file, path))
    }

    /// An in-memory temporary buffer positioned at its start.
    pub fn memory(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            backing: Backing::Memory(Cursor::new(bytes.into())),
            uri: TEMP_URI.to_owned(),
        }
    }

    /// The read end of a pipe. `name` is reported as the resource uri.
    pub fn reader(inner: impl Read + Send + 'static, name: impl Into<String>) -> Self {
        Self {
            backing: Backing::Reader {
                inner: Box::new(inner),
                consumed: 0,
            },
            uri: name.into(),
        }
    }

    /// The write end of a pipe. `name` is reported as the resource uri.
    pub fn writer(inner: impl Write + Send + 'static, name: impl Into<String>) -> Self {
        Self {
            backing: Backing::Writer {
                inner: Box::new(inner),
                produced: 0,
            },
            uri: name.into(),
        }
    }

    /// Name of the backing resource: a file path, [`TEMP_URI`], or a pipe name.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self.backing, Backing::File { .. } | Backing::Memory(_))
    }

    /// Short label of the backing kind, reported in stream metadata.
    pub fn stream_type(&self) -> &'static str {
        match self.backing {
            Backing::File { .. } => "STDIO",
            Backing::Memory(_) => "MEMORY",
            Backing::Reader { .. } | Backing::Writer { .. } => "PIPE",
        }
    }

    /// Byte length of the backing store, when it has one.
    pub fn size(&self) -> Option<u64> {
        match &self.backing {
            Backing::File { file, .. } => file.metadata().ok().map(|meta| meta.len()),
            Backing::Memory(cursor) => Some(cursor.get_ref().len() as u64),
            Backing::Reader { .. } | Backing::Writer { .. } => None,
        }
    }

    /// Current offset. Pipes report the number of bytes moved through them.
    pub fn position(&mut self) -> io::Result<u64> {
        match &mut self.backing {
            Backing::File { file, .. } => file.stream_position(),
            Backing::Memory(cursor) => Ok(cursor.position()),
            Backing::Reader { consumed, .. } => Ok(*consumed),
            Backing::Writer { produced, .. } => Ok(*produced),
        }
    }

    /// Releases this handle and returns an independent one over the same data.
    ///
    /// Files are reopened by path, memory buffers are handed over with their
    /// position reset, pipes are handed over unchanged.
    pub(crate) fn reopen(self, mode: AccessMode) -> io::Result<Self> {
        let Self { backing, uri } = self;
        let backing = match backing {
            Backing::File { file, path } => {
                drop(file);
                let file = mode.reopen_options().open(&path)?;
                Backing::File { file, path }
            }
            Backing::Memory(cursor) => Backing::Memory(Cursor::new(cursor.into_inner())),
            pipe => pipe,
        };
        Ok(Self { backing, uri })
    }
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("resource does not support {what}"))
}

impl Read for Resource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.backing {
            Backing::File { file, .. } => file.read(buf),
            Backing::Memory(cursor) => cursor.read(buf),
            Backing::Reader { inner, consumed } => {
                let n = inner.read(buf)?;
                *consumed += n as u64;
                Ok(n)
            }
            Backing::Writer { .. } => Err(unsupported("reading")),
        }
    }
}

impl Write for Resource {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.backing {
            Backing::File { file, .. } => file.write(buf),
            Backing::Memory(cursor) => cursor.write(buf),
            Backing::Writer { inner, produced } => {
                let n = inner.write(buf)?;
                *produced += n as u64;
                Ok(n)
            }
            Backing::Reader { .. } => Err(unsupported("writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.backing {
            Backing::File { file, .. } => file.flush(),
            Backing::Writer { inner, .. } => inner.flush(),
            Backing::Memory(_) | Backing::Reader { .. } => Ok(()),
        }
    }
}

impl Seek for Resource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.backing {
            Backing::File { file, .. } => file.seek(pos),
            Backing::Memory(cursor) => cursor.seek(pos),
            Backing::Reader { .. } | Backing::Writer { .. } => Err(unsupported("seeking")),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type", &self.stream_type())
            .field("uri", &self.uri)
            .finish()
    }
}
