//! The protocol-version / headers / body triple shared by every message type.
//!
//! Messages are immutable snapshots. Each `with_*` method clones the
//! receiver, replaces one part of the clone and returns it; the receiver is
//! never touched. Headers are owned per snapshot. The body is a [`Body`]
//! handle, so every snapshot derived from a message reads and writes the
//! same underlying [`Stream`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::headers::{Headers, IntoHeaderValues};
use crate::stream::Stream;

/// Protocol version given to messages built without an explicit one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

/// Shared handle to a message body stream.
///
/// Cloning a `Body` clones the handle, not the stream.
#[derive(Debug, Clone)]
pub struct Body(Arc<Mutex<Stream>>);

impl Body {
    pub fn new(stream: Stream) -> Self {
        Self(Arc::new(Mutex::new(stream)))
    }

    /// A body over an empty read/write temporary buffer.
    pub fn empty() -> Self {
        Self::new(Stream::empty())
    }

    /// A body over a read/write temporary buffer holding `content`.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self::new(Stream::from_bytes(content))
    }

    /// Locks the stream for I/O.
    pub fn lock(&self) -> MutexGuard<'_, Stream> {
        // A panic while holding the lock leaves the stream in a state its own
        // flags already describe.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Stream> for Body {
    fn from(stream: Stream) -> Self {
        Self::new(stream)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

/// A bare HTTP message: protocol version, headers and body.
///
/// # Examples
///
/// ```
/// use snapshot_http::http::{Body, HttpMessage, Message};
///
/// let message = Message::new("1.1", [("Accept", "text/html")], Body::empty());
/// let updated = message.with_header("ACCEPT", "application/json");
///
/// assert_eq!(message.header_line("accept"), "text/html");
/// assert_eq!(updated.header_line("accept"), "application/json");
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    version: String,
    headers: Headers,
    body: Body,
}

impl Message {
    pub fn new<H, N, V>(version: impl Into<String>, headers: H, body: Body) -> Self
    where
        H: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: IntoHeaderValues,
    {
        Self {
            version: version.into(),
            headers: headers.into_iter().collect(),
            body,
        }
    }

    pub(crate) fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// A message with the default protocol version, no headers and an empty body.
    pub fn empty() -> Self {
        Self {
            version: DEFAULT_PROTOCOL_VERSION.to_owned(),
            headers: Headers::new(),
            body: Body::empty(),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::empty()
    }
}

/// Copy-on-write access to the message part of a value.
///
/// Implementors only provide access to their embedded [`Message`]; every
/// query and `with_*` method comes from the trait. The `with_*` methods
/// return a modified clone of `self`.
pub trait HttpMessage: Clone {
    fn message(&self) -> &Message;

    fn message_mut(&mut self) -> &mut Message;

    fn protocol_version(&self) -> &str {
        &self.message().version
    }

    #[must_use]
    fn with_protocol_version(&self, version: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.message_mut().version = version.into();
        new
    }

    fn headers(&self) -> &Headers {
        &self.message().headers
    }

    fn has_header(&self, name: &str) -> bool {
        self.message().headers.contains(name)
    }

    /// Values of the header (case-insensitive), empty if absent.
    fn header(&self, name: &str) -> &[String] {
        self.message().headers.get(name)
    }

    /// Values of the header joined with `", "`, empty if absent.
    fn header_line(&self, name: &str) -> String {
        self.message().headers.line(name)
    }

    /// Replaces every value of `name`; the stored casing becomes `name`'s.
    #[must_use]
    fn with_header(&self, name: impl Into<String>, values: impl IntoHeaderValues) -> Self {
        let mut new = self.clone();
        new.message_mut().headers.set(name, values);
        new
    }

    /// Appends values to `name`, creating the header if it is absent.
    #[must_use]
    fn with_added_header(&self, name: impl Into<String>, values: impl IntoHeaderValues) -> Self {
        let mut new = self.clone();
        new.message_mut().headers.append(name, values);
        new
    }

    #[must_use]
    fn without_header(&self, name: &str) -> Self {
        let mut new = self.clone();
        new.message_mut().headers.remove(name);
        new
    }

    fn body(&self) -> &Body {
        &self.message().body
    }

    #[must_use]
    fn with_body(&self, body: impl Into<Body>) -> Self {
        let mut new = self.clone();
        new.message_mut().body = body.into();
        new
    }
}

impl HttpMessage for Message {
    fn message(&self) -> &Message {
        self
    }

    fn message_mut(&mut self) -> &mut Message {
        self
    }
}
