//! Client-side view of an HTTP request: a [`Message`] plus method, request
//! target and [`Uri`].

use super::message::{HttpMessage, Message};
use super::Method;
use crate::uri::{Uri, UriError};

/// An immutable HTTP request.
///
/// # Examples
///
/// ```
/// use snapshot_http::http::{HttpMessage, HttpRequest, Method, Request};
/// use snapshot_http::uri::Uri;
///
/// let request = Request::create("GET", "https://example.com").unwrap();
/// let moved = request.with_uri(Uri::parse("https://my.example.com").unwrap(), false);
///
/// assert_eq!(request.uri().to_string(), "https://example.com");
/// assert_eq!(moved.uri().to_string(), "https://my.example.com");
/// assert_eq!(moved.header_line("host"), "my.example.com");
/// assert_eq!(moved.method(), &Method::Get);
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    message: Message,
    method: Method,
    request_target: String,
    uri: Uri,
}

impl Request {
    /// Builds a request around `message`. The request target starts empty.
    pub fn new(method: impl Into<Method>, uri: Uri, message: Message) -> Self {
        Self {
            message,
            method: method.into(),
            request_target: String::new(),
            uri,
        }
    }

    /// Parses `uri` and builds a request with the default protocol version,
    /// no headers and an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`UriError`] if `uri` cannot be parsed.
    pub fn create(method: impl Into<Method>, uri: &str) -> Result<Self, UriError> {
        Ok(Self::new(method, Uri::parse(uri)?, Message::empty()))
    }
}

impl HttpMessage for Request {
    fn message(&self) -> &Message {
        &self.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

/// Copy-on-write access to the request part of a value.
pub trait HttpRequest: HttpMessage {
    fn request(&self) -> &Request;

    fn request_mut(&mut self) -> &mut Request;

    /// The stored request target. Empty unless set explicitly.
    fn request_target(&self) -> &str {
        &self.request().request_target
    }

    #[must_use]
    fn with_request_target(&self, target: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.request_mut().request_target = target.into();
        new
    }

    fn method(&self) -> &Method {
        &self.request().method
    }

    #[must_use]
    fn with_method(&self, method: impl Into<Method>) -> Self {
        let mut new = self.clone();
        new.request_mut().method = method.into();
        new
    }

    fn uri(&self) -> &Uri {
        &self.request().uri
    }

    /// Replaces the uri and, depending on `preserve_host`, the `Host` header.
    ///
    /// A non-empty host of the new uri is written to `Host` unless
    /// `preserve_host` is set and the request already carries a `Host`
    /// value. An empty host never touches the header.
    #[must_use]
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut new = self.clone();
        let host = uri.host().to_owned();
        new.request_mut().uri = uri;

        if host.is_empty() || (preserve_host && !new.header("Host").is_empty()) {
            return new;
        }
        new.message_mut().headers_mut().set("Host", host);
        new
    }
}

impl HttpRequest for Request {
    fn request(&self) -> &Request {
        self
    }

    fn request_mut(&mut self) -> &mut Request {
        self
    }
}
