//! # snapshot-http
//!
//! Immutable HTTP message values: every mutator returns a new snapshot and
//! leaves the receiver untouched.
//!
//! ## Quick Start
//!
//! ```rust
//! use snapshot_http::http::{HttpMessage, HttpRequest, Request, Response};
//! use snapshot_http::stream::Stream;
//! use snapshot_http::uri::Uri;
//!
//! let request = Request::create("GET", "https://example.com/items?page=2")?
//!     .with_header("Accept", "application/json");
//! let mirrored = request.with_uri(Uri::parse("https://mirror.example.com/items")?, false);
//!
//! assert_eq!(request.header_line("accept"), "application/json");
//! assert_eq!(mirrored.header_line("host"), "mirror.example.com");
//!
//! let response = Response::not_found().with_body(Stream::from_bytes("gone"));
//! assert_eq!(response.reason_phrase(), "Not Found");
//! # Ok::<(), snapshot_http::Error>(())
//! ```

pub mod bag;
pub mod http;
pub mod server;
pub mod stream;
pub mod upload;
pub mod uri;

use thiserror::Error;

pub use bag::ParameterBag;
pub use http::{
    Body, Headers, HttpMessage, HttpRequest, Message, Method, Request, Response, ServerRequest,
    StatusCode,
};
pub use server::{ServerEnvironment, ServerError};
pub use stream::{Stream, StreamError};
pub use upload::{UploadError, UploadedFile};
pub use uri::{Uri, UriError};

/// Any error this crate produces.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_missing() -> Result<Stream, Error> {
        Ok(Stream::open("/nonexistent/snapshot-http/file", "r")?)
    }

    #[test]
    fn module_errors_convert() {
        let err: Error = Uri::parse("http://host:port").unwrap_err().into();
        assert!(matches!(err, Error::Uri(UriError::InvalidPort(_))));

        assert!(matches!(open_missing(), Err(Error::Stream(StreamError::Io(_)))));

        let err: Error = UploadError::NotFound("a.txt".into()).into();
        assert_eq!(err.to_string(), "uploaded file not found: a.txt");
    }
}
