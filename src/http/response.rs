//! HTTP response: a [`Message`] plus a status line.

use super::message::{HttpMessage, Message};
use super::StatusCode;

/// An immutable HTTP response.
///
/// An empty reason phrase is replaced by the canonical phrase of the status
/// code when one is known.
///
/// # Examples
///
/// ```
/// use snapshot_http::http::{HttpMessage, Response, StatusCode};
///
/// let response = Response::create(StatusCode::NotFound, "");
/// assert_eq!(response.status_code(), 404);
/// assert_eq!(response.reason_phrase(), "Not Found");
///
/// let redirect = Response::moved_permanently("/new/home");
/// assert_eq!(redirect.header_line("location"), "/new/home");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    message: Message,
    status: u16,
    reason: String,
}

impl Response {
    pub fn new(status: impl Into<u16>, reason: impl Into<String>, message: Message) -> Self {
        let status = status.into();
        Self {
            message,
            status,
            reason: reason_or_default(status, reason.into()),
        }
    }

    /// A response with the default protocol version, no headers and an empty body.
    pub fn create(status: impl Into<u16>, reason: impl Into<String>) -> Self {
        Self::new(status, reason, Message::empty())
    }

    /// `404 Not Found`
    pub fn not_found() -> Self {
        Self::create(StatusCode::NotFound, "")
    }

    /// `500 Internal Server Error`
    pub fn server_error() -> Self {
        Self::create(StatusCode::InternalServerError, "")
    }

    /// `401 Unauthorized`
    pub fn unauthorized() -> Self {
        Self::create(StatusCode::Unauthorized, "")
    }

    /// `403 Forbidden`
    pub fn forbidden() -> Self {
        Self::create(StatusCode::Forbidden, "")
    }

    /// `301 Moved Permanently` pointing `Location` at `location`.
    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self::create(StatusCode::MovedPermanently, "").with_header("Location", location.into())
    }

    /// The numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// The status code as a [`StatusCode`], if it is one this crate names.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status)
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    /// Replaces both the status code and the reason phrase.
    #[must_use]
    pub fn with_status(&self, status: impl Into<u16>, reason: impl Into<String>) -> Self {
        let status = status.into();
        Self {
            status,
            reason: reason_or_default(status, reason.into()),
            ..self.clone()
        }
    }
}

fn reason_or_default(status: u16, reason: String) -> String {
    if !reason.is_empty() {
        return reason;
    }
    StatusCode::from_u16(status)
        .map(|code| code.canonical_reason().to_owned())
        .unwrap_or_default()
}

impl Default for Response {
    fn default() -> Self {
        Self::create(StatusCode::Ok, "")
    }
}

impl HttpMessage for Response {
    fn message(&self) -> &Message {
        &self.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}
