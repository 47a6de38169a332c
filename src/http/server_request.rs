//! Server-side view of an incoming request.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::message::{HttpMessage, Message};
use super::request::{HttpRequest, Request};
use super::Method;
use crate::bag::ParameterBag;
use crate::upload::UploadedFile;
use crate::uri::{Uri, UriError};

/// A deserialized request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// Form fields.
    Form(ParameterBag),
    /// A structured document.
    Json(Value),
}

impl ParsedBody {
    /// Parses a JSON document into [`ParsedBody::Json`].
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] if `bytes` is not valid JSON.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Self::Json)
    }
}

impl From<ParameterBag> for ParsedBody {
    fn from(form: ParameterBag) -> Self {
        Self::Form(form)
    }
}

impl From<Value> for ParsedBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// An incoming request together with the data the server derived from it.
///
/// Server parameters are fixed at construction. Everything else has a
/// copy-on-write `with_*` mutator like the rest of the message API.
///
/// # Examples
///
/// ```
/// use snapshot_http::bag::ParameterBag;
/// use snapshot_http::http::ServerRequest;
///
/// let request = ServerRequest::create("GET", "/users/7", ParameterBag::new())
///     .unwrap()
///     .with_attribute("user_id", 7);
///
/// assert_eq!(request.attribute("user_id"), Some(&serde_json::json!(7)));
/// assert!(request.without_attribute("user_id").attributes().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ServerRequest {
    request: Request,
    server_params: ParameterBag,
    cookie_params: ParameterBag,
    query_params: ParameterBag,
    uploaded_files: HashMap<String, Arc<dyn UploadedFile>>,
    parsed_body: Option<ParsedBody>,
    attributes: Map<String, Value>,
}

impl ServerRequest {
    pub fn new(request: Request, server_params: ParameterBag) -> Self {
        Self {
            request,
            server_params,
            cookie_params: ParameterBag::new(),
            query_params: ParameterBag::new(),
            uploaded_files: HashMap::new(),
            parsed_body: None,
            attributes: Map::new(),
        }
    }

    /// Parses `uri` and builds a request with the default protocol version,
    /// no headers, an empty body and no cookies, query, uploads or attributes.
    ///
    /// # Errors
    ///
    /// Returns [`UriError`] if `uri` cannot be parsed.
    pub fn create(
        method: impl Into<Method>,
        uri: &str,
        server_params: ParameterBag,
    ) -> Result<Self, UriError> {
        Ok(Self::new(
            Request::new(method, Uri::parse(uri)?, Message::empty()),
            server_params,
        ))
    }

    pub fn server_params(&self) -> &ParameterBag {
        &self.server_params
    }

    pub fn cookie_params(&self) -> &ParameterBag {
        &self.cookie_params
    }

    #[must_use]
    pub fn with_cookie_params(&self, cookies: ParameterBag) -> Self {
        Self {
            cookie_params: cookies,
            ..self.clone()
        }
    }

    pub fn query_params(&self) -> &ParameterBag {
        &self.query_params
    }

    #[must_use]
    pub fn with_query_params(&self, query: ParameterBag) -> Self {
        Self {
            query_params: query,
            ..self.clone()
        }
    }

    pub fn uploaded_files(&self) -> &HashMap<String, Arc<dyn UploadedFile>> {
        &self.uploaded_files
    }

    #[must_use]
    pub fn with_uploaded_files(&self, files: HashMap<String, Arc<dyn UploadedFile>>) -> Self {
        Self {
            uploaded_files: files,
            ..self.clone()
        }
    }

    pub fn parsed_body(&self) -> Option<&ParsedBody> {
        self.parsed_body.as_ref()
    }

    #[must_use]
    pub fn with_parsed_body(&self, body: Option<ParsedBody>) -> Self {
        Self {
            parsed_body: body,
            ..self.clone()
        }
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The attribute, or `default` when it is not set.
    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.attribute(name).unwrap_or(default)
    }

    #[must_use]
    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut new = self.clone();
        new.attributes.insert(name.into(), value.into());
        new
    }

    /// Removes an attribute. A missing attribute yields an unchanged copy.
    #[must_use]
    pub fn without_attribute(&self, name: &str) -> Self {
        let mut new = self.clone();
        new.attributes.remove(name);
        new
    }
}

impl HttpMessage for ServerRequest {
    fn message(&self) -> &Message {
        self.request.message()
    }

    fn message_mut(&mut self) -> &mut Message {
        self.request.message_mut()
    }
}

impl HttpRequest for ServerRequest {
    fn request(&self) -> &Request {
        &self.request
    }

    fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }
}
