//! Building a [`ServerRequest`] from what a server hands to its application.
//!
//! The crate never reads process state. Callers collect server variables,
//! cookies, query and form fields, upload descriptors and the raw body into a
//! [`ServerEnvironment`] (directly, or by deserializing one from JSON) and
//! pass it to [`ServerRequest::from_environment`].
//!
//! Server variables follow CGI naming: `REQUEST_METHOD`, `SERVER_PROTOCOL`,
//! `HTTP_*` for request headers, `CONTENT_TYPE`, `CONTENT_LENGTH`, `HTTPS`,
//! `HTTP_HOST`, `SERVER_NAME`, `SERVER_ADDR`, `SERVER_PORT`, `REQUEST_URI`,
//! `QUERY_STRING`, `AUTH_USER` and `AUTH_PW`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::bag::ParameterBag;
use crate::http::{Body, DEFAULT_PROTOCOL_VERSION, Message, ParsedBody, Request, ServerRequest};
use crate::stream::{Resource, Stream, StreamError};
use crate::upload::{StreamUpload, UploadDescriptor, UploadedFile};
use crate::uri::Uri;

/// Errors produced while bootstrapping a request.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to open request body: {0}")]
    Body(#[from] StreamError),
}

/// Everything a server knows about one incoming request.
///
/// # Examples
///
/// ```
/// use snapshot_http::http::{HttpMessage, HttpRequest, ServerRequest};
/// use snapshot_http::server::ServerEnvironment;
///
/// let env: ServerEnvironment = serde_json::from_str(r#"{
///     "server": {
///         "REQUEST_METHOD": "POST",
///         "HTTP_HOST": "example.com",
///         "REQUEST_URI": "/login?next=%2F",
///         "CONTENT_TYPE": "application/x-www-form-urlencoded"
///     },
///     "form": { "user": "ada" },
///     "body": "user=ada"
/// }"#).unwrap();
///
/// let request = ServerRequest::from_environment(env).unwrap();
/// assert_eq!(request.method().as_str(), "POST");
/// assert_eq!(request.uri().to_string(), "http://example.com/login?next=%2F");
/// assert_eq!(request.header_line("content-type"), "application/x-www-form-urlencoded");
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerEnvironment {
    pub server: ParameterBag,
    pub cookies: ParameterBag,
    pub query: ParameterBag,
    pub files: BTreeMap<String, UploadDescriptor>,
    pub form: ParameterBag,
    pub body: Bytes,
}

impl ServerRequest {
    /// Builds the request described by `env`.
    ///
    /// Uploads whose temporary file cannot be opened get an empty stream.
    /// The body is a read-only stream over `env.body`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Body`] if the body stream cannot be created.
    pub fn from_environment(env: ServerEnvironment) -> Result<Self, ServerError> {
        let server = &env.server;
        let method = server.get_or("REQUEST_METHOD", "GET");
        let version = server
            .get("SERVER_PROTOCOL")
            .map(|protocol| protocol.replace("HTTP/", ""))
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_owned());
        let uri = uri_from_server(server);
        let headers = server
            .iter()
            .filter_map(|(key, value)| header_name(key).map(|name| (name, value)));
        let body = Stream::new(Resource::memory(env.body.to_vec()), "r")?;

        debug!(
            method,
            uri = %uri,
            version = %version,
            uploads = env.files.len(),
            "server request from environment"
        );

        let message = Message::new(version, headers, Body::new(body));
        let request = ServerRequest::new(Request::new(method, uri, message), env.server.clone());
        let parsed_body = (!env.form.is_empty()).then(|| ParsedBody::Form(env.form));

        Ok(request
            .with_cookie_params(env.cookies)
            .with_query_params(env.query)
            .with_uploaded_files(uploads(env.files))
            .with_parsed_body(parsed_body))
    }
}

fn uploads(files: BTreeMap<String, UploadDescriptor>) -> HashMap<String, Arc<dyn UploadedFile>> {
    files
        .into_iter()
        .map(|(field, descriptor)| {
            let stream = Stream::open(&descriptor.tmp_name, "r").unwrap_or_else(|err| {
                warn!(
                    field = %field,
                    tmp_name = %descriptor.tmp_name.display(),
                    error = %err,
                    "upload not readable, using empty stream"
                );
                Stream::empty()
            });
            let upload = StreamUpload::new(stream, descriptor.size, descriptor.error)
                .with_client_filename(descriptor.name)
                .with_client_media_type(descriptor.media_type);
            (field, Arc::new(upload) as Arc<dyn UploadedFile>)
        })
        .collect()
}

/// Maps a server variable to the header it carries, if any.
///
/// `HTTP_ACCEPT_LANGUAGE` becomes `Accept-Language`.
fn header_name(key: &str) -> Option<String> {
    let raw = match key.strip_prefix("HTTP_") {
        Some(rest) if !rest.is_empty() => rest,
        _ if matches!(key, "CONTENT_TYPE" | "CONTENT_LENGTH" | "CONTENT_MD5") => key,
        _ => return None,
    };

    let words: Vec<String> = raw
        .split('_')
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    Some(words.join("-"))
}

fn is_https(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case("off")
}

fn uri_from_server(server: &ParameterBag) -> Uri {
    let scheme = if server.get("HTTPS").is_some_and(is_https) {
        "https"
    } else {
        "http"
    };
    let mut uri = Uri::default().with_scheme(scheme);

    let mut has_port = false;
    if let Some(http_host) = server.get("HTTP_HOST") {
        match Uri::parse(&format!("//{http_host}")) {
            Ok(parsed) => {
                uri = uri.with_host(parsed.host());
                if let Some(port) = parsed.port() {
                    has_port = true;
                    uri = uri.with_port(Some(port));
                }
            }
            Err(err) => warn!(http_host, error = %err, "ignoring malformed HTTP_HOST"),
        }
    } else if let Some(host) = server.get("SERVER_NAME").or_else(|| server.get("SERVER_ADDR")) {
        uri = uri.with_host(host);
    }

    if !has_port {
        if let Some(port) = server.get("SERVER_PORT") {
            match port.parse::<u16>() {
                Ok(port) => uri = uri.with_port(Some(port)),
                Err(_) => warn!(port, "ignoring malformed SERVER_PORT"),
            }
        }
    }

    let mut has_query = false;
    if let Some(request_uri) = server.get("REQUEST_URI") {
        match Uri::parse(request_uri) {
            Ok(parsed) => {
                uri = uri.with_path(parsed.path()).with_fragment(parsed.fragment());
                if !parsed.query().is_empty() {
                    has_query = true;
                    uri = uri.with_query(parsed.query());
                }
            }
            Err(err) => warn!(request_uri, error = %err, "ignoring malformed REQUEST_URI"),
        }
    }

    if !has_query {
        if let Some(query) = server.get("QUERY_STRING") {
            uri = uri.with_query(query);
        }
    }

    if let Some(user) = server.get("AUTH_USER") {
        uri = uri.with_user_info(user, server.get("AUTH_PW"));
    }

    uri
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Once;

    use super::*;
    use crate::http::{HttpMessage, HttpRequest, Method};
    use crate::upload::UploadErrorCode;

    static TRACING_INIT: Once = Once::new();

    fn init_tracing() {
        TRACING_INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init()
                .ok();
        });
    }

    fn server(vars: &[(&str, &str)]) -> ParameterBag {
        vars.iter().copied().collect()
    }

    fn from_server(vars: &[(&str, &str)]) -> ServerRequest {
        init_tracing();
        let env = ServerEnvironment {
            server: server(vars),
            ..ServerEnvironment::default()
        };
        ServerRequest::from_environment(env).unwrap()
    }

    #[test]
    fn empty_environment_defaults() {
        let request = from_server(&[]);
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.protocol_version(), "1.1");
        assert_eq!(request.request_target(), "");
        assert_eq!(request.uri().to_string(), "http:");
        assert!(request.headers().is_empty());
        assert!(request.parsed_body().is_none());
        assert!(request.uploaded_files().is_empty());
    }

    #[test]
    fn method_protocol_and_headers() {
        let request = from_server(&[
            ("REQUEST_METHOD", "PUT"),
            ("SERVER_PROTOCOL", "HTTP/2"),
            ("HTTP_ACCEPT_LANGUAGE", "en"),
            ("HTTP_X_FORWARDED_FOR", "10.0.0.1"),
            ("CONTENT_TYPE", "text/plain"),
            ("CONTENT_LENGTH", "5"),
            ("DOCUMENT_ROOT", "/var/www"),
        ]);

        assert_eq!(request.method(), &Method::Put);
        assert_eq!(request.protocol_version(), "2");
        assert_eq!(request.header_line("accept-language"), "en");
        assert_eq!(request.header_line("X-Forwarded-For"), "10.0.0.1");
        assert_eq!(request.header_line("content-type"), "text/plain");
        assert_eq!(request.header_line("content-length"), "5");
        assert_eq!(
            request.headers().names().collect::<Vec<_>>(),
            [
                "Accept-Language",
                "X-Forwarded-For",
                "Content-Type",
                "Content-Length"
            ]
        );
        assert_eq!(request.server_params().get("DOCUMENT_ROOT"), Some("/var/www"));
    }

    #[test]
    fn uri_from_http_host() {
        let request = from_server(&[
            ("HTTPS", "on"),
            ("HTTP_HOST", "example.com:8443"),
            ("SERVER_PORT", "443"),
            ("REQUEST_URI", "/a/b?x=1#top"),
            ("QUERY_STRING", "ignored=1"),
        ]);
        assert_eq!(request.uri().to_string(), "https://example.com:8443/a/b?x=1#top");
    }

    #[test]
    fn uri_from_server_name_and_port() {
        let request = from_server(&[
            ("SERVER_NAME", "internal.test"),
            ("SERVER_ADDR", "127.0.0.1"),
            ("SERVER_PORT", "8080"),
            ("REQUEST_URI", "/search"),
            ("QUERY_STRING", "q=rust"),
        ]);
        assert_eq!(request.uri().to_string(), "http://internal.test:8080/search?q=rust");
    }

    #[test]
    fn uri_falls_back_to_server_addr() {
        let request = from_server(&[
            ("SERVER_ADDR", "127.0.0.1"),
            ("SERVER_PORT", "80"),
            ("HTTPS", "off"),
        ]);
        assert_eq!(request.uri().scheme(), "http");
        assert_eq!(request.uri().host(), "127.0.0.1");
        assert_eq!(request.uri().port(), None);
    }

    #[test]
    fn uri_user_info() {
        let request = from_server(&[
            ("HTTP_HOST", "example.com"),
            ("AUTH_USER", "ada"),
            ("AUTH_PW", "secret"),
        ]);
        assert_eq!(request.uri().user_info(), "ada:secret");

        let request = from_server(&[("HTTP_HOST", "example.com"), ("AUTH_USER", "ada")]);
        assert_eq!(request.uri().to_string(), "http://ada@example.com");
    }

    #[test]
    fn malformed_values_are_skipped() {
        let request = from_server(&[
            ("HTTP_HOST", "bad host"),
            ("SERVER_PORT", "http"),
            ("REQUEST_URI", "/ok path"),
        ]);
        assert_eq!(request.uri().to_string(), "http:");
    }

    #[test]
    fn body_cookies_query_and_form() {
        init_tracing();
        let env = ServerEnvironment {
            cookies: server(&[("session", "abc")]),
            query: server(&[("page", "3")]),
            form: server(&[("name", "ada")]),
            body: Bytes::from_static(b"name=ada"),
            ..ServerEnvironment::default()
        };
        let request = ServerRequest::from_environment(env).unwrap();

        assert_eq!(request.cookie_params().get("session"), Some("abc"));
        assert_eq!(request.query_params().get("page"), Some("3"));
        assert_eq!(
            request.parsed_body(),
            Some(&ParsedBody::Form(server(&[("name", "ada")])))
        );

        let mut body = request.body().lock();
        assert!(body.is_readable());
        assert!(!body.is_writable());
        assert_eq!(&body.contents().unwrap()[..], b"name=ada");
    }

    #[test]
    fn uploads_become_stream_uploads() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("php1");
        fs::write(&tmp, b"avatar bytes").unwrap();

        let json = serde_json::json!({
            "files": {
                "avatar": {
                    "name": "me.png",
                    "type": "image/png",
                    "size": 12,
                    "tmp_name": tmp,
                    "error": 0
                },
                "missing": {
                    "name": "gone.txt",
                    "media_type": "text/plain",
                    "size": 0,
                    "tmp_name": dir.path().join("nope"),
                    "error": 4
                }
            }
        });
        let env: ServerEnvironment = serde_json::from_value(json).unwrap();
        let request = ServerRequest::from_environment(env).unwrap();
        let files = request.uploaded_files();

        let avatar = &files["avatar"];
        assert_eq!(avatar.size(), Some(12));
        assert_eq!(avatar.client_filename(), Some("me.png"));
        assert_eq!(avatar.client_media_type(), Some("image/png"));
        assert_eq!(&avatar.content().unwrap()[..], b"avatar bytes");

        let missing = &files["missing"];
        assert_eq!(missing.error(), UploadErrorCode::NoFile);
        assert!(missing.content().unwrap().is_empty());
    }

    #[test]
    fn headers_keep_environment_order() {
        init_tracing();
        let env: ServerEnvironment = serde_json::from_str(
            r#"{"server": {"HTTP_X_Z": "1", "HTTP_ACCEPT": "*/*", "HTTP_DNT": "1"}}"#,
        )
        .unwrap();
        let request = ServerRequest::from_environment(env).unwrap();
        assert_eq!(
            request.headers().names().collect::<Vec<_>>(),
            ["X-Z", "Accept", "Dnt"]
        );
    }

    #[test]
    fn upload_without_size_uses_file_size() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("php2");
        fs::write(&tmp, b"twelve bytes").unwrap();

        let json = serde_json::json!({
            "files": {
                "doc": { "name": "a.txt", "size": null, "tmp_name": tmp }
            }
        });
        let env: ServerEnvironment = serde_json::from_value(json).unwrap();
        let request = ServerRequest::from_environment(env).unwrap();
        assert_eq!(request.uploaded_files()["doc"].size(), Some(12));
    }

    #[test]
    fn header_names() {
        assert_eq!(header_name("HTTP_HOST").as_deref(), Some("Host"));
        assert_eq!(header_name("HTTP_USER_AGENT").as_deref(), Some("User-Agent"));
        assert_eq!(header_name("CONTENT_MD5").as_deref(), Some("Content-Md5"));
        assert_eq!(header_name("HTTP_"), None);
        assert_eq!(header_name("SERVER_NAME"), None);
    }
}
