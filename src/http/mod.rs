use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;

use crate::error::DifyError;
use crate::response::DifyResponse;

/// Enumerates HTTP methods understood by the transport abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// Returns the canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Ordered query parameters appended to the request URL.
pub type QueryParams = Vec<(String, String)>;

/// Named file payload carried by a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl FilePart {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Plain form values plus file parts, encoded by the transport.
///
/// The boundary and therefore the `Content-Type` header are chosen by the transport
/// when the form is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    /// Looks up a plain form value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Request payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Serialized JSON document.
    Json(Vec<u8>),
    /// Multipart form assembled by the transport.
    Multipart(MultipartForm),
}

/// Minimal HTTP request representation built fresh for every call.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: QueryParams,
    pub body: Option<HttpBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Builds a request without headers, query or body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Builds a request with a JSON body.
    ///
    /// The helper sets the `Content-Type` header to `application/json` and stores the
    /// provided buffer as the body.
    ///
    /// # Examples
    ///
    /// ```
    /// use dify_client::http::{HttpBody, HttpMethod, HttpRequest};
    ///
    /// let request = HttpRequest::json(HttpMethod::Post, "https://example.com", br"{}".to_vec());
    /// assert_eq!(request.method, HttpMethod::Post);
    /// assert_eq!(request.headers.get("Content-Type"), Some(&"application/json".to_string()));
    /// assert_eq!(request.body, Some(HttpBody::Json(b"{}".to_vec())));
    /// ```
    pub fn json(method: HttpMethod, url: impl Into<String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(method, url);
        request
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        request.body = Some(HttpBody::Json(body));
        request
    }

    /// Builds a request carrying a multipart form.
    ///
    /// No `Content-Type` header is stored: the transport writes it together with
    /// the boundary.
    pub fn multipart(method: HttpMethod, url: impl Into<String>, form: MultipartForm) -> Self {
        let mut request = Self::new(method, url);
        request.body = Some(HttpBody::Multipart(form));
        request
    }

    /// Overrides the request headers after construction.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use dify_client::http::{HttpMethod, HttpRequest};
    ///
    /// let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
    ///     .with_headers(HashMap::from([("Authorization".into(), "Bearer test".into())]));
    /// assert_eq!(request.headers.get("Authorization"), Some(&"Bearer test".to_string()));
    /// ```
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the query parameters.
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Sets a per-request timeout honored by the transport.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Looks up a query value by key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Minimal HTTP response representation with a fully buffered body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Converts the body into a UTF-8 string.
    ///
    /// # Examples
    ///
    /// ```
    /// use dify_client::http::HttpResponse;
    ///
    /// let response = HttpResponse { status: 200, headers: Default::default(), body: b"ok".to_vec() };
    /// assert_eq!(response.into_string().unwrap(), "ok");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DifyError::Decode`] when the body cannot be interpreted as UTF-8.
    pub fn into_string(self) -> Result<String, DifyError> {
        String::from_utf8(self.body)
            .map_err(|err| DifyError::decode(format!("response body is not UTF-8: {err}")))
    }
}

/// HTTP response that carries a streaming body.
pub struct HttpStreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: HttpBodyStream,
}

impl std::fmt::Debug for HttpStreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Alias for the body stream returned by [`HttpTransport::send_stream`].
///
/// The stream is forward-only and cannot be restarted once polled to completion.
pub type HttpBodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, DifyError>> + Send>>;

/// Transport abstraction used to decouple the clients from the concrete HTTP client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves when the full response is available.
    ///
    /// # Examples
    ///
    /// ```
    /// # use async_trait::async_trait;
    /// # use dify_client::http::{HttpTransport, HttpRequest, HttpResponse, HttpStreamResponse, HttpMethod};
    /// # use dify_client::error::DifyError;
    /// # use futures_util::stream;
    /// struct MemoryTransport;
    ///
    /// #[async_trait]
    /// impl HttpTransport for MemoryTransport {
    ///     async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DifyError> {
    ///         Ok(HttpResponse { status: 200, headers: request.headers, body: b"ok".to_vec() })
    ///     }
    ///     async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, DifyError> {
    ///         Ok(HttpStreamResponse { status: 200, headers: request.headers, body: Box::pin(stream::empty()) })
    ///     }
    /// }
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let response = MemoryTransport
    ///     .send(HttpRequest::new(HttpMethod::Get, "https://example.com"))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(response.status, 200);
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Implementations should map network failures to [`DifyError::Transport`] and
    /// encoding problems to [`DifyError::Validation`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DifyError>;

    /// Sends a request and returns as soon as the headers are available, leaving the
    /// body to be pulled incrementally.
    ///
    /// # Errors
    ///
    /// Implementations should return [`DifyError::Transport`] for network failures.
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, DifyError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes a value to a JSON buffer.
///
/// # Errors
///
/// Returns [`DifyError::Validation`] if serialization fails.
pub fn encode_json<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, DifyError> {
    serde_json::to_vec(body)
        .map_err(|err| DifyError::validation(format!("failed to serialize request: {err}")))
}

/// Hands a request to the transport, buffered or streamed.
///
/// # Errors
///
/// Forwards whatever [`HttpTransport::send`] or [`HttpTransport::send_stream`] report.
pub async fn dispatch(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    stream: bool,
) -> Result<DifyResponse, DifyError> {
    tracing::trace!(
        method = request.method.as_str(),
        url = %request.url,
        stream,
        "dispatching request"
    );
    if stream {
        transport
            .send_stream(request)
            .await
            .map(DifyResponse::Streaming)
    } else {
        transport.send(request).await.map(DifyResponse::Complete)
    }
}

pub mod reqwest;
