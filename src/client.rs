use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::api::RequestSender;
use crate::error::DifyError;
use crate::http::{
    DynHttpTransport, FilePart, HttpBody, HttpMethod, HttpRequest, MultipartForm, QueryParams,
    dispatch, encode_json,
};
use crate::response::DifyResponse;

/// 默认服务地址
pub const DEFAULT_BASE_URL: &str = "https://api.dify.ai/v1";

/// 基础客户端 持有凭证 服务地址与 Transport
///
/// Credentials and base URL are fixed once the client is built; the client keeps no
/// per-call state and can be shared across tasks.
#[derive(Clone)]
pub struct DifyClient {
    pub(crate) transport: DynHttpTransport,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
}

impl DifyClient {
    /// 使用默认 base_url 创建客户端
    pub fn new(transport: DynHttpTransport, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// 自定义 base_url 路径会原样拼接在其后
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 为每个请求设置超时 由 Transport 执行
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> HashMap<String, String> {
        HashMap::from([(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )])
    }

    fn json_headers(&self) -> HashMap<String, String> {
        let mut headers = self.auth_headers();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }
}

impl std::fmt::Debug for DifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifyClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestSender for DifyClient {
    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: Option<QueryParams>,
        stream: bool,
    ) -> Result<DifyResponse, DifyError> {
        let url = self.endpoint(path);
        debug!(method = method.as_str(), %url, stream, "sending json request");

        let mut request = HttpRequest::new(method, url)
            .with_headers(self.json_headers())
            .with_query(query.unwrap_or_default())
            .with_timeout(self.timeout);
        if let Some(body) = body {
            request.body = Some(HttpBody::Json(encode_json(&body)?));
        }

        dispatch(self.transport.as_ref(), request, stream).await
    }

    async fn send_multipart(
        &self,
        method: HttpMethod,
        path: &str,
        fields: Vec<(String, String)>,
        files: Vec<(String, FilePart)>,
    ) -> Result<DifyResponse, DifyError> {
        let url = self.endpoint(path);
        debug!(
            method = method.as_str(),
            %url,
            files = files.len(),
            "sending multipart request"
        );

        let request = HttpRequest::multipart(method, url, MultipartForm { fields, files })
            .with_headers(self.auth_headers())
            .with_timeout(self.timeout);

        dispatch(self.transport.as_ref(), request, false).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use futures_util::{StreamExt, stream};
    use serde_json::json;

    use super::*;
    use crate::api::DifyApi;
    use crate::http::{HttpResponse, HttpStreamResponse, HttpTransport};

    /// 记录所有请求的 Transport 供各客户端测试复用
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
        pub(crate) streamed: Mutex<Vec<bool>>,
    }

    impl RecordingTransport {
        pub(crate) fn last(&self) -> HttpRequest {
            self.requests
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("at least one request")
        }

        pub(crate) fn last_streamed(&self) -> bool {
            *self.streamed.lock().expect("lock").last().expect("flag")
        }

        fn record(&self, request: HttpRequest, stream: bool) {
            self.requests.lock().expect("lock").push(request);
            self.streamed.lock().expect("lock").push(stream);
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DifyError> {
            self.record(request, false);
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: br#"{"result":"success"}"#.to_vec(),
            })
        }

        async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, DifyError> {
            self.record(request, true);
            let chunks = vec![
                Ok(b"data: {\"event\":\"message\"}\n\n".to_vec()),
                Ok(b"data: {\"event\":\"message_end\"}\n\n".to_vec()),
            ];
            Ok(HttpStreamResponse {
                status: 200,
                headers: HashMap::new(),
                body: Box::pin(stream::iter(chunks)),
            })
        }
    }

    /// 固定返回传输错误的 Transport
    struct FailingTransport;

    #[async_trait]
    impl HttpTransport for FailingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, DifyError> {
            Err(DifyError::transport("connection refused"))
        }

        async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, DifyError> {
            Err(DifyError::transport("connection refused"))
        }
    }

    /// 返回非 2xx 响应的 Transport
    struct NotFoundTransport;

    #[async_trait]
    impl HttpTransport for NotFoundTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, DifyError> {
            Ok(HttpResponse {
                status: 404,
                headers: HashMap::new(),
                body: br#"{"code":"not_found"}"#.to_vec(),
            })
        }

        async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, DifyError> {
            panic!("send_stream should not be called");
        }
    }

    pub(crate) fn recording_client() -> (Arc<RecordingTransport>, DifyClient) {
        let transport = Arc::new(RecordingTransport::default());
        let client = DifyClient::new(transport.clone(), "test-key");
        (transport, client)
    }

    pub(crate) fn json_body(request: &HttpRequest) -> Value {
        match &request.body {
            Some(HttpBody::Json(bytes)) => serde_json::from_slice(bytes).expect("json body"),
            other => panic!("expected json body, got {other:?}"),
        }
    }

    pub(crate) fn raw_body(request: &HttpRequest) -> String {
        match &request.body {
            Some(HttpBody::Json(bytes)) => String::from_utf8(bytes.clone()).expect("utf8"),
            other => panic!("expected json body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_json_sets_bearer_and_content_type() {
        let (transport, client) = recording_client();
        client
            .send_json(HttpMethod::Post, "/anything", Some(json!({"a": 1})), None, false)
            .await
            .expect("send");

        let request = transport.last();
        assert_eq!(request.url, "https://api.dify.ai/v1/anything");
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer test-key".to_string())
        );
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert!(request.query.is_empty());
    }

    #[tokio::test]
    async fn send_json_without_body_keeps_json_headers() {
        let (transport, client) = recording_client();
        client
            .send_json(HttpMethod::Get, "/parameters", None, None, false)
            .await
            .expect("send");

        let request = transport.last();
        assert!(request.body.is_none());
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[tokio::test]
    async fn send_json_without_stream_buffers_body() {
        let (transport, client) = recording_client();
        let response = client
            .send_json(HttpMethod::Get, "/parameters", None, None, false)
            .await
            .expect("send");

        assert!(!transport.last_streamed());
        assert!(transport.last().body.is_none());
        let complete = response.into_complete().expect("complete response");
        assert_eq!(complete.into_string().expect("utf8"), r#"{"result":"success"}"#);
    }

    #[tokio::test]
    async fn send_json_with_stream_yields_single_pass_body() {
        let (transport, client) = recording_client();
        let response = client
            .send_json(HttpMethod::Post, "/chat-messages", Some(json!({})), None, true)
            .await
            .expect("send");

        assert!(transport.last_streamed());
        let mut streaming = response.into_stream().expect("streaming response");
        let mut chunks = Vec::new();
        while let Some(chunk) = streaming.body.next().await {
            chunks.push(chunk.expect("chunk"));
        }
        assert_eq!(chunks.len(), 2);
        assert!(streaming.body.next().await.is_none());
    }

    #[tokio::test]
    async fn send_multipart_omits_content_type() {
        let (transport, client) = recording_client();
        let files = vec![(
            "file".to_string(),
            FilePart::new("a.png", "image/png", b"png".to_vec()),
        )];
        client
            .send_multipart(
                HttpMethod::Post,
                "/files/upload",
                vec![("user".to_string(), "u".to_string())],
                files,
            )
            .await
            .expect("send");

        let request = transport.last();
        assert!(!transport.last_streamed());
        assert!(
            !request
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"))
        );
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer test-key".to_string())
        );
        match request.body {
            Some(HttpBody::Multipart(form)) => {
                assert_eq!(form.field("user"), Some("u"));
                assert_eq!(form.files.len(), 1);
                assert_eq!(form.files[0].1.file_name, "a.png");
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn base_url_and_timeout_are_applied_per_request() {
        let transport = Arc::new(RecordingTransport::default());
        let client = DifyClient::new(transport.clone(), "k")
            .with_base_url("http://localhost:5001/v1")
            .with_timeout(Duration::from_secs(7));
        client
            .get_application_parameters("user-1")
            .await
            .expect("send");

        let request = transport.last();
        assert_eq!(request.url, "http://localhost:5001/v1/parameters");
        assert_eq!(request.timeout, Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn message_feedback_posts_rating_and_user() {
        let (transport, client) = recording_client();
        client
            .message_feedback("msg-1", "like", "user-1")
            .await
            .expect("send");

        let request = transport.last();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.dify.ai/v1/messages/msg-1/feedbacks");
        assert_eq!(raw_body(&request), r#"{"rating":"like","user":"user-1"}"#);
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer test-key".to_string())
        );
    }

    #[tokio::test]
    async fn message_feedback_passes_unknown_rating_through() {
        let (transport, client) = recording_client();
        client
            .message_feedback("msg-2", "meh", "user-1")
            .await
            .expect("send");
        assert_eq!(json_body(&transport.last())["rating"], "meh");
    }

    #[tokio::test]
    async fn get_application_parameters_sends_user_query() {
        let (transport, client) = recording_client();
        client
            .get_application_parameters("user-1")
            .await
            .expect("send");

        let request = transport.last();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://api.dify.ai/v1/parameters");
        assert_eq!(request.query, vec![("user".to_string(), "user-1".to_string())]);
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn file_upload_sends_user_field_and_files() {
        let (transport, client) = recording_client();
        let files = vec![(
            "file".to_string(),
            FilePart::new("cat.jpg", "image/jpeg", vec![0xff, 0xd8]),
        )];
        client.file_upload("user-1", files).await.expect("send");

        let request = transport.last();
        assert_eq!(request.url, "https://api.dify.ai/v1/files/upload");
        match request.body {
            Some(HttpBody::Multipart(form)) => {
                assert_eq!(form.fields, vec![("user".to_string(), "user-1".to_string())]);
                assert_eq!(form.files[0].0, "file");
                assert_eq!(form.files[0].1.mime_type, "image/jpeg");
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let client = DifyClient::new(Arc::new(FailingTransport), "k");
        let err = client
            .get_application_parameters("user-1")
            .await
            .expect_err("should fail");
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn non_success_status_is_returned_as_response() {
        let client = DifyClient::new(Arc::new(NotFoundTransport), "k");
        let response = client
            .message_feedback("missing", "like", "user-1")
            .await
            .expect("status codes are not errors");
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let (_, client) = recording_client();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("test-key"));
        assert!(rendered.contains("api.dify.ai"));
    }
}
