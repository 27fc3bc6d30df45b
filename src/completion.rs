use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::RequestSender;
use crate::client::DifyClient;
use crate::error::DifyError;
use crate::http::{DynHttpTransport, FilePart, HttpMethod, QueryParams};
use crate::response::DifyResponse;
use crate::types::{InputFile, Inputs, files_value, is_streaming_mode};

/// 文本生成型应用客户端
#[derive(Debug, Clone)]
pub struct CompletionClient {
    inner: DifyClient,
}

impl CompletionClient {
    /// 使用默认 base_url 创建客户端
    pub fn new(transport: DynHttpTransport, api_key: impl Into<String>) -> Self {
        Self::from_client(DifyClient::new(transport, api_key))
    }

    /// 复用已配置好的基础客户端
    pub fn from_client(inner: DifyClient) -> Self {
        Self { inner }
    }

    pub fn client(&self) -> &DifyClient {
        &self.inner
    }

    /// 发送单轮生成请求
    ///
    /// The response streams only when `response_mode` is exactly `"streaming"`; any
    /// other value is sent as-is and answered in one body.
    pub async fn create_completion_message(
        &self,
        inputs: Inputs,
        response_mode: &str,
        user: &str,
        files: Option<Vec<InputFile>>,
    ) -> Result<DifyResponse, DifyError> {
        let mut body = Map::new();
        body.insert("inputs".to_string(), Value::Object(inputs));
        body.insert("response_mode".to_string(), Value::from(response_mode));
        body.insert("user".to_string(), Value::from(user));
        body.insert("files".to_string(), files_value(files.as_deref())?);

        self.send_json(
            HttpMethod::Post,
            "/completion-messages",
            Some(Value::Object(body)),
            None,
            is_streaming_mode(response_mode),
        )
        .await
    }
}

#[async_trait]
impl RequestSender for CompletionClient {
    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: Option<QueryParams>,
        stream: bool,
    ) -> Result<DifyResponse, DifyError> {
        self.inner.send_json(method, path, body, query, stream).await
    }

    async fn send_multipart(
        &self,
        method: HttpMethod,
        path: &str,
        fields: Vec<(String, String)>,
        files: Vec<(String, FilePart)>,
    ) -> Result<DifyResponse, DifyError> {
        self.inner.send_multipart(method, path, fields, files).await
    }
}
