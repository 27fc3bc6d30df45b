use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::RequestSender;
use crate::client::DifyClient;
use crate::error::DifyError;
use crate::http::{DynHttpTransport, FilePart, HttpMethod, QueryParams};
use crate::response::DifyResponse;
use crate::types::{InputFile, Inputs, files_value, is_streaming_mode};

/// 对话型应用客户端 支持多轮会话
#[derive(Debug, Clone)]
pub struct ChatClient {
    inner: DifyClient,
}

impl ChatClient {
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

    /// 发送对话消息
    ///
    /// `conversation_id` is only sent when it is present and non-empty, so `None` and
    /// `Some("")` both start a new conversation. Pass
    /// [`crate::types::RESPONSE_MODE_BLOCKING`] for the usual blocking mode.
    pub async fn create_chat_message(
        &self,
        inputs: Inputs,
        query: &str,
        user: &str,
        response_mode: &str,
        conversation_id: Option<&str>,
        files: Option<Vec<InputFile>>,
    ) -> Result<DifyResponse, DifyError> {
        let mut body = Map::new();
        body.insert("inputs".to_string(), Value::Object(inputs));
        body.insert("query".to_string(), Value::from(query));
        body.insert("user".to_string(), Value::from(user));
        body.insert("response_mode".to_string(), Value::from(response_mode));
        body.insert("files".to_string(), files_value(files.as_deref())?);
        if let Some(conversation_id) = conversation_id.filter(|id| !id.is_empty()) {
            body.insert(
                "conversation_id".to_string(),
                Value::from(conversation_id),
            );
        }

        self.send_json(
            HttpMethod::Post,
            "/chat-messages",
            Some(Value::Object(body)),
            None,
            is_streaming_mode(response_mode),
        )
        .await
    }

    /// 获取会话历史消息
    ///
    /// Empty ids and a zero `limit` are left out of the query entirely.
    pub async fn get_conversation_messages(
        &self,
        user: &str,
        conversation_id: Option<&str>,
        first_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<DifyResponse, DifyError> {
        let mut query: QueryParams = vec![("user".to_string(), user.to_string())];
        if let Some(conversation_id) = conversation_id.filter(|id| !id.is_empty()) {
            query.push(("conversation_id".to_string(), conversation_id.to_string()));
        }
        if let Some(first_id) = first_id.filter(|id| !id.is_empty()) {
            query.push(("first_id".to_string(), first_id.to_string()));
        }
        if let Some(limit) = limit.filter(|limit| *limit != 0) {
            query.push(("limit".to_string(), limit.to_string()));
        }

        self.send_json(HttpMethod::Get, "/messages", None, Some(query), false)
            .await
    }

    /// 获取会话列表
    ///
    /// Every key is sent; a missing value goes out as an empty string.
    pub async fn get_conversations(
        &self,
        user: &str,
        last_id: Option<&str>,
        limit: Option<u32>,
        pinned: Option<bool>,
    ) -> Result<DifyResponse, DifyError> {
        let query: QueryParams = vec![
            ("user".to_string(), user.to_string()),
            ("last_id".to_string(), last_id.unwrap_or_default().to_string()),
            (
                "limit".to_string(),
                limit.map(|limit| limit.to_string()).unwrap_or_default(),
            ),
            (
                "pinned".to_string(),
                pinned.map(|pinned| pinned.to_string()).unwrap_or_default(),
            ),
        ];

        self.send_json(HttpMethod::Get, "/conversations", None, Some(query), false)
            .await
    }

    /// 重命名会话
    pub async fn rename_conversation(
        &self,
        conversation_id: &str,
        name: &str,
        user: &str,
    ) -> Result<DifyResponse, DifyError> {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::from(name));
        body.insert("user".to_string(), Value::from(user));

        self.send_json(
            HttpMethod::Post,
            &format!("/conversations/{conversation_id}/name"),
            Some(Value::Object(body)),
            None,
            false,
        )
        .await
    }
}

#[async_trait]
impl RequestSender for ChatClient {
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
