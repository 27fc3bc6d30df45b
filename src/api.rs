use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::DifyError;
use crate::http::{FilePart, HttpMethod, QueryParams};
use crate::response::DifyResponse;

/// 发送原语 所有客户端共享
///
/// Implemented by [`crate::DifyClient`]; the specialized clients embed one and
/// delegate to it.
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// 以 JSON 编码发送请求 `stream` 为 true 时返回流式响应
    async fn send_json(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: Option<QueryParams>,
        stream: bool,
    ) -> Result<DifyResponse, DifyError>;

    /// 以 multipart 表单发送请求 不设置 Content-Type
    async fn send_multipart(
        &self,
        method: HttpMethod,
        path: &str,
        fields: Vec<(String, String)>,
        files: Vec<(String, FilePart)>,
    ) -> Result<DifyResponse, DifyError>;
}

/// 通用接口 对任意 RequestSender 可用
#[async_trait]
pub trait DifyApi: RequestSender {
    /// 为消息提交反馈 rating 原样透传
    async fn message_feedback(
        &self,
        message_id: &str,
        rating: &str,
        user: &str,
    ) -> Result<DifyResponse, DifyError> {
        let mut body = Map::new();
        body.insert("rating".to_string(), Value::from(rating));
        body.insert("user".to_string(), Value::from(user));
        self.send_json(
            HttpMethod::Post,
            &format!("/messages/{message_id}/feedbacks"),
            Some(Value::Object(body)),
            None,
            false,
        )
        .await
    }

    /// 获取应用参数
    async fn get_application_parameters(&self, user: &str) -> Result<DifyResponse, DifyError> {
        let query = vec![("user".to_string(), user.to_string())];
        self.send_json(HttpMethod::Get, "/parameters", None, Some(query), false)
            .await
    }

    /// 上传文件 `files` 的键为表单字段名
    async fn file_upload(
        &self,
        user: &str,
        files: Vec<(String, FilePart)>,
    ) -> Result<DifyResponse, DifyError> {
        let fields = vec![("user".to_string(), user.to_string())];
        self.send_multipart(HttpMethod::Post, "/files/upload", fields, files)
            .await
    }
}

impl<T: RequestSender> DifyApi for T {}
