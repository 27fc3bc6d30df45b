use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};

use crate::error::DifyError;

use super::{
    DynHttpTransport, HttpBody, HttpBodyStream, HttpMethod, HttpRequest, HttpResponse,
    HttpStreamResponse, HttpTransport, MultipartForm,
};

/// 基于 reqwest 的默认 HttpTransport
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 使用自定义 reqwest::Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 创建默认配置
    pub fn default_client() -> Result<Self, DifyError> {
        Client::builder()
            .build()
            .map(Self::new)
            .map_err(|err| DifyError::transport(format!("failed to create reqwest client: {err}")))
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    fn build_form(form: MultipartForm) -> Result<Form, DifyError> {
        let mut multipart = Form::new();
        for (name, value) in form.fields {
            multipart = multipart.text(name, value);
        }
        for (name, file) in form.files {
            let part = Part::bytes(file.data)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .map_err(|err| {
                    DifyError::validation(format!("invalid mime type for part {name}: {err}"))
                })?;
            multipart = multipart.part(name, part);
        }
        Ok(multipart)
    }

    fn build_request(&self, mut request: HttpRequest) -> Result<reqwest::RequestBuilder, DifyError> {
        let method = Self::method(request.method);
        let mut builder = self.client.request(method, &request.url);

        if let Some(timeout) = request.timeout.take() {
            builder = builder.timeout(timeout);
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in request.headers.drain() {
            let header_name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| DifyError::validation(format!("invalid header name: {err}")))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value).map_err(|err| {
                DifyError::validation(format!("invalid header value for {header_name}: {err}"))
            })?;
            builder = builder.header(header_name, header_value);
        }

        match request.body.take() {
            Some(HttpBody::Json(body)) => builder = builder.body(body),
            Some(HttpBody::Multipart(form)) => builder = builder.multipart(Self::build_form(form)?),
            None => {}
        }

        Ok(builder)
    }

    fn headers_to_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DifyError> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|err| DifyError::transport(err.to_string()))?;

        let status = response.status().as_u16();
        let headers = Self::headers_to_map(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|err| DifyError::transport(err.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// The timeout only bounds the wait for response headers; once they arrive the
    /// body is pulled for as long as the server keeps sending.
    async fn send_stream(&self, mut request: HttpRequest) -> Result<HttpStreamResponse, DifyError> {
        let header_timeout = request.timeout.take();
        let pending = self.build_request(request)?.send();
        let response = match header_timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending).await.map_err(|_| {
                DifyError::transport(format!(
                    "timed out after {timeout:?} waiting for response headers"
                ))
            })?,
            None => pending.await,
        }
        .map_err(|err| DifyError::transport(err.to_string()))?;

        let status = response.status().as_u16();
        let headers = Self::headers_to_map(response.headers());
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| DifyError::transport(err.to_string()))
        });
        let body: HttpBodyStream = Box::pin(stream);

        Ok(HttpStreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// 便捷构造线程安全 Transport
pub fn default_dyn_transport() -> Result<DynHttpTransport, DifyError> {
    Ok(Arc::new(ReqwestTransport::default_client()?))
}
