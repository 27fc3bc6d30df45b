use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::ChatClient;
use crate::client::DifyClient;
use crate::completion::CompletionClient;
use crate::error::DifyError;
use crate::http::DynHttpTransport;

/// 环境变量 API Key
pub const ENV_API_KEY: &str = "DIFY_API_KEY";
/// 环境变量 服务地址
pub const ENV_BASE_URL: &str = "DIFY_BASE_URL";
/// 环境变量 超时秒数
pub const ENV_TIMEOUT_SECS: &str = "DIFY_TIMEOUT_SECS";

/// 客户端配置 描述一个 Dify 应用
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 应用 API Key 以 Bearer Token 发送
    pub api_key: String,
    /// 留空时使用 [`crate::client::DEFAULT_BASE_URL`]
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Result<Self, DifyError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 通过任意键值来源读取配置 空白值视为未设置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DifyError> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = non_blank(ENV_API_KEY)
            .ok_or_else(|| DifyError::invalid_config("api_key", format!("{ENV_API_KEY} is not set")))?;
        let base_url = non_blank(ENV_BASE_URL);
        let timeout_secs = match non_blank(ENV_TIMEOUT_SECS) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|err| {
                DifyError::invalid_config("timeout_secs", format!("{ENV_TIMEOUT_SECS}={raw}: {err}"))
            })?),
            None => None,
        };

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// 根据配置构建基础客户端
pub fn build_dify_client(
    config: &ClientConfig,
    transport: DynHttpTransport,
) -> Result<DifyClient, DifyError> {
    if config.api_key.trim().is_empty() {
        return Err(DifyError::invalid_config("api_key", "must not be empty"));
    }

    let mut client = DifyClient::new(transport, config.api_key.clone());
    if let Some(base_url) = &config.base_url {
        client = client.with_base_url(base_url.clone());
    }
    match config.timeout_secs {
        Some(0) => {
            return Err(DifyError::invalid_config(
                "timeout_secs",
                "must be greater than zero",
            ));
        }
        Some(secs) => client = client.with_timeout(Duration::from_secs(secs)),
        None => {}
    }

    Ok(client)
}

/// 根据配置构建对话客户端
pub fn build_chat_client(
    config: &ClientConfig,
    transport: DynHttpTransport,
) -> Result<ChatClient, DifyError> {
    build_dify_client(config, transport).map(ChatClient::from_client)
}

/// 根据配置构建文本生成客户端
pub fn build_completion_client(
    config: &ClientConfig,
    transport: DynHttpTransport,
) -> Result<CompletionClient, DifyError> {
    build_dify_client(config, transport).map(CompletionClient::from_client)
}
