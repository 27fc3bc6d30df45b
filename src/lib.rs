//! Dify 应用 API 客户端

pub mod api;
pub mod chat;
pub mod client;
pub mod completion;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod types;

pub use api::{DifyApi, RequestSender};
pub use chat::ChatClient;
pub use client::{DEFAULT_BASE_URL, DifyClient};
pub use completion::CompletionClient;
pub use error::DifyError;
pub use response::DifyResponse;
pub use types::*;
