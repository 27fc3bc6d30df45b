//! Pass-through response handed back by every client operation.

use std::collections::HashMap;

use crate::http::{HttpResponse, HttpStreamResponse};

/// Raw server answer, never interpreted by the client.
///
/// Blocking calls yield [`DifyResponse::Complete`] with the whole body already read.
/// Calls made with `response_mode == "streaming"` yield [`DifyResponse::Streaming`]
/// whose body is a single-pass chunk stream; decoding the event stream is left to the
/// caller.
///
/// # Examples
///
/// ```
/// use dify_client::DifyResponse;
/// use dify_client::http::HttpResponse;
///
/// let response = DifyResponse::Complete(HttpResponse {
///     status: 404,
///     headers: Default::default(),
///     body: b"{\"code\":\"not_found\"}".to_vec(),
/// });
/// assert_eq!(response.status(), 404);
/// assert!(!response.is_streaming());
/// ```
#[derive(Debug)]
pub enum DifyResponse {
    Complete(HttpResponse),
    Streaming(HttpStreamResponse),
}

impl DifyResponse {
    pub fn status(&self) -> u16 {
        match self {
            DifyResponse::Complete(response) => response.status,
            DifyResponse::Streaming(response) => response.status,
        }
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        match self {
            DifyResponse::Complete(response) => &response.headers,
            DifyResponse::Streaming(response) => &response.headers,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, DifyResponse::Streaming(_))
    }

    /// Returns the buffered response, or `None` for a streamed one.
    pub fn into_complete(self) -> Option<HttpResponse> {
        match self {
            DifyResponse::Complete(response) => Some(response),
            DifyResponse::Streaming(_) => None,
        }
    }

    /// Returns the streamed response, or `None` for a buffered one.
    pub fn into_stream(self) -> Option<HttpStreamResponse> {
        match self {
            DifyResponse::Streaming(response) => Some(response),
            DifyResponse::Complete(_) => None,
        }
    }
}
