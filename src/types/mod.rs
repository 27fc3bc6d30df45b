//! Request-side data shared by the chat and completion clients.
//!
//! Values stay as open strings where the server accepts free-form input, so callers
//! are never prevented from sending a mode or file type the client does not know.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DifyError;

/// Application variables sent as the `inputs` object.
pub type Inputs = Map<String, Value>;

/// Response mode that returns the whole answer in one body.
pub const RESPONSE_MODE_BLOCKING: &str = "blocking";

/// Response mode that returns incremental server-sent events.
pub const RESPONSE_MODE_STREAMING: &str = "streaming";

/// Returns `true` only for the exact, case-sensitive `"streaming"` mode.
///
/// # Examples
///
/// ```
/// use dify_client::types::is_streaming_mode;
///
/// assert!(is_streaming_mode("streaming"));
/// assert!(!is_streaming_mode("Streaming"));
/// assert!(!is_streaming_mode(""));
/// ```
pub fn is_streaming_mode(response_mode: &str) -> bool {
    response_mode == RESPONSE_MODE_STREAMING
}

/// File reference attached to a chat or completion message.
///
/// Either points at a remote URL or at a file previously sent through
/// [`crate::DifyApi::file_upload`].
///
/// # Examples
///
/// ```
/// use dify_client::types::InputFile;
///
/// let file = InputFile::remote_url("image", "https://example.com/cat.png");
/// let json = serde_json::to_value(&file).unwrap();
/// assert_eq!(json["type"], "image");
/// assert_eq!(json["transfer_method"], "remote_url");
/// assert!(json.get("upload_file_id").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// File category such as `image`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `remote_url` or `local_file`.
    pub transfer_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_file_id: Option<String>,
}

impl InputFile {
    pub fn remote_url(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            transfer_method: "remote_url".to_string(),
            url: Some(url.into()),
            upload_file_id: None,
        }
    }

    pub fn local_file(kind: impl Into<String>, upload_file_id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            transfer_method: "local_file".to_string(),
            url: None,
            upload_file_id: Some(upload_file_id.into()),
        }
    }
}

/// Serializes attached files, `null` when none were given.
pub(crate) fn files_value(files: Option<&[InputFile]>) -> Result<Value, DifyError> {
    match files {
        Some(files) => serde_json::to_value(files)
            .map_err(|err| DifyError::validation(format!("failed to serialize files: {err}"))),
        None => Ok(Value::Null),
    }
}
