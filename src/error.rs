use thiserror::Error;

/// Failure modes surfaced by the Dify client.
///
/// The client never inspects HTTP status codes, so a `4xx`/`5xx` answer is not an
/// error here: it comes back as an ordinary [`crate::DifyResponse`]. Only failures
/// that prevent a request from being built or exchanged are reported.
#[derive(Debug, Error)]
pub enum DifyError {
    /// Represents transport-layer or networking failures.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Signals that a request could not be encoded locally.
    #[error("invalid request: {message}")]
    Validation { message: String },
    /// A response arrived but its body could not be decoded as asked.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
    /// Raised when building a client from configuration fails.
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Name of the configuration field that failed validation.
        field: String,
        /// Additional context explaining why the field is invalid.
        reason: String,
    },
}

impl DifyError {
    /// Creates a [`DifyError::Transport`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use dify_client::error::DifyError;
    ///
    /// let err = DifyError::transport("dns lookup failed");
    /// assert!(matches!(err, DifyError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a [`DifyError::Validation`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use dify_client::error::DifyError;
    ///
    /// let err = DifyError::validation("bad mime type");
    /// assert_eq!(err.to_string(), "invalid request: bad mime type");
    /// ```
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a [`DifyError::Decode`] from a textual description.
    pub fn decode<T: Into<String>>(message: T) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a [`DifyError::InvalidConfig`] for the named field.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for network-level failures: connecting, TLS, timeouts, or the
    /// connection dropping while the body is read.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
