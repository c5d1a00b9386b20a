//! Error type for appliance API calls

use thiserror::Error;

/// Errors reported by an [`ApplianceClient`](crate::ApplianceClient)
/// implementation.
///
/// The appliance reports failures as a numeric code plus a message string;
/// everything below the API layer (socket resets, truncated transfers,
/// TLS failures) is collapsed into `Transport`. The reconciliation core
/// consumes only these two shapes: `Api` feeds drift classification,
/// `Transport` feeds the retry classifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The appliance accepted the request and returned an error envelope
    #[error("appliance API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// The request never produced a valid envelope
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Convenience constructor for the API error envelope
    pub fn api(code: u16, message: impl Into<String>) -> Self {
        ClientError::Api {
            code,
            message: message.into(),
        }
    }
}

/// Result type for appliance client operations
pub type Result<T> = std::result::Result<T, ClientError>;
