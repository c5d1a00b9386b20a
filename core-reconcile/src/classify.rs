//! Transient-vs-permanent classification of appliance client errors

use client_traits::ClientError;
use core_retry::ErrorClass;

/// Transport failure signatures observed when the appliance resets or
/// truncates a transfer mid-response. These resolve themselves on retry.
const TRANSIENT_SIGNATURES: [&str; 3] = ["EOF", "connection reset", "broken pipe"];

/// The single classifier injected into every retry call site.
///
/// API error envelopes are always permanent here; whether one of them
/// means "entity gone" is decided later by the drift tables, never by
/// the retry loop.
pub fn classify_client_error(error: &ClientError) -> ErrorClass {
    match error {
        ClientError::Transport(message)
            if TRANSIENT_SIGNATURES.iter().any(|sig| message.contains(sig)) =>
        {
            ErrorClass::Transient
        }
        _ => ErrorClass::Permanent,
    }
}
