//! Deterministic text blob round trips
//!
//! The appliance transparently base64-encodes a stored text blob only when
//! it contains a multi-byte character, and its responses carry no flag
//! saying which form came back. To make round trips deterministic, every
//! blob written through this engine is prefixed with a fixed marker line
//! (which itself contains a multi-byte character, so the appliance is
//! always pushed onto its base64 path) and base64-encoded before sending.
//! On read, payloads matching the base64 shape are decoded and the marker
//! stripped; anything else is a pre-normalizer entry and passes through
//! as plain text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{ReconcileError, Result};

/// Marker line prepended to every written blob. The `ä` is deliberate:
/// it guarantees the stored blob contains a multi-byte character.
pub const CONTENT_MARKER: &str = "# appliance content m\u{e4}rker\n";

/// Terminator appended after the caller text. It carries no trailing
/// newline, so the CRLF the appliance appends to stored files stays
/// distinguishable from payload that itself ends in CRLF.
pub const CONTENT_TERMINATOR: &str = "\n# appliance content ende";

/// Encode caller text into the wire payload sent to the appliance
pub fn normalize(text: &str) -> String {
    STANDARD.encode(format!("{CONTENT_MARKER}{text}{CONTENT_TERMINATOR}"))
}

/// Decode a wire payload returned by the appliance back into caller text.
///
/// A payload matching the base64 shape that nevertheless fails to decode
/// is an [`ReconcileError::Encoding`] rather than being passed through,
/// so corrupted content is never silently accepted.
pub fn denormalize(payload: &str) -> Result<String> {
    if !looks_like_base64(payload) {
        return Ok(payload.to_string());
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ReconcileError::Encoding(e.to_string()))?;
    let text =
        String::from_utf8(bytes).map_err(|e| ReconcileError::Encoding(e.to_string()))?;

    let stripped = text.strip_prefix(CONTENT_MARKER).unwrap_or(&text);
    // The appliance appends a CRLF to stored files; strip it before the
    // terminator so payload-final CRLF survives the round trip. Entries
    // written without a terminator still lose a bare trailing CRLF, there
    // is no way to tell it from the appliance's.
    let stripped = stripped.strip_suffix("\r\n").unwrap_or(stripped);
    let stripped = stripped.strip_suffix(CONTENT_TERMINATOR).unwrap_or(stripped);
    Ok(stripped.to_string())
}

fn looks_like_base64(payload: &str) -> bool {
    if payload.is_empty() || payload.len() % 4 != 0 {
        return false;
    }

    let bytes = payload.as_bytes();
    let padding = bytes.iter().rev().take_while(|&&b| b == b'=').count();
    if padding > 2 {
        return false;
    }

    bytes[..bytes.len() - padding]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_empty() {
        assert_eq!(denormalize(&normalize("")).unwrap(), "");
    }

    #[test]
    fn test_round_trip_ascii() {
        assert_eq!(denormalize(&normalize("Data")).unwrap(), "Data");
    }

    #[test]
    fn test_round_trip_multibyte() {
        let text = "Universit\u{e4}t";
        assert_eq!(denormalize(&normalize(text)).unwrap(), text);
    }

    #[test]
    fn test_wire_payload_is_marker_text_terminator() {
        let expected = STANDARD.encode(format!("{CONTENT_MARKER}Data{CONTENT_TERMINATOR}"));
        assert_eq!(normalize("Data"), expected);
    }

    #[test]
    fn test_appliance_crlf_is_stripped() {
        let stored = STANDARD.encode(format!("{CONTENT_MARKER}Data{CONTENT_TERMINATOR}\r\n"));
        assert_eq!(denormalize(&stored).unwrap(), "Data");
    }

    #[test]
    fn test_payload_final_crlf_survives_round_trip() {
        let text = "line one\r\nline two\r\n";
        assert_eq!(denormalize(&normalize(text)).unwrap(), text);

        // Same payload after the appliance appends its own CRLF.
        let stored = STANDARD.encode(format!("{CONTENT_MARKER}{text}{CONTENT_TERMINATOR}\r\n"));
        assert_eq!(denormalize(&stored).unwrap(), text);
    }

    #[test]
    fn test_terminator_free_legacy_entry_loses_trailing_crlf() {
        // Entries written before the terminator existed.
        let stored = STANDARD.encode(format!("{CONTENT_MARKER}Data\r\n"));
        assert_eq!(denormalize(&stored).unwrap(), "Data");
    }

    #[test]
    fn test_plain_foreign_entry_passes_through() {
        // Written by another tool, never base64-encoded by the appliance.
        assert_eq!(
            denormalize("SecRule REQUEST_URI \"@streq /\" deny").unwrap(),
            "SecRule REQUEST_URI \"@streq /\" deny"
        );
    }

    #[test]
    fn test_foreign_base64_entry_is_decoded() {
        // Appliance-encoded multi-byte entry created outside this engine:
        // no marker line, but still base64.
        let stored = STANDARD.encode("fr\u{fc}h");
        assert_eq!(denormalize(&stored).unwrap(), "fr\u{fc}h");
    }

    #[test]
    fn test_invalid_utf8_is_an_encoding_error() {
        let stored = STANDARD.encode([0xff, 0xfe, 0x00, 0x01]);
        assert!(matches!(
            denormalize(&stored),
            Err(ReconcileError::Encoding(_))
        ));
    }
}
