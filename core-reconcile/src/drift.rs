//! Recognition of "entity no longer exists remotely" error signatures
//!
//! The appliance is inconsistent across endpoint families in how it reports
//! a missing entity, so each resource kind consults its own table. A match
//! on Read heals silently into absence; Delete never consults these tables
//! (a failed delete always surfaces, to avoid orphaning remote state).

use client_traits::ClientError;
use core_retry::RetryError;

/// One known "entity absent" signature: an exact message, a specific
/// numeric code, or both.
#[derive(Debug, Clone, Copy)]
pub struct AbsenceSignature {
    pub code: Option<u16>,
    pub message: Option<&'static str>,
}

/// Per-resource-kind table of absence signatures
#[derive(Debug, Clone, Copy)]
pub struct AbsenceTable {
    signatures: &'static [AbsenceSignature],
}

impl AbsenceTable {
    pub const fn new(signatures: &'static [AbsenceSignature]) -> Self {
        Self { signatures }
    }

    /// Does this API error envelope mean the entity is gone?
    pub fn matches(&self, error: &ClientError) -> bool {
        let ClientError::Api { code, message } = error else {
            return false;
        };
        self.signatures.iter().any(|sig| {
            sig.code.map_or(true, |c| c == *code)
                && sig.message.map_or(true, |m| m == message)
        })
    }

    /// Same check against a terminal retry outcome. Only permanent
    /// failures can mean absence; exhaustion and cancellation never do.
    pub fn matches_retry(&self, error: &RetryError<ClientError>) -> bool {
        matches!(error, RetryError::Permanent(e) if self.matches(e))
    }
}

/// Virtual services report absence as code 422 with "Unknown VS"
pub const VIRTUAL_SERVICE_ABSENT: AbsenceTable = AbsenceTable::new(&[AbsenceSignature {
    code: Some(422),
    message: Some("Unknown VS"),
}]);

/// Sub virtual services report the message without a stable code
pub const SUB_VIRTUAL_SERVICE_ABSENT: AbsenceTable = AbsenceTable::new(&[AbsenceSignature {
    code: None,
    message: Some("Unknown VS"),
}]);

/// A real server under a vanished parent reports the parent's absence
pub const REAL_SERVER_ABSENT: AbsenceTable = AbsenceTable::new(&[AbsenceSignature {
    code: None,
    message: Some("Unknown VS"),
}]);

/// Content rewrite rules and WAF rule attachments
pub const RULE_ABSENT: AbsenceTable = AbsenceTable::new(&[AbsenceSignature {
    code: None,
    message: Some("Rule not found"),
}]);

/// WAF blobs report plain 404, message text varies by firmware
pub const BLOB_ABSENT: AbsenceTable = AbsenceTable::new(&[AbsenceSignature {
    code: Some(404),
    message: None,
}]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_code_and_message_match() {
        assert!(VIRTUAL_SERVICE_ABSENT.matches(&ClientError::api(422, "Unknown VS")));
        assert!(!VIRTUAL_SERVICE_ABSENT.matches(&ClientError::api(500, "Unknown VS")));
        assert!(!VIRTUAL_SERVICE_ABSENT.matches(&ClientError::api(422, "Invalid parameters")));
    }

    #[test]
    fn test_message_only_match_ignores_code() {
        assert!(RULE_ABSENT.matches(&ClientError::api(422, "Rule not found")));
        assert!(RULE_ABSENT.matches(&ClientError::api(404, "Rule not found")));
        assert!(!RULE_ABSENT.matches(&ClientError::api(404, "Rule missing")));
    }

    #[test]
    fn test_code_only_match_ignores_message() {
        assert!(BLOB_ABSENT.matches(&ClientError::api(404, "No such file")));
        assert!(BLOB_ABSENT.matches(&ClientError::api(404, "not found")));
        assert!(!BLOB_ABSENT.matches(&ClientError::api(500, "No such file")));
    }

    #[test]
    fn test_transport_errors_never_mean_absence() {
        assert!(!RULE_ABSENT.matches(&ClientError::Transport("Rule not found".to_string())));
    }

    #[test]
    fn test_only_permanent_retry_outcomes_mean_absence() {
        let gone = ClientError::api(422, "Unknown VS");
        assert!(VIRTUAL_SERVICE_ABSENT.matches_retry(&RetryError::Permanent(gone.clone())));
        assert!(!VIRTUAL_SERVICE_ABSENT.matches_retry(&RetryError::Exhausted {
            attempts: 5,
            last: gone,
        }));
        assert!(!VIRTUAL_SERVICE_ABSENT.matches_retry(&RetryError::Cancelled));
    }
}
