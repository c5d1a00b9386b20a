//! Wire types for the appliance management API
//!
//! These mirror the envelopes the appliance returns. Optional fields stay
//! optional: the appliance omits attributes it considers defaulted, and the
//! reconcilers read server-filled values back rather than assuming them.

use serde::{Deserialize, Serialize};

/// Content rewrite rule families.
///
/// The appliance overloads a single "add rule" endpoint and distinguishes
/// the rule families with a numeric discriminant in the request. Responses
/// come back grouped per family, see [`RuleListResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MatchContent,
    AddHeader,
    DeleteHeader,
    ReplaceHeader,
    ModifyUrl,
    ReplaceBody,
}

impl RuleKind {
    /// Discriminant the "add rule" endpoint expects
    pub fn discriminant(self) -> &'static str {
        match self {
            RuleKind::MatchContent => "0",
            RuleKind::AddHeader => "1",
            RuleKind::DeleteHeader => "2",
            RuleKind::ReplaceHeader => "3",
            RuleKind::ModifyUrl => "4",
            RuleKind::ReplaceBody => "5",
        }
    }

    /// Stable resource-kind name, also used as registry key
    pub fn kind_name(self) -> &'static str {
        match self {
            RuleKind::MatchContent => "match_content_rule",
            RuleKind::AddHeader => "add_header_rule",
            RuleKind::DeleteHeader => "delete_header_rule",
            RuleKind::ReplaceHeader => "replace_header_rule",
            RuleKind::ModifyUrl => "modify_url_rule",
            RuleKind::ReplaceBody => "replace_body_rule",
        }
    }

    /// All rule families, in discriminant order
    pub const ALL: [RuleKind; 6] = [
        RuleKind::MatchContent,
        RuleKind::AddHeader,
        RuleKind::DeleteHeader,
        RuleKind::ReplaceHeader,
        RuleKind::ModifyUrl,
        RuleKind::ReplaceBody,
    ];
}

/// Generic success envelope (create/delete acknowledgements)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub code: u16,
    pub message: String,
}

/// Virtual service envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualServiceResponse {
    pub index: i32,
    pub address: String,
    /// The appliance reports ports as strings (port ranges are legal)
    pub port: String,
    pub protocol: String,
    #[serde(default)]
    pub nickname: String,
    pub enable: Option<bool>,
}

/// Mutable virtual service attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualServiceParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// Child index entry inside a sub virtual service envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubVsSummary {
    pub vs_index: i32,
}

/// Sub virtual service envelope
///
/// Returned both for the parent (with `sub_vs` populated) and for the
/// child itself (with `master_index` pointing at the parent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubVirtualServiceResponse {
    pub index: i32,
    #[serde(default)]
    pub master_index: i32,
    #[serde(default)]
    pub vs_type: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub sub_vs: Vec<SubVsSummary>,
}

/// Real server list envelope; the appliance answers every real server
/// operation with the full (filtered) collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealServerListResponse {
    #[serde(default)]
    pub rs: Vec<RealServerEntry>,
}

/// One real server as the appliance reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealServerEntry {
    pub rs_index: i32,
    pub vs_index: i32,
    pub addr: String,
    pub port: i32,
    pub weight: i32,
    #[serde(default)]
    pub forward: String,
    pub enable: Option<bool>,
    pub limit: i32,
    pub critical: Option<bool>,
    pub follow: i32,
    #[serde(default)]
    pub dns_name: String,
}

/// Mutable real server attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealServerParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<i32>,
}

/// Rule list envelope, grouped per rule family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleListResponse {
    #[serde(default)]
    pub match_content_rules: Vec<RuleEntry>,
    #[serde(default)]
    pub add_header_rules: Vec<RuleEntry>,
    #[serde(default)]
    pub delete_header_rules: Vec<RuleEntry>,
    #[serde(default)]
    pub replace_header_rules: Vec<RuleEntry>,
    #[serde(default)]
    pub modify_url_rules: Vec<RuleEntry>,
    #[serde(default)]
    pub replace_body_rules: Vec<RuleEntry>,
}

impl RuleListResponse {
    /// The collection holding rules of the given family
    pub fn rules_of(&self, kind: RuleKind) -> &[RuleEntry] {
        match kind {
            RuleKind::MatchContent => &self.match_content_rules,
            RuleKind::AddHeader => &self.add_header_rules,
            RuleKind::DeleteHeader => &self.delete_header_rules,
            RuleKind::ReplaceHeader => &self.replace_header_rules,
            RuleKind::ModifyUrl => &self.modify_url_rules,
            RuleKind::ReplaceBody => &self.replace_body_rules,
        }
    }
}

/// One content rewrite rule as the appliance reports it.
///
/// Which fields carry meaning depends on the rule family; the appliance
/// omits the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_on_flag: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_on_no_flag: Option<i32>,
}

/// Mutable rule attributes, shared across all rule families
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_on_flag: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_on_no_flag: Option<i32>,
}

/// Stored text blob envelope (WAF custom data / custom rules)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub data: String,
}

/// WAF rule attachment envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WafRuleResponse {
    pub rule: WafRuleEntry,
}

/// One attached WAF rule; `run_first` is reported as `"yes"` / `"no"`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WafRuleEntry {
    pub name: String,
    #[serde(default)]
    pub run_first: String,
}
