//! # Appliance Client Traits
//!
//! Typed surface of the load balancer management API.
//!
//! ## Overview
//!
//! The reconciliation core never talks to the appliance directly; it is
//! handed an implementation of [`ApplianceClient`] at construction time.
//! This crate defines:
//!
//! - The [`ApplianceClient`] trait: one typed call pair per entity family
//!   (virtual services, sub virtual services, real servers, content rules,
//!   WAF blobs and attachments)
//! - The wire envelopes the appliance returns, as plain serde types
//! - The typed error (`code` + `message`) the appliance reports, plus a
//!   transport variant for failures below the API layer
//!
//! Transport, authentication and session handling live in the concrete
//! client implementation, outside this workspace.
//!
//! The `mocks` feature ships a ready-made
//! [`MockApplianceClient`](mocks::MockApplianceClient) so downstream test
//! suites do not each maintain their own `mock!` of the trait.

pub mod api;
pub mod error;
#[cfg(feature = "mocks")]
pub mod mocks;
pub mod types;

pub use api::ApplianceClient;
pub use error::{ClientError, Result};
pub use types::{
    ContentResponse, RealServerEntry, RealServerListResponse, RealServerParameters, RuleEntry,
    RuleKind, RuleListResponse, RuleParameters, StatusResponse, SubVirtualServiceResponse,
    SubVsSummary, VirtualServiceParameters, VirtualServiceResponse, WafRuleEntry, WafRuleResponse,
};
