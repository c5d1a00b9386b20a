//! # Reconciliation Core
//!
//! Maps declarative resource descriptions onto imperative calls against the
//! appliance management API.
//!
//! ## Overview
//!
//! Each resource kind gets one reconciler implementing the [`Reconcile`]
//! trait (Create / Read / Update / Delete / Import). Reconcilers compose the
//! shared building blocks:
//!
//! - **Retry** (`core-retry`): every remote call runs under one
//!   [`RetryPolicy`](core_retry::RetryPolicy) with the transient-vs-permanent
//!   classifier from [`classify`]
//! - **Addressing** (`address`): flat names and scoped (parent, child) index
//!   pairs, including the `!` exact-index sigil the appliance expects
//! - **Content normalization** (`content`): the marker-plus-base64 scheme
//!   that makes text blob round trips deterministic
//! - **Drift detection** (`drift`): per-kind tables of "entity no longer
//!   exists" error signatures, converted into [`Outcome::Absent`] on Read
//!
//! The [`ReconcilerRegistry`] exposes the whole catalog behind a type-erased
//! trait keyed by resource-kind name, moving attribute sets as JSON values;
//! [`standard_registry`] wires up every kind against an injected
//! [`ApplianceClient`](client_traits::ApplianceClient) handle.

pub mod address;
pub mod attr;
pub mod classify;
pub mod content;
pub mod drift;
pub mod error;
pub mod reconciler;
pub mod resources;

pub use address::ScopedId;
pub use attr::Attr;
pub use error::{Op, ReconcileError, Result};
pub use reconciler::{
    standard_registry, ErasedReconcile, Outcome, Reconcile, ReconcilerRegistry,
};
pub use resources::blob::{BlobFamily, ContentBlobDesired, ContentBlobReconciler, ContentBlobState};
pub use resources::real_server::{RealServerDesired, RealServerReconciler, RealServerState};
pub use resources::rewrite_rule::{RewriteRuleDesired, RewriteRuleReconciler, RewriteRuleState};
pub use resources::sub_virtual_service::{
    SubVirtualServiceDesired, SubVirtualServiceReconciler, SubVirtualServiceState,
};
pub use resources::virtual_service::{
    RestartOutcome, VirtualServiceDesired, VirtualServiceReconciler, VirtualServiceState,
};
pub use resources::waf_attachment::{
    WafAttachmentDesired, WafAttachmentReconciler, WafAttachmentState,
};
