//! Per-resource-kind reconcilers
//!
//! Each module owns one resource kind's desired-config and recorded-state
//! types plus its [`Reconcile`](crate::Reconcile) implementation. The six
//! content rewrite rule families share one reconciler parameterized by
//! [`RuleKind`](client_traits::RuleKind), and the two WAF blob kinds share
//! one parameterized by [`BlobFamily`](blob::BlobFamily).

pub mod blob;
pub mod real_server;
pub mod rewrite_rule;
pub mod sub_virtual_service;
pub mod virtual_service;
pub mod waf_attachment;

#[cfg(test)]
pub(crate) mod testing;
