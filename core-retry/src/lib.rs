//! # Retry Policy
//!
//! Bounded exponential backoff around unreliable remote calls.
//!
//! ## Overview
//!
//! A [`RetryPolicy`] wraps a re-invocable async operation and an injected
//! error classifier. Failures the classifier marks [`ErrorClass::Transient`]
//! are retried with capped, jittered exponential backoff; anything else
//! returns immediately as [`RetryError::Permanent`]. The policy itself never
//! inspects errors, so backoff configuration is defined once and shared by
//! every call site.
//!
//! Cancellation is cooperative: a [`CancellationToken`] aborts further
//! attempts between calls (an in-flight call is never interrupted) and
//! surfaces as [`RetryError::Cancelled`], distinct from exhaustion.
//!
//! ## Usage
//!
//! ```ignore
//! let policy = RetryPolicy::default();
//! let value = policy
//!     .run(&cancel, classify, || async { remote_call().await })
//!     .await?;
//! ```

pub mod error;
pub mod policy;

pub use error::RetryError;
pub use policy::{ErrorClass, RetryConfig, RetryPolicy};

// Re-exported so callers do not need a direct tokio-util dependency just
// to hand a token in.
pub use tokio_util::sync::CancellationToken;
