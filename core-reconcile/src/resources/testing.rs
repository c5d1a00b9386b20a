//! Shared test helpers for the resource reconcilers

use std::time::Duration;

use client_traits::StatusResponse;
use core_retry::{RetryConfig, RetryPolicy};

pub(crate) use client_traits::mocks::MockApplianceClient as MockClient;

/// Retry policy with millisecond delays so paused-clock tests stay fast
pub fn test_retry() -> RetryPolicy {
    RetryPolicy::new(RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        multiplier: 2.0,
        max_elapsed: None,
    })
}

pub fn ok_status() -> StatusResponse {
    StatusResponse {
        code: 200,
        message: "ok".to_string(),
    }
}
