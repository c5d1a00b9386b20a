//! Terminal outcomes of a retried operation

use thiserror::Error;

/// Why a retried operation gave up.
///
/// `E` is the underlying operation error; it is preserved verbatim so that
/// upstream classification (drift detection in particular) can inspect the
/// original failure.
#[derive(Error, Debug)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The classifier marked the failure permanent; no retry was attempted
    #[error("{0}")]
    Permanent(#[source] E),

    /// Every allowed attempt failed transiently
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },

    /// The caller's cancellation token fired before the operation completed
    #[error("operation cancelled before completion")]
    Cancelled,
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The underlying operation error, if the loop observed one
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Permanent(e) => Some(e),
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled => None,
        }
    }
}
