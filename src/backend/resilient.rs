//! Backend call with local fallback.
//!
//! Every tool follows the same policy: try the backend once, and on any error
//! (no key, network, quota, unparseable reply) substitute a deterministic local
//! result. There is no retry.

use crate::error::Result;
use std::future::Future;
use tracing::{debug, warn};

/// Where a generated value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Backend,
    Fallback,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Backend => write!(f, "AI backend"),
            Origin::Fallback => write!(f, "local generator"),
        }
    }
}

/// A value together with its origin.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Generated<T> {
    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

/// Run `primary`; if it fails, log the cause and return `fallback()` instead.
pub async fn resilient<T, Fut, F>(operation: &str, primary: Fut, fallback: F) -> Generated<T>
where
    Fut: Future<Output = Result<T>>,
    F: FnOnce() -> T,
{
    match primary.await {
        Ok(value) => {
            debug!(operation, "backend result accepted");
            Generated {
                value,
                origin: Origin::Backend,
            }
        }
        Err(e) => {
            warn!(operation, error = %e, "falling back to local generation");
            Generated {
                value: fallback(),
                origin: Origin::Fallback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyBoxError;

    #[tokio::test]
    async fn test_primary_success() {
        let result = resilient("test", async { Ok(42) }, || 0).await;
        assert_eq!(result.value, 42);
        assert_eq!(result.origin, Origin::Backend);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback() {
        let result = resilient(
            "test",
            async { Err::<i32, _>(StudyBoxError::Backend("quota exceeded".to_string())) },
            || 7,
        )
        .await;
        assert_eq!(result.value, 7);
        assert!(result.is_fallback());
    }
}
