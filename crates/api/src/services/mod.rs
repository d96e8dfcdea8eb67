//! Group session services.

pub mod lifecycle;
pub mod locks;
pub mod session;

pub use lifecycle::GroupLifecycle;
pub use locks::EntityLocks;
pub use session::SessionCoordinator;

use std::future::Future;

use persistence::StoreError;
use thiserror::Error;

/// Errors raised while handling a session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing or expired group, or missing member.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every join code of the prefix is held by a live group.
    #[error("no free join code after {0} attempts")]
    Exhausted(u32),
}

impl SessionError {
    pub(crate) fn group_not_found() -> Self {
        SessionError::NotFound("Group not found".to_string())
    }

    pub(crate) fn member_not_found() -> Self {
        SessionError::NotFound("Member not found".to_string())
    }
}

/// Runs a store read, retrying once if the first attempt failed with a
/// transient error. Only for idempotent reads.
pub(crate) async fn retry_read<T, F, Fut>(operation: &'static str, mut read: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match read().await {
        Err(err) if err.is_transient() => {
            tracing::warn!(operation, error = %err, "Transient store failure, retrying read");
            read().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        assert_eq!(SessionError::group_not_found().to_string(), "Group not found");
        assert_eq!(
            SessionError::Exhausted(100).to_string(),
            "no free join code after 100 attempts"
        );
        let err: SessionError = StoreError::Unavailable("down".into()).into();
        assert_eq!(err.to_string(), "store unavailable: down");
    }

    #[tokio::test]
    async fn test_retry_read_retries_transient_once() {
        let mut calls = 0;
        let result = retry_read("test", || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt == 1 {
                    Err(StoreError::Unavailable("blip".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_retry_read_gives_up_after_second_failure() {
        let mut calls = 0;
        let result: Result<(), _> = retry_read("test", || {
            calls += 1;
            async { Err(StoreError::Unavailable("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_retry_read_does_not_retry_permanent_errors() {
        let mut calls = 0;
        let result: Result<(), _> = retry_read("test", || {
            calls += 1;
            async { Err(StoreError::DuplicateCode("GRT-1000".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
