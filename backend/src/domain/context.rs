//! Request-scoped cancellation and deadline.
//!
//! The request-handling layer owns timeouts. It hands every service call a
//! [`RequestContext`]; services refuse to start store work on a context that
//! is already cancelled or past its deadline, and abandon in-flight work when
//! either fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::Error;

/// Cancellation token plus optional deadline for one logical request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context with no deadline that is cancelled only through
    /// [`RequestContext::cancel`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an existing cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel the request.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the request was cancelled or ran out of time.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Fail fast when the request is already done.
    pub fn ensure_active(&self) -> Result<(), Error> {
        if self.token.is_cancelled() {
            return Err(Error::cancelled("request cancelled"));
        }
        if self.deadline.is_some_and(|at| Instant::now() >= at) {
            return Err(Error::cancelled("request deadline exceeded"));
        }
        Ok(())
    }

    /// Run `work` unless the request is done, abandoning it if cancellation
    /// or the deadline fires first.
    pub async fn run<T, F>(&self, work: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        self.ensure_active()?;
        let expiry = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Error::cancelled("request cancelled")),
            () = expiry => Err(Error::cancelled("request deadline exceeded")),
            result = work => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[rstest]
    #[tokio::test]
    async fn cancelled_context_never_polls_work() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let touched = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&touched);

        let result = ctx
            .run(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(result.expect_err("cancelled").code(), ErrorCode::Cancelled);
        assert!(!touched.load(Ordering::SeqCst));
    }

    #[rstest]
    #[tokio::test]
    async fn expired_deadline_is_rejected_up_front() {
        let ctx = RequestContext::new().with_deadline(Instant::now());
        let err = ctx.ensure_active().expect_err("deadline passed");

        assert_eq!(err.code(), ErrorCode::Cancelled);
        assert!(ctx.is_done());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_slow_work() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));

        let result: Result<(), Error> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert_eq!(result.expect_err("timed out").code(), ErrorCode::Cancelled);
    }

    #[rstest]
    #[tokio::test]
    async fn live_context_returns_work_result() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(30));
        let value = ctx.run(async { Ok(7) }).await.expect("completes");
        assert_eq!(value, 7);
    }

    #[rstest]
    fn cancelling_parent_cancels_child() {
        let parent = RequestContext::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_done());
    }
}
