use std::future::Future;
use std::time::Duration;

use domain::DomainError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upper bound for a single call into a collaborator or the latency store.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// End-to-end budget of one inbound request, shared by all of its sub-calls.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);

/// Deadline and cancellation scope of one inbound request.
///
/// Every remote call made on behalf of the request goes through [`CallContext::call`],
/// which bounds it by the per-call timeout and by whatever is left of the
/// request deadline, and aborts it once the token is cancelled.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Instant,
    per_call_timeout: Duration,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new(request_deadline: Duration, per_call_timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + request_deadline,
            per_call_timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Run one remote operation inside this context.
    pub async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(DomainError::Cancelled(format!("{operation}: request cancelled")));
        }

        let budget = self.per_call_timeout.min(self.remaining());
        if budget.is_zero() {
            return Err(DomainError::unavailable(format!(
                "{operation}: request deadline exceeded"
            )));
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(DomainError::Cancelled(format!("{operation}: request cancelled")))
            }
            result = tokio::time::timeout(budget, fut) => match result {
                Ok(inner) => inner,
                Err(_) => Err(DomainError::unavailable(format!(
                    "{operation}: timed out after {}ms",
                    budget.as_millis()
                ))),
            },
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DEADLINE, DEFAULT_CALL_TIMEOUT)
    }
}
