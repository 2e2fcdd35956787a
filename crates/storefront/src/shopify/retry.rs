//! Failure classification and retry policy for Storefront API calls.
//!
//! Every query and mutation goes through [`run`], so no call site carries
//! its own retry loop. The decision itself ([`RetryPolicy::decide`]) is a
//! pure function of the operation kind, the failure class and the number of
//! failures so far; user-facing notices are derived separately in
//! [`crate::notify`].

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use super::ShopifyError;

/// Whether an operation reads or writes backend state.
///
/// Writes get a lower retry ceiling because repeating them can repeat side
/// effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
}

/// Failure classes, in the order they are evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// The request never completed (connect, timeout, broken body).
    Transport,
    /// The backend asked us to slow down.
    RateLimited {
        /// Seconds the backend asked us to wait, if it said.
        retry_after: Option<u64>,
    },
    /// The backend failed (5xx or equivalent).
    Server,
    /// The request itself was rejected (4xx or equivalent).
    Client,
    /// The backend accepted the request but refused it on business rules.
    BusinessRule(String),
    /// Anything else.
    Unclassified,
}

impl FailureClass {
    /// Classify a Storefront API error.
    #[must_use]
    pub fn of(error: &ShopifyError) -> Self {
        match error {
            ShopifyError::Http(e) => {
                if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
                    Self::Transport
                } else if let Some(status) = e.status() {
                    Self::from_status(status.as_u16())
                } else {
                    Self::Unclassified
                }
            }
            ShopifyError::RateLimited(secs) => Self::RateLimited {
                retry_after: Some(*secs),
            },
            ShopifyError::Status { status, .. } => Self::from_status(*status),
            ShopifyError::EmptyResponse(_) => Self::Server,
            ShopifyError::NotFound(_) => Self::Client,
            ShopifyError::UserError(message) => Self::BusinessRule(message.clone()),
            ShopifyError::GraphQL(errors) => {
                let codes: Vec<&str> = errors.iter().filter_map(|e| e.code.as_deref()).collect();
                if codes.contains(&"THROTTLED") {
                    Self::RateLimited { retry_after: None }
                } else if codes.contains(&"INTERNAL_SERVER_ERROR") {
                    Self::Server
                } else if codes.iter().any(|c| CLIENT_ERROR_CODES.contains(c)) {
                    Self::Client
                } else {
                    Self::Unclassified
                }
            }
            ShopifyError::Parse(_) => Self::Unclassified,
        }
    }

    const fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited { retry_after: None },
            500..=599 => Self::Server,
            400..=499 => Self::Client,
            _ => Self::Unclassified,
        }
    }

    /// Whether another attempt could change the outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Client | Self::BusinessRule(_))
    }
}

/// GraphQL `extensions.code` values that mean the request itself is wrong.
const CLIENT_ERROR_CODES: &[&str] = &[
    "BAD_REQUEST",
    "ACCESS_DENIED",
    "UNAUTHORIZED",
    "FORBIDDEN",
    "NOT_FOUND",
    "MAX_COST_EXCEEDED",
    "GRAPHQL_VALIDATION_FAILED",
];

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the delay, then try again.
    RetryAfter(Duration),
    /// Stop and surface the failure.
    GiveUp,
}

/// Exponential backoff bounded by per-kind retry ceilings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Retries allowed for queries (attempts = retries + 1).
    pub read_max_retries: u32,
    /// Retries allowed for mutations.
    pub write_max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            read_max_retries: 3,
            write_max_retries: 1,
        }
    }
}

impl RetryPolicy {
    /// Retry ceiling for an operation kind.
    #[must_use]
    pub const fn max_retries(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::Read => self.read_max_retries,
            OperationKind::Write => self.write_max_retries,
        }
    }

    /// Backoff before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1_u32 << exponent)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Decide whether to retry after `failures` failed attempts (1-based).
    #[must_use]
    pub fn decide(
        &self,
        kind: OperationKind,
        class: &FailureClass,
        failures: u32,
    ) -> RetryDecision {
        if !class.is_retryable() || failures > self.max_retries(kind) {
            return RetryDecision::GiveUp;
        }

        let mut delay = self.backoff(failures);
        if let FailureClass::RateLimited {
            retry_after: Some(secs),
        } = class
        {
            delay = delay.max(Duration::from_secs(*secs)).min(self.max_delay);
        }

        RetryDecision::RetryAfter(delay)
    }
}

/// Run `attempt` until it succeeds or the policy gives up.
///
/// Each retry is logged at `warn`; the terminal failure is logged once at
/// `error` (or `warn` for business-rule and client failures) and returned
/// unchanged.
///
/// # Errors
///
/// Returns the last error once the policy gives up.
pub async fn run<T, F, Fut>(
    policy: &RetryPolicy,
    kind: OperationKind,
    operation: &str,
    mut attempt: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    let mut failures = 0_u32;

    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        failures += 1;
        let class = FailureClass::of(&err);

        match policy.decide(kind, &class, failures) {
            RetryDecision::RetryAfter(delay) => {
                warn!(
                    operation,
                    attempt = failures,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    failure = ?class,
                    error = %err,
                    "Storefront API call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::GiveUp => {
                if class.is_retryable() {
                    error!(
                        operation,
                        attempts = failures,
                        failure = ?class,
                        error = %err,
                        "Storefront API call failed"
                    );
                } else {
                    warn!(
                        operation,
                        attempts = failures,
                        failure = ?class,
                        error = %err,
                        "Storefront API call rejected"
                    );
                }
                return Err(err);
            }
        }
    }
}
