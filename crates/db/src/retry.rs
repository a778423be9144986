//! Bounded retry for transient database errors.
//!
//! Pooled connections that outlive a server-side restart or a pgbouncer
//! handoff surface a specific class of error: the prepared statement the
//! driver cached no longer exists on the backend. Those calls succeed when
//! simply re-executed on a fresh connection, so [`run_with_retry`] retries
//! them with exponential backoff. Anything else (constraint violations,
//! row-not-found, bad SQL) is returned to the caller untouched on the first
//! failure.

use std::time::Duration;

/// SQLSTATE codes treated as transient: connection-exception family,
/// `invalid_sql_statement_name` (stale prepared statement), and
/// `admin_shutdown`.
const TRANSIENT_SQLSTATES: [&str; 5] = ["08000", "08003", "08006", "26000", "57P01"];

/// Message substrings that mark a stale statement or dead connection when
/// the driver reports no SQLSTATE.
const TRANSIENT_MARKERS: [&str; 3] = [
    "prepared statement",
    "cached plan must not change result type",
    "connection closed",
];

/// Tunable parameters for the retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the initial call (default: 3).
    pub budget: u32,
    /// Delay before the first retry (default: 500 ms).
    pub base_delay: Duration,
    /// Factor by which the delay grows after each retry.
    pub multiplier: f64,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            budget: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Classify an error as transient (retryable) or not.
///
/// Transient: the connection-exception SQLSTATE family, a stale prepared
/// statement, pool acquire timeout, or an I/O failure mid-call. Everything
/// else -- including every constraint violation and `RowNotFound` -- is
/// permanent.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                if TRANSIENT_SQLSTATES.contains(&code.as_ref()) {
                    return true;
                }
            }
            let message = db_err.message();
            TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
        }
        sqlx::Error::Protocol(message) => TRANSIENT_MARKERS.iter().any(|m| message.contains(m)),
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Io(_) => true,
        _ => false,
    }
}

/// Execute `op`, retrying transient failures under `config`.
///
/// - Success: `Ok(Some(value))`.
/// - Transient failure with retries remaining: sleep the current backoff
///   delay (doubling each retry) and re-execute.
/// - Transient failure with the budget exhausted: `Ok(None)`. The caller
///   decides what "could not complete" means (the [`crate::Db`] handle
///   rebuilds the pool and hands the `None` through).
/// - Non-transient failure: `Err` immediately, zero retries.
pub async fn run_with_retry<T, F, Fut>(config: &RetryConfig, op: F) -> Result<Option<T>, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let mut delay = config.base_delay;
    let mut retries: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(Some(value)),
            Err(e) if is_transient(&e) => {
                if retries >= config.budget {
                    tracing::warn!(
                        error = %e,
                        attempts = retries + 1,
                        "Transient database error persisted past retry budget"
                    );
                    return Ok(None);
                }
                retries += 1;
                tracing::warn!(
                    error = %e,
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "Transient database error, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, config);
            }
            Err(e) => return Err(e),
        }
    }
}
