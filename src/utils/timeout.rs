//! Timeout constants and helpers.

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Default bound on connecting and on each socket write
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long `authenticate` waits for an AUTH_RESPONSE
pub const AUTH_TIMEOUT: Duration = Duration::from_millis(5000);

/// Run `future` with a deadline, mapping expiry to `ProtocolError::Timeout`
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    with_timeout_error(duration, future, || ProtocolError::Timeout).await
}

/// Run `future` with a deadline, building the expiry error with `on_timeout`
pub async fn with_timeout_error<F, T, E>(duration: Duration, future: F, on_timeout: E) -> Result<T>
where
    F: Future<Output = Result<T>>,
    E: FnOnce() -> ProtocolError,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
