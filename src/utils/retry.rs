// Retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Run `operation` up to `max_attempts` times, doubling `base_delay` between
/// attempts (capped at 32x). Errors rejected by `should_retry` are returned
/// at once; otherwise the last error is returned.
pub async fn with_retry<F, Fut, T, E, R>(
    mut operation: F,
    max_attempts: u32,
    base_delay: Duration,
    should_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                attempt += 1;
                if attempt >= max_attempts.max(1) || !should_retry(&error) {
                    return Err(error);
                }

                let delay = base_delay * 2u32.pow((attempt - 1).min(5));
                debug!(attempt, error = %error, delay_ms = delay.as_millis() as u64, "Retrying");
                sleep(delay).await;
            }
        }
    }
}
