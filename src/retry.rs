use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::error::{classify, GatewayError};
use crate::throttle::Throttle;
use crate::upstream::{ChatBackend, UpstreamError};
use crate::web::models::Message;

pub const MAX_ATTEMPTS: u32 = 4;
pub const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Runs one upstream exchange to completion: up to `MAX_ATTEMPTS` attempts,
/// each gated by the shared throttle, with linear backoff between attempts.
///
/// Only a rate-limited response is treated as transient. Every other failure
/// is assumed durable within a single user-facing call and is classified and
/// surfaced immediately rather than masked by retries.
pub async fn run(
    throttle: &Throttle,
    backend: &dyn ChatBackend,
    messages: &[Message],
    temperature: f32,
) -> Result<String, GatewayError> {
    for attempt in 1..=MAX_ATTEMPTS {
        throttle.acquire().await;
        match backend.complete(messages, temperature).await {
            Ok(text) => {
                if attempt > 1 {
                    debug!("Upstream call succeeded on attempt {attempt}");
                }
                return Ok(text.trim().to_string());
            }
            Err(UpstreamError::RateLimited) if attempt < MAX_ATTEMPTS => {
                let delay = BACKOFF_STEP * attempt;
                debug!("Upstream rate-limited on attempt {attempt}, retrying in {delay:?}");
                sleep(delay).await;
            }
            Err(UpstreamError::RateLimited) => {
                warn!("Upstream rate limit persisted across {MAX_ATTEMPTS} attempts, giving up");
                return Err(GatewayError::RateLimitExceeded);
            }
            Err(failure) => return Err(classify(failure)),
        }
    }
    // Unreachable with MAX_ATTEMPTS >= 1; kept as the exhaustion outcome.
    Err(GatewayError::RateLimitExceeded)
}
