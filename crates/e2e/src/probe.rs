//! Reachability check for the application under test

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Upper bound for a single probe request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `url` until it answers with a success status or `timeout` elapses.
/// A request never outlives the overall deadline.
pub async fn probe_target(url: &str, timeout: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder().build()?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        let remaining = timeout
            .saturating_sub(start.elapsed())
            .clamp(Duration::from_millis(1), REQUEST_TIMEOUT);

        match client.get(url).timeout(remaining).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Target {} reachable after {} attempt(s)", url, attempts);
                return Ok(());
            }
            Ok(resp) => {
                warn!("Probe of {} returned {}", url, resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} to answer...", url);
                }
                if !e.is_connect() {
                    warn!("Probe error: {}", e);
                }
            }
        }

        if start.elapsed() >= timeout {
            return Err(E2eError::TargetUnreachable {
                url: url.to_string(),
                attempts,
            });
        }
        sleep(Duration::from_millis(100)).await;
    }
}
