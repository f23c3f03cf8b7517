use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Enforces a minimum interval between successive requests.
///
/// Used to pace paginated backfills so a caller draining history in a tight
/// loop stays under the exchange's public rate limit.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until at least `interval` has passed since the previous call.
    /// The first call never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let next = last + self.interval;
            let now = Instant::now();
            if next > now {
                debug!(delay_ms = (next - now).as_millis() as u64, "Pacing request");
                sleep_until(next).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
