use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive bounds, in whole seconds, of the jitter applied before moving to
/// the next result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayWindow {
    pub min_secs: u32,
    pub max_secs: u32,
}

impl DelayWindow {
    /// Bounds are swapped when given in the wrong order.
    pub fn new(min_secs: u32, max_secs: u32) -> Self {
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs: min_secs.max(max_secs),
        }
    }

    /// Draws a whole number of seconds uniformly from `[min_secs, max_secs]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = rng.random_range(self.min_secs..=self.max_secs);
        Duration::from_millis(u64::from(secs) * 1000)
    }
}

impl Default for DelayWindow {
    fn default() -> Self {
        Self::new(3, 5)
    }
}
