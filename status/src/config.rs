use std::time::Duration;

use crate::error::{Result, StatusErr};

const MIN_RESET_DELAY: Duration = Duration::from_secs(2);
const MAX_RESET_DELAY: Duration = Duration::from_secs(5);

/// Tunables for the status loop.
#[derive(Debug, Clone)]
pub struct StatusConfig {
    reset_delay: Duration,
}

impl StatusConfig {
    /// Creates a configuration.
    ///
    /// # Args
    /// * `reset_delay` - How long the completed/interrupted state stays
    ///   visible before the indicator resets and hides itself.
    ///
    /// # Returns
    /// The configuration, or an error when the delay leaves the supported
    /// 2-5 second window.
    pub fn new(reset_delay: Duration) -> Result<Self> {
        if reset_delay < MIN_RESET_DELAY || reset_delay > MAX_RESET_DELAY {
            return Err(StatusErr::InvalidResetDelay { got: reset_delay });
        }
        Ok(Self { reset_delay })
    }

    pub fn reset_delay(&self) -> Duration {
        self.reset_delay
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            reset_delay: MIN_RESET_DELAY,
        }
    }
}
