//! Configuration
//!
//! - [`EngineConfig`] - runtime knobs of the sync engine (feed capacity,
//!   chart window, event buffers)
//! - [`Preferences`] - user preferences persisted as JSON under `~/.lifeos/`

mod preferences;

pub use preferences::{default_preferences_path, ConfigError, Preferences, PREFERENCES_PATH_ENV};

use crate::db::PushChannel;
use crate::models::Record;
use serde::{Deserialize, Serialize};

/// Upper bound for the event broadcast buffer
const MAX_EVENT_BUFFER: usize = 4096;

/// Runtime configuration of the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of notifications kept by the realtime feed
    pub feed_capacity: usize,

    /// Number of most recent transactions plotted by the balance chart
    pub chart_window: usize,

    /// Buffer of each store's event broadcast channel
    pub event_buffer: usize,

    /// Buffer of each push channel subscription
    pub push_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_capacity: 20,
            chart_window: 30,
            event_buffer: 64,
            push_buffer: 64,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_capacity == 0 {
            return Err(ConfigError::invalid("feed_capacity must be greater than 0"));
        }

        if self.chart_window == 0 {
            return Err(ConfigError::invalid("chart_window must be greater than 0"));
        }

        if self.event_buffer == 0 || self.event_buffer > MAX_EVENT_BUFFER {
            return Err(ConfigError::invalid(format!(
                "event_buffer must be between 1 and {}",
                MAX_EVENT_BUFFER
            )));
        }

        if self.push_buffer == 0 {
            return Err(ConfigError::invalid("push_buffer must be greater than 0"));
        }

        Ok(())
    }

    /// Create a push channel sized with `push_buffer`
    pub fn push_channel<R: Record>(&self) -> PushChannel<R> {
        PushChannel::new(self.push_buffer)
    }
}
