//! Replanning configuration.

use chrono::Duration;

use crate::domain::MISSED_CONNECTION_BUFFER;

/// Configuration parameters for replanning after a missed connection.
#[derive(Debug, Clone)]
pub struct ReplanConfig {
    /// Minutes added to the missed departure before searching again.
    pub buffer_mins: i64,

    /// Whether cancelled candidates are passed over when picking the next
    /// connection automatically.
    pub skip_cancelled: bool,
}

impl ReplanConfig {
    /// Set the search buffer.
    pub fn with_buffer_mins(mut self, mins: i64) -> Self {
        self.buffer_mins = mins;
        self
    }

    /// Set whether cancelled candidates are skipped.
    pub fn with_skip_cancelled(mut self, skip: bool) -> Self {
        self.skip_cancelled = skip;
        self
    }

    /// Returns the search buffer as a Duration.
    pub fn buffer(&self) -> Duration {
        Duration::minutes(self.buffer_mins)
    }
}

impl Default for ReplanConfig {
    fn default() -> Self {
        Self {
            buffer_mins: MISSED_CONNECTION_BUFFER.num_minutes(),
            skip_cancelled: true,
        }
    }
}
