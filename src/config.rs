//! Configuration for the demo harness binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DemoConfig {
    /// Number of consumers the fan-out run dispatches across.
    pub consumers: usize,
    /// Bounded queue capacity of each consumer.
    pub queue_capacity: usize,
    /// How many string items the fan-out run dispatches.
    pub items: usize,
    /// How long the single-consumer run processes before it is interrupted.
    #[serde(with = "humantime_serde")]
    pub run_for: Duration,
    /// Whether queued items are still processed after an interrupt.
    pub drain_on_shutdown: bool,
}

impl DemoConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde
    /// defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.consumers >= 1, "consumers must be at least 1");
        ensure!(self.queue_capacity >= 1, "queue-capacity must be at least 1");
        ensure!(self.items >= 1, "items must be at least 1");
        Ok(self)
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            consumers: 5,
            queue_capacity: 3,
            items: 50,
            run_for: Duration::from_millis(3),
            drain_on_shutdown: true,
        }
    }
}
