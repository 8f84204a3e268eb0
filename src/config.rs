//! Configuration types for zipwatch

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Watch-and-extract configuration
///
/// Controls where the recursive filesystem watch is rooted, which candidate
/// paths are excluded, and the cadence of the batching worker. The defaults
/// reproduce the reference behavior: poll every 100ms, drain after every 5
/// poll attempts, pause 250ms after a drain that did any work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory tree to watch for new zip archives (default: ".")
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Exclusion patterns, matched as regexes anywhere in the full candidate path
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Interval between queue poll attempts (default: 100ms)
    #[serde(default = "default_poll_interval", with = "duration_millis_serde")]
    pub poll_interval: Duration,

    /// Number of poll attempts per collect window (default: 5)
    #[serde(default = "default_polls_per_batch")]
    pub polls_per_batch: u32,

    /// Pause after a drain pass that extracted anything (default: 250ms)
    #[serde(default = "default_drain_pause", with = "duration_millis_serde")]
    pub drain_pause: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: Vec::new(),
            poll_interval: default_poll_interval(),
            polls_per_batch: default_polls_per_batch(),
            drain_pause: default_drain_pause(),
        }
    }
}

impl WatchConfig {
    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.polls_per_batch == 0 {
            return Err(crate::error::Error::Config {
                message: "polls_per_batch must be at least 1".to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(crate::error::Error::Config {
                message: "poll_interval must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_polls_per_batch() -> u32 {
    5
}

fn default_drain_pause() -> Duration {
    Duration::from_millis(250)
}

/// Serialize/deserialize Duration as integer milliseconds
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
