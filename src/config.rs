//! Runtime settings for the interactive tool.

use std::time::Duration;

use crate::capture::CaptureConfig;
use crate::cli::Cli;
use crate::session::DEFAULT_DEADLINE;

/// Settings the menu runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub capture: CaptureConfig,
    /// Deadline of the statistics mode
    pub deadline: Duration,
    /// Packet limit of the streaming modes; `None` runs until interrupted
    pub max_packets: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            deadline: DEFAULT_DEADLINE,
            max_packets: None,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            capture: CaptureConfig {
                snaplen: cli.snaplen,
                promiscuous: !cli.no_promisc,
                read_timeout_ms: cli.read_timeout_ms,
                ..CaptureConfig::default()
            },
            deadline: Duration::from_secs(cli.deadline_secs),
            max_packets: cli.count,
        }
    }
}
