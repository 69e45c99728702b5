//! CLI argument parsing
//!
//! Every flag is optional; without any the tool behaves like the plain
//! interactive menu with the stock capture settings.

use clap::Parser;

use crate::capture::{DEFAULT_READ_TIMEOUT_MS, DEFAULT_SNAPLEN};

#[derive(Parser, Debug)]
#[command(name = "pktstat")]
#[command(version, about = "Interactive live packet capture and statistics", long_about = None)]
pub struct Cli {
    /// Snapshot length: maximum bytes kept per packet
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_SNAPLEN,
        value_parser = clap::value_parser!(i32).range(1..)
    )]
    pub snaplen: i32,

    /// Do not put the interface into promiscuous mode
    #[arg(long)]
    pub no_promisc: bool,

    /// libpcap read timeout; bounds how fast a stopped capture is released.
    /// Must be positive: libpcap reads 0 as "block forever".
    #[arg(
        long,
        value_name = "MS",
        default_value_t = DEFAULT_READ_TIMEOUT_MS,
        value_parser = clap::value_parser!(i32).range(1..)
    )]
    pub read_timeout_ms: i32,

    /// Deadline for the statistics mode, in seconds
    #[arg(short, long, value_name = "SECS", default_value_t = 5)]
    pub deadline_secs: u64,

    /// Stop the streaming modes after this many packets
    #[arg(short = 'c', long, value_name = "N")]
    pub count: Option<u64>,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter implied by the `-v` count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
