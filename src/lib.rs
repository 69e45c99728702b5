//! Live packet capture with per-packet output and bounded statistics.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use pktstat::{CaptureConfig, LiveSource, run_session};
//!
//! # async fn demo() -> pktstat::Result<()> {
//! let source = LiveSource::open("eth0", &CaptureConfig::default())?;
//! let report = run_session("eth0", source, Duration::from_secs(5)).await?;
//! print!("{}", report.stats);
//! # Ok(())
//! # }
//! ```

pub mod async_capture;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod interface;
pub mod interrupt;
pub mod layers;
pub mod menu;
pub mod packet;
pub mod render;
pub mod session;
pub mod stats;

pub use async_capture::AsyncCapture;
pub use capture::{
    CaptureBackend, CaptureConfig, CaptureSource, LiveSource, PcapBackend, Pull, ReplaySource,
};
pub use config::Config;
pub use error::{Error, Result};
pub use input::LineInput;
pub use interface::{InterfaceInfo, list_interfaces, select_interface};
pub use interrupt::{Interrupted, Interrupts};
pub use layers::{Layer, LayerType, LinkType};
pub use menu::{Menu, MenuChoice};
pub use packet::PacketRecord;
pub use session::{Session, SessionReport, SessionState, TerminationReason, run_session};
pub use stats::{AggregateStats, ProtocolTally};
