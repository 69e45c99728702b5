//! Capture sources: the live libpcap handle and a scripted replay.

use std::collections::VecDeque;

use log::{debug, info};
use pcap::{Active, Capture};

use crate::error::{Error, Result};
use crate::interface::{self, InterfaceInfo};
use crate::layers::LinkType;
use crate::packet::PacketRecord;

/// Default snapshot length (maximum bytes kept per packet)
pub const DEFAULT_SNAPLEN: i32 = 1600;

/// Default libpcap read timeout (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 100;

/// Configuration for opening a live capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// How long one read may block before the reader checks for a stop request
    pub read_timeout_ms: i32,
    /// Deliver packets as soon as they arrive instead of buffering
    pub immediate_mode: bool,
}

impl CaptureConfig {
    /// Read timeout handed to libpcap, never 0 ("block forever") so the
    /// reader thread keeps seeing stop requests on a quiet interface.
    pub fn effective_read_timeout_ms(&self) -> i32 {
        self.read_timeout_ms.max(1)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: true,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            immediate_mode: true,
        }
    }
}

/// Outcome of a single read from a capture source.
#[derive(Debug)]
pub enum Pull {
    Packet(PacketRecord),
    /// Nothing arrived within the read timeout.
    Idle,
    /// The source has no more packets.
    Closed,
}

/// A blocking packet producer.
///
/// Implementations are moved onto a dedicated reader thread and dropped
/// there once reading stops, which is where the underlying handle is
/// released.
pub trait CaptureSource: Send + 'static {
    fn pull(&mut self) -> Result<Pull>;
}

impl CaptureSource for Box<dyn CaptureSource> {
    fn pull(&mut self) -> Result<Pull> {
        (**self).pull()
    }
}

/// Where interfaces come from and how they are opened.
pub trait CaptureBackend {
    type Source: CaptureSource;

    fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>>;

    fn open(&self, name: &str, config: &CaptureConfig) -> Result<Self::Source>;
}

/// Backend over the host's libpcap.
#[derive(Debug, Clone, Copy, Default)]
pub struct PcapBackend;

impl CaptureBackend for PcapBackend {
    type Source = LiveSource;

    fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        interface::list_interfaces()
    }

    fn open(&self, name: &str, config: &CaptureConfig) -> Result<LiveSource> {
        LiveSource::open(name, config)
    }
}

/// An open libpcap handle on one interface.
pub struct LiveSource {
    interface: String,
    capture: Capture<Active>,
    link: LinkType,
}

impl LiveSource {
    /// Open `name` for live capture.
    pub fn open(name: &str, config: &CaptureConfig) -> Result<Self> {
        debug!("Opening live capture on {} with {:?}", name, config);

        let open_error = |source| Error::Open {
            name: name.to_string(),
            source,
        };
        let capture = Capture::from_device(name)
            .map_err(open_error)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.effective_read_timeout_ms())
            .immediate_mode(config.immediate_mode)
            .open()
            .map_err(open_error)?;

        let link = LinkType::from_dlt(capture.get_datalink().0);
        info!("Capture opened on {} (link type {:?})", name, link);

        Ok(Self {
            interface: name.to_string(),
            capture,
            link,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn link_type(&self) -> LinkType {
        self.link
    }
}

impl CaptureSource for LiveSource {
    fn pull(&mut self) -> Result<Pull> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(Pull::Packet(PacketRecord::from_timeval(
                packet.header.ts.tv_sec as i64,
                packet.header.ts.tv_usec as i64,
                packet.header.len,
                self.link,
                packet.data.to_vec(),
            ))),
            Err(pcap::Error::TimeoutExpired) => Ok(Pull::Idle),
            Err(pcap::Error::NoMorePackets) => Ok(Pull::Closed),
            Err(e) => Err(Error::stream(e)),
        }
    }
}

impl Drop for LiveSource {
    fn drop(&mut self) {
        match self.capture.stats() {
            Ok(stat) => info!(
                "Closing capture on {}: {} received, {} dropped, {} dropped by interface",
                self.interface, stat.received, stat.dropped, stat.if_dropped
            ),
            Err(e) => debug!("Closing capture on {} (no stats: {})", self.interface, e),
        }
    }
}

/// Plays back a fixed list of records, then closes.
///
/// Stands in for a live device wherever one is not available.
#[derive(Debug, Default)]
pub struct ReplaySource {
    records: VecDeque<PacketRecord>,
}

impl ReplaySource {
    pub fn new(records: impl IntoIterator<Item = PacketRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl CaptureSource for ReplaySource {
    fn pull(&mut self) -> Result<Pull> {
        Ok(match self.records.pop_front() {
            Some(record) => Pull::Packet(record),
            None => Pull::Closed,
        })
    }
}
