//! Owned packet records.

use chrono::{DateTime, Utc};

use crate::layers::{self, Layer, LayerType, LinkType};

/// One captured frame with its capture metadata and decoded layers.
///
/// Records are owned (`Vec<u8>`) so they can be sent from the capture
/// thread to the async side.
#[derive(Debug, Clone)]
pub struct PacketRecord {
    pub timestamp: DateTime<Utc>,
    /// Bytes actually captured (bounded by the snapshot length).
    pub caplen: u32,
    /// Length of the frame on the wire.
    pub len: u32,
    pub layers: Vec<Layer>,
    pub data: Vec<u8>,
}

impl PacketRecord {
    /// Build a record from a raw frame, decoding its layers.
    pub fn capture(timestamp: DateTime<Utc>, len: u32, link: LinkType, data: Vec<u8>) -> Self {
        let layers = layers::decode(link, &data);
        Self {
            timestamp,
            caplen: data.len() as u32,
            len,
            layers,
            data,
        }
    }

    /// Build a record from a pcap header `timeval`.
    pub fn from_timeval(secs: i64, micros: i64, len: u32, link: LinkType, data: Vec<u8>) -> Self {
        let timestamp = DateTime::from_timestamp(secs, (micros.clamp(0, 999_999) * 1000) as u32)
            .unwrap_or_default();
        Self::capture(timestamp, len, link, data)
    }

    /// Layer tags in frame order.
    pub fn layer_types(&self) -> impl Iterator<Item = LayerType> + '_ {
        self.layers.iter().map(|layer| layer.kind)
    }
}
