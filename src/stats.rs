//! Running capture statistics.

use crate::layers::LayerType;
use crate::packet::PacketRecord;

/// Per-layer occurrence counts, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolTally {
    entries: Vec<(LayerType, u64)>,
}

impl ProtocolTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `kind`.
    pub fn add(&mut self, kind: LayerType, count: u64) {
        // The tag space is a dozen entries; a scan keeps arrival order for free.
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += count,
            None => self.entries.push((kind, count)),
        }
    }

    pub fn get(&self, kind: LayerType) -> u64 {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerType, u64)> + '_ {
        self.entries.iter().copied()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Totals accumulated over one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    pub total_packets: u64,
    pub total_bytes: u64,
    /// `total_bytes / total_packets`, or `0.0` before the first packet.
    pub average_packet_size: f64,
    pub protocols: ProtocolTally,
}

impl AggregateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the totals.
    pub fn update(&mut self, record: &PacketRecord) {
        self.total_packets += 1;
        self.total_bytes += record.data.len() as u64;
        for kind in record.layer_types() {
            self.protocols.add(kind, 1);
        }
        self.recompute_average();
    }

    /// Combine another aggregate into this one.
    pub fn merge(&mut self, other: &AggregateStats) {
        self.total_packets += other.total_packets;
        self.total_bytes += other.total_bytes;
        for (kind, count) in other.protocols.iter() {
            self.protocols.add(kind, count);
        }
        self.recompute_average();
    }

    pub fn is_empty(&self) -> bool {
        self.total_packets == 0
    }

    fn recompute_average(&mut self) {
        self.average_packet_size = if self.total_packets == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.total_packets as f64
        };
    }
}

impl FromIterator<PacketRecord> for AggregateStats {
    fn from_iter<I: IntoIterator<Item = PacketRecord>>(iter: I) -> Self {
        let mut stats = AggregateStats::new();
        for record in iter {
            stats.update(&record);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layer;
    use chrono::Utc;

    fn record(payload_len: usize, kinds: &[LayerType]) -> PacketRecord {
        PacketRecord {
            timestamp: Utc::now(),
            caplen: payload_len as u32,
            len: payload_len as u32,
            layers: kinds
                .iter()
                .map(|&kind| Layer {
                    kind,
                    offset: 0,
                    len: 0,
                    summary: String::new(),
                })
                .collect(),
            data: vec![0xab; payload_len],
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = AggregateStats::new();
        assert_eq!(stats.total_packets, 0);
        assert_eq!(stats.total_bytes, 0);
        assert_eq!(stats.average_packet_size, 0.0);
        assert!(stats.protocols.is_empty());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_three_record_scenario() {
        use LayerType::*;
        let stats: AggregateStats = vec![
            record(64, &[Ethernet, Ipv4]),
            record(128, &[Ethernet, Ipv4, Tcp]),
            record(0, &[Ethernet]),
        ]
        .into_iter()
        .collect();

        assert_eq!(stats.total_packets, 3);
        assert_eq!(stats.total_bytes, 192);
        assert_eq!(stats.average_packet_size, 64.0);
        assert_eq!(
            stats.protocols.iter().collect::<Vec<_>>(),
            vec![(Ethernet, 3), (Ipv4, 2), (Tcp, 1)]
        );
    }

    #[test]
    fn test_zero_length_record() {
        let mut stats = AggregateStats::new();
        stats.update(&record(0, &[]));
        assert_eq!(stats.total_packets, 1);
        assert_eq!(stats.total_bytes, 0);
        assert_eq!(stats.average_packet_size, 0.0);
    }

    #[test]
    fn test_repeated_layer_counts_each_time() {
        use LayerType::*;
        let mut stats = AggregateStats::new();
        stats.update(&record(100, &[Ethernet, Dot1Q, Dot1Q, Ipv4]));
        assert_eq!(stats.protocols.get(Dot1Q), 2);
        assert_eq!(stats.protocols.total(), 4);
    }

    #[test]
    fn test_tally_sum_equals_layer_pairs() {
        use LayerType::*;
        let records = vec![
            record(60, &[Ethernet, Arp]),
            record(1500, &[Ethernet, Ipv6, Udp, Payload]),
            record(90, &[Ethernet, Ipv4, Icmpv4, Payload]),
            record(14, &[DecodeFailure]),
        ];
        let pairs: usize = records.iter().map(|r| r.layers.len()).sum();
        let bytes: u64 = records.iter().map(|r| r.data.len() as u64).sum();
        let stats: AggregateStats = records.into_iter().collect();

        assert_eq!(stats.protocols.total(), pairs as u64);
        assert_eq!(stats.total_bytes, bytes);
        assert!((stats.average_packet_size - bytes as f64 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_counters_never_decrease() {
        use LayerType::*;
        let mut stats = AggregateStats::new();
        let mut previous = stats.clone();
        for len in [10, 0, 300, 42] {
            stats.update(&record(len, &[Ethernet, Ipv4]));
            assert!(stats.total_packets > previous.total_packets);
            assert!(stats.total_bytes >= previous.total_bytes);
            assert!(stats.protocols.get(Ethernet) > previous.protocols.get(Ethernet));
            previous = stats.clone();
        }
    }

    #[test]
    fn test_merge_matches_sequential_update() {
        use LayerType::*;
        let a = vec![record(64, &[Ethernet, Ipv4]), record(10, &[Ethernet])];
        let b = vec![record(128, &[Ethernet, Ipv6, Tcp]), record(0, &[Arp])];

        let mut merged: AggregateStats = a.clone().into_iter().collect();
        merged.merge(&b.clone().into_iter().collect());
        let sequential: AggregateStats = a.into_iter().chain(b).collect();

        assert_eq!(merged, sequential);
        assert_eq!(
            merged.protocols.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec![Ethernet, Ipv4, Ipv6, Tcp, Arp]
        );
    }

    #[test]
    fn test_merge_into_empty() {
        let mut stats = AggregateStats::new();
        stats.merge(&AggregateStats::new());
        assert_eq!(stats.average_packet_size, 0.0);
    }
}
