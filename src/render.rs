//! Console rendering of packets, interfaces and statistics.
//!
//! Everything here only borrows what it prints.

use std::fmt;

use crate::interface::InterfaceInfo;
use crate::packet::PacketRecord;
use crate::stats::AggregateStats;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f UTC";

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Packet Statistics:")?;
        writeln!(f, "Total Packets: {}", self.total_packets)?;
        writeln!(f, "Total Bytes: {}", self.total_bytes)?;
        writeln!(f, "Average Packet Size: {:.2}", self.average_packet_size)?;
        writeln!(f, "Protocol Counts:")?;
        for (kind, count) in self.protocols.iter() {
            writeln!(f, "{}: {}", kind, count)?;
        }
        Ok(())
    }
}

/// Capture metadata of one packet.
pub struct Metadata<'a>(pub &'a PacketRecord);

impl fmt::Display for Metadata<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        writeln!(f, "Timestamp: {}", record.timestamp.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "Capture Length: {}", record.caplen)?;
        writeln!(f, "Length: {}", record.len)
    }
}

/// Full dump of one packet: header line, one line per layer, hex bytes.
pub struct Detail<'a>(pub &'a PacketRecord);

impl fmt::Display for Detail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        writeln!(
            f,
            "PACKET: {} bytes, wire length {} cap length {} @ {}",
            record.data.len(),
            record.len,
            record.caplen,
            record.timestamp.format(TIMESTAMP_FORMAT)
        )?;
        for (i, layer) in record.layers.iter().enumerate() {
            writeln!(
                f,
                "- Layer {} ({} bytes) = {}\t{}",
                i + 1,
                layer.len,
                layer.kind,
                layer.summary
            )?;
        }
        write_hex(f, &record.data)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    for (row, chunk) in data.chunks(16).enumerate() {
        write!(f, "{:08x} ", row * 16)?;
        for i in 0..16 {
            match chunk.get(i) {
                Some(byte) => write!(f, " {:02x}", byte)?,
                None => f.write_str("   ")?,
            }
            if i == 7 {
                f.write_str(" ")?;
            }
        }
        f.write_str("  |")?;
        for &byte in chunk {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        writeln!(f, "|")?;
    }
    Ok(())
}

/// Numbered interface list, starting at 1.
pub struct InterfaceList<'a>(pub &'a [InterfaceInfo]);

impl fmt::Display for InterfaceList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, iface) in self.0.iter().enumerate() {
            writeln!(f, "{}. {} ({})", i + 1, iface.name, iface.description)?;
        }
        Ok(())
    }
}
