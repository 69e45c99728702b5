//! Protocol layer tagging.
//!
//! libpcap hands out raw frames only, so the layer sequence of every
//! captured packet is recovered here by walking its headers with
//! `etherparse`. The walk stops at the first header it cannot read; the
//! bytes left over become a `Payload` or `DecodeFailure` layer.

use std::fmt;

use etherparse::{
    Ethernet2HeaderSlice, Ipv4HeaderSlice, Ipv6HeaderSlice, TcpHeaderSlice, UdpHeaderSlice,
};

/// Well-known EtherTypes.
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const VLAN: u16 = 0x8100;
    pub const QINQ: u16 = 0x88a8;
    pub const IPV6: u16 = 0x86dd;
}

/// IP protocol numbers the walker descends into.
pub mod ip_proto {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const ICMPV6: u8 = 58;
}

/// Tag naming one protocol layer of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Ethernet,
    Dot1Q,
    Loopback,
    LinuxSll,
    Arp,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmpv4,
    Icmpv6,
    Payload,
    DecodeFailure,
}

impl LayerType {
    pub fn name(&self) -> &'static str {
        match self {
            LayerType::Ethernet => "Ethernet",
            LayerType::Dot1Q => "Dot1Q",
            LayerType::Loopback => "Loopback",
            LayerType::LinuxSll => "LinuxSLL",
            LayerType::Arp => "ARP",
            LayerType::Ipv4 => "IPv4",
            LayerType::Ipv6 => "IPv6",
            LayerType::Tcp => "TCP",
            LayerType::Udp => "UDP",
            LayerType::Icmpv4 => "ICMPv4",
            LayerType::Icmpv6 => "ICMPv6",
            LayerType::Payload => "Payload",
            LayerType::DecodeFailure => "DecodeFailure",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Link-layer framing of a capture handle, from its DLT value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Ethernet,
    /// BSD loopback: 4-byte address family in host byte order.
    Null,
    /// Bare IPv4/IPv6 without link header.
    Raw,
    /// Linux "cooked" capture, used by the `any` pseudo-device.
    LinuxSll,
    Other(i32),
}

impl LinkType {
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            1 => LinkType::Ethernet,
            0 | 108 => LinkType::Null,
            12 | 14 | 101 => LinkType::Raw,
            113 => LinkType::LinuxSll,
            other => LinkType::Other(other),
        }
    }
}

/// One decoded layer: its tag, where it sits in the frame and a short
/// human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub kind: LayerType,
    pub offset: usize,
    pub len: usize,
    pub summary: String,
}

/// Decode the layer sequence of a frame captured on a `link` handle.
pub fn decode(link: LinkType, data: &[u8]) -> Vec<Layer> {
    let mut walker = Walker {
        data,
        offset: 0,
        layers: Vec::new(),
    };

    match link {
        LinkType::Ethernet => walker.ethernet(),
        LinkType::Null => walker.loopback(),
        LinkType::Raw => walker.raw_ip(),
        LinkType::LinuxSll => walker.linux_sll(),
        LinkType::Other(_) => {}
    }

    walker.finish()
}

struct Walker<'a> {
    data: &'a [u8],
    offset: usize,
    layers: Vec<Layer>,
}

impl<'a> Walker<'a> {
    fn rest(&self) -> &'a [u8] {
        let data = self.data;
        &data[self.offset..]
    }

    fn push(&mut self, kind: LayerType, len: usize, summary: String) {
        self.layers.push(Layer {
            kind,
            offset: self.offset,
            len,
            summary,
        });
        self.offset += len;
    }

    fn fail(&mut self, header: &str) {
        let len = self.rest().len();
        if len == 0 {
            return;
        }
        self.push(
            LayerType::DecodeFailure,
            len,
            format!("{header} header truncated or malformed"),
        );
    }

    /// Drop trailing link padding beyond the network layer's stated length.
    fn trim_to(&mut self, len: usize) {
        if self.offset + len < self.data.len() {
            self.data = &self.data[..self.offset + len];
        }
    }

    fn finish(mut self) -> Vec<Layer> {
        let len = self.rest().len();
        if len > 0 {
            self.push(LayerType::Payload, len, format!("{len} bytes"));
        }
        self.layers
    }

    fn ethernet(&mut self) {
        let eth = match Ethernet2HeaderSlice::from_slice(self.rest()) {
            Ok(eth) => eth,
            Err(_) => return self.fail("Ethernet"),
        };
        let ether_type = eth.ether_type().0;
        self.push(
            LayerType::Ethernet,
            eth.slice().len(),
            format!(
                "{} -> {} type 0x{:04x}",
                format_mac(&eth.source()),
                format_mac(&eth.destination()),
                ether_type
            ),
        );
        self.ether_type(ether_type);
    }

    fn ether_type(&mut self, ether_type: u16) {
        match ether_type {
            ethertype::IPV4 => self.ipv4(),
            ethertype::IPV6 => self.ipv6(),
            ethertype::ARP => self.arp(),
            ethertype::VLAN | ethertype::QINQ => self.vlan(),
            _ => {}
        }
    }

    fn vlan(&mut self) {
        let rest = self.rest();
        if rest.len() < 4 {
            return self.fail("802.1Q");
        }
        let tci = u16::from_be_bytes([rest[0], rest[1]]);
        let inner = u16::from_be_bytes([rest[2], rest[3]]);
        self.push(
            LayerType::Dot1Q,
            4,
            format!("vlan {} priority {} type 0x{:04x}", tci & 0x0fff, tci >> 13, inner),
        );
        self.ether_type(inner);
    }

    fn arp(&mut self) {
        let rest = self.rest();
        if rest.len() < 8 {
            return self.fail("ARP");
        }
        let hw_len = rest[4] as usize;
        let proto_len = rest[5] as usize;
        let len = 8 + 2 * (hw_len + proto_len);
        if rest.len() < len {
            return self.fail("ARP");
        }
        let operation = match u16::from_be_bytes([rest[6], rest[7]]) {
            1 => "request".to_string(),
            2 => "reply".to_string(),
            other => format!("operation {other}"),
        };
        self.push(LayerType::Arp, len, operation);
    }

    fn ipv4(&mut self) {
        let ip = match Ipv4HeaderSlice::from_slice(self.rest()) {
            Ok(ip) => ip,
            Err(_) => return self.fail("IPv4"),
        };
        let header_len = ip.slice().len();
        let total_len = ip.total_len() as usize;
        if total_len >= header_len {
            self.trim_to(total_len);
        }
        let protocol = ip.protocol().0;
        let fragmented = ip.more_fragments() || ip.fragments_offset().value() != 0;
        self.push(
            LayerType::Ipv4,
            header_len,
            format!(
                "{} -> {} proto {} ttl {}",
                ip.source_addr(),
                ip.destination_addr(),
                protocol,
                ip.ttl()
            ),
        );
        // Only the first fragment carries a transport header.
        if !fragmented {
            self.transport(protocol);
        }
    }

    fn ipv6(&mut self) {
        let ip = match Ipv6HeaderSlice::from_slice(self.rest()) {
            Ok(ip) => ip,
            Err(_) => return self.fail("IPv6"),
        };
        let header_len = ip.slice().len();
        self.trim_to(header_len + ip.payload_length() as usize);
        let next_header = ip.next_header().0;
        self.push(
            LayerType::Ipv6,
            header_len,
            format!(
                "{} -> {} next {} hops {}",
                ip.source_addr(),
                ip.destination_addr(),
                next_header,
                ip.hop_limit()
            ),
        );
        self.transport(next_header);
    }

    fn transport(&mut self, protocol: u8) {
        match protocol {
            ip_proto::TCP => self.tcp(),
            ip_proto::UDP => self.udp(),
            ip_proto::ICMP => self.icmp(LayerType::Icmpv4, 8),
            ip_proto::ICMPV6 => self.icmp(LayerType::Icmpv6, 4),
            _ => {}
        }
    }

    fn tcp(&mut self) {
        let tcp = match TcpHeaderSlice::from_slice(self.rest()) {
            Ok(tcp) => tcp,
            Err(_) => return self.fail("TCP"),
        };
        let flags: Vec<&str> = [
            (tcp.syn(), "SYN"),
            (tcp.ack(), "ACK"),
            (tcp.fin(), "FIN"),
            (tcp.rst(), "RST"),
            (tcp.psh(), "PSH"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        self.push(
            LayerType::Tcp,
            tcp.slice().len(),
            format!(
                "{} -> {} [{}] seq {}",
                tcp.source_port(),
                tcp.destination_port(),
                flags.join(","),
                tcp.sequence_number()
            ),
        );
    }

    fn udp(&mut self) {
        let udp = match UdpHeaderSlice::from_slice(self.rest()) {
            Ok(udp) => udp,
            Err(_) => return self.fail("UDP"),
        };
        self.push(
            LayerType::Udp,
            udp.slice().len(),
            format!(
                "{} -> {} len {}",
                udp.source_port(),
                udp.destination_port(),
                udp.length()
            ),
        );
    }

    fn icmp(&mut self, kind: LayerType, header_len: usize) {
        let rest = self.rest();
        if rest.len() < header_len {
            return self.fail(kind.name());
        }
        self.push(kind, header_len, format!("type {} code {}", rest[0], rest[1]));
    }

    fn loopback(&mut self) {
        let rest = self.rest();
        if rest.len() < 4 {
            return self.fail("Loopback");
        }
        let bytes = [rest[0], rest[1], rest[2], rest[3]];
        // The family is written in the capturing host's byte order.
        let family = match u32::from_le_bytes(bytes) {
            le if le > 0xffff => u32::from_be_bytes(bytes),
            le => le,
        };
        self.push(LayerType::Loopback, 4, format!("family {family}"));
        match family {
            2 => self.ipv4(),
            24 | 28 | 30 => self.ipv6(),
            _ => {}
        }
    }

    fn raw_ip(&mut self) {
        match self.rest().first().map(|b| b >> 4) {
            Some(4) => self.ipv4(),
            Some(6) => self.ipv6(),
            Some(_) => self.fail("raw IP"),
            None => {}
        }
    }

    fn linux_sll(&mut self) {
        let rest = self.rest();
        if rest.len() < 16 {
            return self.fail("Linux SLL");
        }
        let packet_type = u16::from_be_bytes([rest[0], rest[1]]);
        let protocol = u16::from_be_bytes([rest[14], rest[15]]);
        self.push(
            LayerType::LinuxSll,
            16,
            format!("packet type {packet_type} protocol 0x{protocol:04x}"),
        );
        self.ether_type(protocol);
    }
}

fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherparse::PacketBuilder;

    const SRC_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
    const DST_MAC: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];

    fn kinds(layers: &[Layer]) -> Vec<LayerType> {
        layers.iter().map(|l| l.kind).collect()
    }

    fn tcp_frame(payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv4([192, 168, 1, 1], [192, 168, 1, 2], 64)
            .tcp(443, 51000, 1000, 4096);
        let mut frame = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, payload).unwrap();
        frame
    }

    #[test]
    fn test_ethernet_ipv4_tcp_payload() {
        let frame = tcp_frame(b"hello");
        let layers = decode(LinkType::Ethernet, &frame);

        assert_eq!(
            kinds(&layers),
            vec![
                LayerType::Ethernet,
                LayerType::Ipv4,
                LayerType::Tcp,
                LayerType::Payload
            ]
        );
        assert_eq!(layers[0].len, 14);
        assert_eq!(layers[1].offset, 14);
        assert!(layers[1].summary.starts_with("192.168.1.1 -> 192.168.1.2"));
        assert!(layers[2].summary.starts_with("443 -> 51000"));
        assert_eq!(layers[3].len, 5);
    }

    #[test]
    fn test_layers_cover_whole_frame() {
        let frame = tcp_frame(b"0123456789");
        let layers = decode(LinkType::Ethernet, &frame);
        let covered: usize = layers.iter().map(|l| l.len).sum();
        assert_eq!(covered, frame.len());
    }

    #[test]
    fn test_ethernet_ipv6_udp_without_payload() {
        let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv6([0xfe; 16], [0x01; 16], 32)
            .udp(5353, 5353);
        let mut frame = Vec::new();
        builder.write(&mut frame, &[]).unwrap();

        let layers = decode(LinkType::Ethernet, &frame);
        assert_eq!(
            kinds(&layers),
            vec![LayerType::Ethernet, LayerType::Ipv6, LayerType::Udp]
        );
    }

    #[test]
    fn test_ethernet_padding_is_not_payload() {
        let mut frame = tcp_frame(&[]);
        frame.extend_from_slice(&[0u8; 6]);
        let layers = decode(LinkType::Ethernet, &frame);
        assert_eq!(
            kinds(&layers),
            vec![LayerType::Ethernet, LayerType::Ipv4, LayerType::Tcp]
        );
    }

    #[test]
    fn test_vlan_tagged_arp() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&DST_MAC);
        frame.extend_from_slice(&SRC_MAC);
        frame.extend_from_slice(&ethertype::VLAN.to_be_bytes());
        frame.extend_from_slice(&[0x20, 0x0a]); // priority 1, vlan 10
        frame.extend_from_slice(&ethertype::ARP.to_be_bytes());
        // htype, ptype, hlen, plen, op=request
        frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);
        frame.extend_from_slice(&[0u8; 20]);

        let layers = decode(LinkType::Ethernet, &frame);
        assert_eq!(
            kinds(&layers),
            vec![LayerType::Ethernet, LayerType::Dot1Q, LayerType::Arp]
        );
        assert_eq!(layers[1].summary, "vlan 10 priority 1 type 0x0806");
        assert_eq!(layers[2].summary, "request");
    }

    #[test]
    fn test_truncated_ipv4_is_decode_failure() {
        let frame = tcp_frame(&[]);
        let layers = decode(LinkType::Ethernet, &frame[..20]);
        assert_eq!(
            kinds(&layers),
            vec![LayerType::Ethernet, LayerType::DecodeFailure]
        );
        assert_eq!(layers[1].len, 6);
    }

    #[test]
    fn test_short_frame_is_decode_failure() {
        let layers = decode(LinkType::Ethernet, &[0u8; 5]);
        assert_eq!(kinds(&layers), vec![LayerType::DecodeFailure]);
    }

    #[test]
    fn test_empty_frame_has_no_layers() {
        assert!(decode(LinkType::Ethernet, &[]).is_empty());
    }

    #[test]
    fn test_unknown_ethertype_becomes_payload() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&DST_MAC);
        frame.extend_from_slice(&SRC_MAC);
        frame.extend_from_slice(&0x88ccu16.to_be_bytes()); // LLDP
        frame.extend_from_slice(&[1, 2, 3]);

        let layers = decode(LinkType::Ethernet, &frame);
        assert_eq!(kinds(&layers), vec![LayerType::Ethernet, LayerType::Payload]);
    }

    #[test]
    fn test_loopback_and_raw_ip() {
        let frame = tcp_frame(b"x");
        let ip_packet = &frame[14..];

        let mut looped = 2u32.to_le_bytes().to_vec();
        looped.extend_from_slice(ip_packet);
        assert_eq!(
            kinds(&decode(LinkType::Null, &looped)),
            vec![
                LayerType::Loopback,
                LayerType::Ipv4,
                LayerType::Tcp,
                LayerType::Payload
            ]
        );

        assert_eq!(
            kinds(&decode(LinkType::Raw, ip_packet)),
            vec![LayerType::Ipv4, LayerType::Tcp, LayerType::Payload]
        );
    }

    #[test]
    fn test_linux_sll_header() {
        let frame = tcp_frame(&[]);
        let mut cooked = vec![0u8; 14];
        cooked.extend_from_slice(&ethertype::IPV4.to_be_bytes());
        cooked.extend_from_slice(&frame[14..]);

        assert_eq!(
            kinds(&decode(LinkType::LinuxSll, &cooked)),
            vec![LayerType::LinuxSll, LayerType::Ipv4, LayerType::Tcp]
        );
    }

    #[test]
    fn test_link_type_from_dlt() {
        assert_eq!(LinkType::from_dlt(1), LinkType::Ethernet);
        assert_eq!(LinkType::from_dlt(0), LinkType::Null);
        assert_eq!(LinkType::from_dlt(101), LinkType::Raw);
        assert_eq!(LinkType::from_dlt(113), LinkType::LinuxSll);
        assert_eq!(LinkType::from_dlt(127), LinkType::Other(127));
    }
}
