//! Captured packet domain models.

use chrono::{DateTime, Utc};
use etherparse::{SlicedPacket, TransportSlice};

/// Link-layer framing of a captured packet.
///
/// Values follow the pcap `LINKTYPE_*` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// BSD loopback (4-byte address family header).
    Null,
    /// Ethernet II.
    Ethernet,
    /// Raw IPv4/IPv6 without a link header.
    RawIp,
    /// Linux cooked capture v1.
    LinuxSll,
    /// Anything else; never parsed.
    Other(i32),
}

impl LinkType {
    /// Map a pcap link type number.
    pub fn from_linktype(value: i32) -> Self {
        match value {
            0 | 108 => LinkType::Null,
            1 => LinkType::Ethernet,
            12 | 14 | 101 | 228 | 229 => LinkType::RawIp,
            113 => LinkType::LinuxSll,
            other => LinkType::Other(other),
        }
    }
}

/// A packet as delivered by a capture context.
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    pub link_type: LinkType,
    pub data: Vec<u8>,
    pub arrived_at: DateTime<Utc>,
}

impl CapturedPacket {
    pub fn new(link_type: LinkType, data: Vec<u8>) -> Self {
        Self {
            link_type,
            data,
            arrived_at: Utc::now(),
        }
    }

    /// Slice the packet down to its UDP datagram, if it carries one.
    pub fn udp(&self) -> Option<UdpDatagram<'_>> {
        let sliced = match self.link_type {
            LinkType::Ethernet => SlicedPacket::from_ethernet(&self.data).ok()?,
            LinkType::RawIp => SlicedPacket::from_ip(&self.data).ok()?,
            LinkType::LinuxSll => SlicedPacket::from_linux_sll(&self.data).ok()?,
            LinkType::Null => SlicedPacket::from_ip(self.data.get(4..)?).ok()?,
            LinkType::Other(_) => return None,
        };

        match sliced.transport? {
            TransportSlice::Udp(udp) => Some(UdpDatagram {
                destination_port: udp.destination_port(),
                payload: udp.payload(),
            }),
            _ => None,
        }
    }
}

/// UDP datagram borrowed from a captured packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpDatagram<'a> {
    pub destination_port: u16,
    pub payload: &'a [u8],
}
