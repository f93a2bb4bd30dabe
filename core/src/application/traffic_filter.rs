//! Cheap pre-decode packet filtering.

use std::sync::Arc;

use crate::domain::{CapturedPacket, UdpDatagram};
use crate::ports::{EventNotifierPort, ProcessIntrospectorPort};

use super::PortResolver;

/// Smallest payload that can carry a player announcement.
pub const MIN_PAYLOAD_LEN: usize = 550;
/// Largest payload that can carry a player announcement.
pub const MAX_PAYLOAD_LEN: usize = 850;

/// Inclusive payload size window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBounds {
    pub min: usize,
    pub max: usize,
}

impl PayloadBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

impl Default for PayloadBounds {
    fn default() -> Self {
        Self::new(MIN_PAYLOAD_LEN, MAX_PAYLOAD_LEN)
    }
}

/// Drops everything that cannot be a lobby announcement.
///
/// A packet passes when it is UDP, addressed to a port the monitored
/// process owns, and its payload fits the size window. Rejections are
/// silent: capture is promiscuous and most traffic is unrelated.
pub struct TrafficFilter<I: ProcessIntrospectorPort, N: EventNotifierPort> {
    resolver: Arc<PortResolver<I, N>>,
    bounds: PayloadBounds,
}

impl<I: ProcessIntrospectorPort, N: EventNotifierPort> TrafficFilter<I, N> {
    pub fn new(resolver: Arc<PortResolver<I, N>>, bounds: PayloadBounds) -> Self {
        Self { resolver, bounds }
    }

    pub fn bounds(&self) -> PayloadBounds {
        self.bounds
    }

    /// Return the UDP datagram if the packet should be decoded.
    ///
    /// Checking the destination port may trigger a resolve cycle.
    pub async fn accept<'p>(&self, packet: &'p CapturedPacket) -> Option<UdpDatagram<'p>> {
        let udp = packet.udp()?;

        let targets = self.resolver.resolve().await;
        if !targets.contains(udp.destination_port) {
            return None;
        }

        if !self.bounds.contains(udp.payload.len()) {
            return None;
        }

        Some(udp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port_resolver::mocks::{MockIntrospector, RecordingNotifier};
    use crate::domain::fixtures::{ethernet_tcp, ethernet_udp};
    use crate::domain::LinkType;

    fn filter(ports: &[u16]) -> TrafficFilter<MockIntrospector, RecordingNotifier> {
        let resolver = PortResolver::new(
            MockIntrospector::with_process(10, ports),
            Arc::new(RecordingNotifier::default()),
            "RISK",
        );
        TrafficFilter::new(Arc::new(resolver), PayloadBounds::default())
    }

    fn packet(port: u16, payload_len: usize) -> CapturedPacket {
        CapturedPacket::new(LinkType::Ethernet, ethernet_udp(port, &vec![0u8; payload_len]))
    }

    #[test]
    fn test_bounds_inclusive() {
        let bounds = PayloadBounds::default();
        assert!(!bounds.contains(549));
        assert!(bounds.contains(550));
        assert!(bounds.contains(850));
        assert!(!bounds.contains(851));
    }

    #[tokio::test]
    async fn test_accepts_target_port_in_range() {
        let filter = filter(&[5000]);
        let packet = packet(5000, 600);

        let udp = filter.accept(&packet).await.unwrap();
        assert_eq!(udp.destination_port, 5000);
        assert_eq!(udp.payload.len(), 600);
    }

    #[tokio::test]
    async fn test_rejects_other_ports() {
        let filter = filter(&[5000]);
        assert!(filter.accept(&packet(5001, 600)).await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_sizes() {
        let filter = filter(&[5000]);
        assert!(filter.accept(&packet(5000, 549)).await.is_none());
        assert!(filter.accept(&packet(5000, 851)).await.is_none());
        assert!(filter.accept(&packet(5000, 550)).await.is_some());
        assert!(filter.accept(&packet(5000, 850)).await.is_some());
    }

    #[tokio::test]
    async fn test_rejects_non_udp_and_garbage() {
        let filter = filter(&[5000]);

        let tcp = CapturedPacket::new(LinkType::Ethernet, ethernet_tcp(5000));
        assert!(filter.accept(&tcp).await.is_none());

        let garbage = CapturedPacket::new(LinkType::Ethernet, vec![0xde, 0xad]);
        assert!(filter.accept(&garbage).await.is_none());
    }
}
