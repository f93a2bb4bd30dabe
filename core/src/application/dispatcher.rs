//! Packet-to-sighting dispatch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{payload, CapturedPacket, DecodedIdentity};
use crate::ports::{EventNotifierPort, ProcessIntrospectorPort};

use super::TrafficFilter;

/// Turns captured packets into `PlayerSighted` events.
///
/// This is the single entry point of the capture pipeline. It never
/// resets the lobby itself; that happens in the port resolver when the
/// process's ports change.
pub struct SightingDispatcher<I: ProcessIntrospectorPort, N: EventNotifierPort> {
    filter: TrafficFilter<I, N>,
    notifier: Arc<N>,
}

impl<I: ProcessIntrospectorPort, N: EventNotifierPort> SightingDispatcher<I, N> {
    pub fn new(filter: TrafficFilter<I, N>, notifier: Arc<N>) -> Self {
        Self { filter, notifier }
    }

    pub fn filter(&self) -> &TrafficFilter<I, N> {
        &self.filter
    }

    /// Filter, decode and announce a single packet.
    ///
    /// Returns the decoded identity when an event was emitted. Anything
    /// that is not a valid announcement resolves to `None`.
    pub async fn on_packet(&self, packet: &CapturedPacket) -> Option<DecodedIdentity> {
        let udp = self.filter.accept(packet).await?;

        let Some(identity) = payload::decode(udp.payload) else {
            debug!(
                port = udp.destination_port,
                len = udp.payload.len(),
                "Payload carried no identity"
            );
            return None;
        };

        if identity.user_id.is_none() {
            warn!(device_id = %identity.device_id, "userId missing or truncated, reporting 0");
        }

        info!(
            name = %identity.name,
            country = %identity.country,
            device_id = %identity.device_id,
            user_id = identity.user_id_or_default(),
            "Player joined the lobby"
        );

        self.notifier.notify(identity.to_event());
        Some(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port_resolver::mocks::{MockIntrospector, RecordingNotifier};
    use crate::application::{PayloadBounds, PortResolver};
    use crate::domain::fixtures::{announcement, ethernet_udp};
    use crate::domain::{LinkType, LobbyEvent};

    fn dispatcher() -> (
        SightingDispatcher<MockIntrospector, RecordingNotifier>,
        Arc<RecordingNotifier>,
    ) {
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = Arc::new(PortResolver::new(
            MockIntrospector::with_process(10, &[5000]),
            notifier.clone(),
            "RISK",
        ));
        let filter = TrafficFilter::new(resolver, PayloadBounds::default());
        (SightingDispatcher::new(filter, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_announcement_emits_sighting() {
        let (dispatcher, notifier) = dispatcher();
        let payload = announcement("Alice", "NL", "dev-1", 1234, 600);
        let packet = CapturedPacket::new(LinkType::Ethernet, ethernet_udp(5000, &payload));

        let identity = dispatcher.on_packet(&packet).await.unwrap();
        assert_eq!(identity.name, "Alice");

        let events = notifier.events.lock();
        assert_eq!(
            events.as_slice(),
            &[LobbyEvent::PlayerSighted {
                name: "Alice".to_string(),
                device_id: "dev-1".to_string(),
                user_id: "1234".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_filtered_packet_emits_nothing() {
        let (dispatcher, notifier) = dispatcher();

        // right content, wrong port
        let payload = announcement("Alice", "NL", "dev-1", 1234, 600);
        let packet = CapturedPacket::new(LinkType::Ethernet, ethernet_udp(5001, &payload));
        assert!(dispatcher.on_packet(&packet).await.is_none());

        // right port, too small
        let payload = announcement("Alice", "NL", "dev-1", 1234, 0);
        let packet = CapturedPacket::new(LinkType::Ethernet, ethernet_udp(5000, &payload));
        assert!(dispatcher.on_packet(&packet).await.is_none());

        assert!(notifier.events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_payload_emits_nothing() {
        let (dispatcher, notifier) = dispatcher();
        let packet = CapturedPacket::new(LinkType::Ethernet, ethernet_udp(5000, &[0x42; 700]));

        assert!(dispatcher.on_packet(&packet).await.is_none());
        assert!(notifier.events.lock().is_empty());
    }
}
