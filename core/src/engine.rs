//! LobbyWatch engine: wires the pipeline together and runs the decode pool.
//!
//! Captured packets arrive on a bounded channel. Each one is dispatched on
//! its own task; a semaphore caps how many are in flight so a traffic burst
//! cannot spawn unbounded work.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::application::{PortResolver, SightingDispatcher, TrafficFilter};
use crate::config::Config;
use crate::domain::CapturedPacket;
use crate::ports::{EventNotifierPort, ProcessIntrospectorPort};

/// Counters reported when the engine stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Packets taken off the capture queue.
    pub packets: u64,
    /// Packets that produced a `PlayerSighted` event.
    pub sightings: u64,
    /// Decode tasks that panicked.
    pub failed: u64,
    /// Packets dropped before reaching the pool.
    pub dropped: u64,
}

/// The capture-side pipeline.
pub struct LobbyWatchEngine<I, N>
where
    I: ProcessIntrospectorPort + 'static,
    N: EventNotifierPort + 'static,
{
    resolver: Arc<PortResolver<I, N>>,
    dispatcher: Arc<SightingDispatcher<I, N>>,
    workers: usize,
    #[cfg(feature = "capture")]
    capture_queue_capacity: usize,
    #[cfg(feature = "capture")]
    capture_timeout_ms: i32,
}

impl<I, N> LobbyWatchEngine<I, N>
where
    I: ProcessIntrospectorPort + 'static,
    N: EventNotifierPort + 'static,
{
    /// Build the resolver, filter and dispatcher from `config`.
    pub fn new(config: &Config, introspector: I, notifier: Arc<N>) -> Self {
        let resolver = Arc::new(
            PortResolver::new(introspector, notifier.clone(), config.process_name.clone())
                .with_refresh_interval(config.port_refresh_interval_secs),
        );
        let filter = TrafficFilter::new(resolver.clone(), config.payload_bounds());
        let dispatcher = Arc::new(SightingDispatcher::new(filter, notifier));

        Self {
            resolver,
            dispatcher,
            workers: config.decode_workers.max(1),
            #[cfg(feature = "capture")]
            capture_queue_capacity: config.capture_queue_capacity.max(1),
            #[cfg(feature = "capture")]
            capture_timeout_ms: config.capture_timeout_ms,
        }
    }

    pub fn resolver(&self) -> &PortResolver<I, N> {
        &self.resolver
    }

    pub fn dispatcher(&self) -> &SightingDispatcher<I, N> {
        &self.dispatcher
    }

    /// Dispatch packets from `rx` until the channel closes.
    ///
    /// Waits for in-flight decodes before returning.
    pub async fn drive(&self, mut rx: mpsc::Receiver<CapturedPacket>) -> EngineStats {
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<bool> = JoinSet::new();
        let mut stats = EngineStats::default();

        while let Some(packet) = rx.recv().await {
            stats.packets += 1;

            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };

            let dispatcher = self.dispatcher.clone();
            tasks.spawn(async move {
                let _permit = permit;
                dispatcher.on_packet(&packet).await.is_some()
            });

            while let Some(done) = tasks.try_join_next() {
                Self::reap(done, &mut stats);
            }
        }

        while let Some(done) = tasks.join_next().await {
            Self::reap(done, &mut stats);
        }

        debug!(?stats, "Decode pool drained");
        stats
    }

    fn reap(done: std::result::Result<bool, tokio::task::JoinError>, stats: &mut EngineStats) {
        match done {
            Ok(true) => stats.sightings += 1,
            Ok(false) => {}
            Err(e) => {
                stats.failed += 1;
                warn!(error = %e, "Decode task failed");
            }
        }
    }

    /// Capture on every interface until `shutdown` resolves.
    #[cfg(feature = "capture")]
    pub async fn run<F>(&self, shutdown: F) -> crate::error::Result<EngineStats>
    where
        F: std::future::Future<Output = ()>,
    {
        use tracing::info;

        use crate::adapters::LiveCapture;

        let initial = self.resolver.resolve().await;
        info!(
            process = %self.resolver.process_name(),
            ports = %initial,
            "Watching lobby traffic"
        );

        let (tx, rx) = mpsc::channel(self.capture_queue_capacity);
        let capture = LiveCapture::start(tx, self.capture_timeout_ms)?;

        let drive = self.drive(rx);
        tokio::pin!(drive);
        tokio::pin!(shutdown);

        let stop = |capture: LiveCapture| {
            tokio::task::spawn_blocking(move || {
                let dropped = capture.dropped();
                capture.stop();
                dropped
            })
        };

        let stats = tokio::select! {
            stats = &mut drive => {
                // Every capture thread exited on its own
                let dropped = stop(capture).await.unwrap_or_default();
                EngineStats { dropped, ..stats }
            }
            _ = &mut shutdown => {
                info!("Shutting down capture");
                let dropped = stop(capture).await.unwrap_or_default();
                // Senders are gone once the threads are joined
                let stats = drive.await;
                EngineStats { dropped, ..stats }
            }
        };

        info!(
            packets = stats.packets,
            sightings = stats.sightings,
            dropped = stats.dropped,
            "Capture finished"
        );
        Ok(stats)
    }
}
