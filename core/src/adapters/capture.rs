//! Live packet capture on every network interface (libpcap).
//!
//! Each interface gets its own blocking capture thread. Packets are handed
//! to the decode pool with `try_send`, so a slow pool drops packets
//! instead of stalling the capture path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use pcap::{Capture, Device};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::domain::{CapturedPacket, LinkType};
use crate::error::{Error, Result};

/// BPF filter applied to every capture context.
const CAPTURE_FILTER: &str = "udp";

/// Running capture contexts, one per interface.
pub struct LiveCapture {
    threads: Vec<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl LiveCapture {
    /// Open every interface in promiscuous mode and start capturing.
    ///
    /// Interfaces that fail to open are logged and skipped. Fails only
    /// when no interface exists or none could be opened.
    pub fn start(tx: mpsc::Sender<CapturedPacket>, read_timeout_ms: i32) -> Result<Self> {
        let devices =
            Device::list().map_err(|e| Error::Capture(format!("Failed to list devices: {}", e)))?;

        if devices.is_empty() {
            return Err(Error::Capture("No network adapters found".to_string()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));
        let mut threads = Vec::new();

        for device in devices {
            let name = device.name.clone();
            let mut capture = match Capture::from_device(device)
                .and_then(|c| c.promisc(true).timeout(read_timeout_ms).open())
            {
                Ok(capture) => capture,
                Err(e) => {
                    warn!(device = %name, error = %e, "Skipping interface");
                    continue;
                }
            };

            if let Err(e) = capture.filter(CAPTURE_FILTER, true) {
                warn!(device = %name, error = %e, "Failed to set capture filter");
                continue;
            }

            let link_type = LinkType::from_linktype(capture.get_datalink().0);
            let tx = tx.clone();
            let stop = stop.clone();
            let dropped = dropped.clone();

            let thread = std::thread::Builder::new()
                .name(format!("capture-{}", name))
                .spawn(move || {
                    debug!(device = %name, ?link_type, "Capture started");
                    loop {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }

                        match capture.next_packet() {
                            Ok(packet) => {
                                let packet = CapturedPacket::new(link_type, packet.data.to_vec());
                                match tx.try_send(packet) {
                                    Ok(()) => {}
                                    Err(TrySendError::Full(_)) => {
                                        dropped.fetch_add(1, Ordering::Relaxed);
                                    }
                                    Err(TrySendError::Closed(_)) => break,
                                }
                            }
                            Err(pcap::Error::TimeoutExpired) => continue,
                            Err(e) => {
                                warn!(device = %name, error = %e, "Capture stopped");
                                break;
                            }
                        }
                    }
                    debug!(device = %name, "Capture closed");
                })?;

            threads.push(thread);
        }

        if threads.is_empty() {
            return Err(Error::Capture("No network adapter could be opened".to_string()));
        }

        info!(interfaces = threads.len(), "Capturing UDP traffic");
        Ok(Self {
            threads,
            stop,
            dropped,
        })
    }

    /// Packets dropped because the decode queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Signal every capture thread to stop and wait for them.
    ///
    /// Threads notice the signal after at most one read timeout.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        for thread in self.threads {
            let _ = thread.join();
        }
    }
}
