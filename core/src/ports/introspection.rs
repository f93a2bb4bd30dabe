//! Process introspection port (interface).

use crate::error::Result;

/// Port for querying live process and socket state from the OS.
///
/// Implementations handle platform-specific details (ps, ss, netstat, etc.)
pub trait ProcessIntrospectorPort: Send + Sync {
    /// List the process IDs whose executable name matches `name`.
    ///
    /// A trailing `.exe` is ignored on both sides of the comparison.
    fn list_process_ids(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u32>>> + Send;

    /// List the UDP local ports bound by `pid`.
    fn list_udp_ports(&self, pid: u32)
        -> impl std::future::Future<Output = Result<Vec<u16>>> + Send;
}
