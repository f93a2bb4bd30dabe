//! Process introspection adapters.
//!
//! Platform-specific implementations of process and UDP socket discovery.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
mod unsupported;

mod utils;

pub use utils::Utils;

use crate::error::Result;
use crate::ports::ProcessIntrospectorPort;

/// The main process introspector that uses platform-specific implementations.
pub struct ProcessIntrospector {
    #[cfg(target_os = "macos")]
    inner: darwin::DarwinIntrospector,

    #[cfg(target_os = "linux")]
    inner: linux::LinuxIntrospector,

    #[cfg(target_os = "windows")]
    inner: windows::WindowsIntrospector,

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    inner: unsupported::UnsupportedIntrospector,
}

impl ProcessIntrospector {
    /// Create a new introspector for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::DarwinIntrospector::new(),

            #[cfg(target_os = "linux")]
            inner: linux::LinuxIntrospector::new(),

            #[cfg(target_os = "windows")]
            inner: windows::WindowsIntrospector::new(),

            #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
            inner: unsupported::UnsupportedIntrospector,
        }
    }
}

impl Default for ProcessIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessIntrospectorPort for ProcessIntrospector {
    async fn list_process_ids(&self, name: &str) -> Result<Vec<u32>> {
        self.inner.list_process_ids(name).await
    }

    async fn list_udp_ports(&self, pid: u32) -> Result<Vec<u16>> {
        self.inner.list_udp_ports(pid).await
    }
}

/// Internal trait for platform-specific implementations.
trait Introspector: Send + Sync {
    fn list_process_ids(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u32>>> + Send;

    fn list_udp_ports(&self, pid: u32)
        -> impl std::future::Future<Output = Result<Vec<u16>>> + Send;
}
