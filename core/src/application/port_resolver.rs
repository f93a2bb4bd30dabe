//! Target port discovery for the monitored process.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{LobbyEvent, PortSetTransition, TargetPortSet};
use crate::ports::{EventNotifierPort, ProcessIntrospectorPort};

/// Default seconds between two OS enumerations.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 1;

/// Resolves which UDP ports the monitored process currently owns.
///
/// Enumeration is expensive (it shells out to the OS socket table), so it
/// runs at most once per refresh interval no matter how many capture
/// workers ask. Between refreshes callers get the cached set.
///
/// A change of ports marks a lobby boundary: when the cached set was
/// non-empty a `LobbyReset` is emitted before the new set is swapped in.
pub struct PortResolver<I: ProcessIntrospectorPort, N: EventNotifierPort> {
    introspector: I,
    notifier: Arc<N>,
    process_name: String,
    refresh_interval_secs: u64,

    current: RwLock<Arc<TargetPortSet>>,
    next_refresh_at: AtomicU64,
    refresh_lock: Mutex<()>,
}

impl<I: ProcessIntrospectorPort, N: EventNotifierPort> PortResolver<I, N> {
    /// Create a resolver for `process_name` with the default refresh interval.
    pub fn new(introspector: I, notifier: Arc<N>, process_name: impl Into<String>) -> Self {
        Self {
            introspector,
            notifier,
            process_name: process_name.into(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            current: RwLock::new(Arc::new(TargetPortSet::new())),
            next_refresh_at: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Override the refresh interval.
    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        self.refresh_interval_secs = secs.max(1);
        self
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// The cached set, without triggering a refresh.
    pub fn snapshot(&self) -> Arc<TargetPortSet> {
        self.current.read().clone()
    }

    /// Resolve the current port set using the wall clock.
    pub async fn resolve(&self) -> Arc<TargetPortSet> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.resolve_at(now).await
    }

    /// Resolve the current port set as of `now` (epoch seconds).
    pub async fn resolve_at(&self, now: u64) -> Arc<TargetPortSet> {
        if now < self.next_refresh_at.load(Ordering::Acquire) {
            return self.snapshot();
        }

        let _guard = self.refresh_lock.lock().await;

        // Another worker may have refreshed while we waited
        if now < self.next_refresh_at.load(Ordering::Acquire) {
            return self.snapshot();
        }
        self.next_refresh_at.store(
            now.saturating_add(self.refresh_interval_secs),
            Ordering::Release,
        );

        match self.enumerate().await {
            Some(candidate) => self.apply_snapshot(candidate),
            None => self.snapshot(),
        }
    }

    /// Swap in a freshly enumerated candidate set.
    ///
    /// Emits `LobbyReset` when the cached set was non-empty and differs.
    pub fn apply_snapshot(&self, candidate: TargetPortSet) -> Arc<TargetPortSet> {
        let mut current = self.current.write();

        match current.transition_to(&candidate) {
            PortSetTransition::Unchanged => current.clone(),
            PortSetTransition::Replaced { lobby_reset } => {
                if lobby_reset {
                    info!(previous = %current, next = %candidate, "Lobby closed or created");
                    self.notifier.notify(LobbyEvent::LobbyReset);
                } else {
                    info!(ports = %candidate, "Target ports discovered");
                }

                let next = Arc::new(current.succeed(candidate));
                *current = next.clone();
                next
            }
        }
    }

    /// Build a candidate set from OS state.
    ///
    /// Returns `None` when the process is not running or any query fails.
    async fn enumerate(&self) -> Option<TargetPortSet> {
        let pids = match self.introspector.list_process_ids(&self.process_name).await {
            Ok(pids) => pids,
            Err(e) => {
                warn!(process = %self.process_name, error = %e, "Failed to list processes");
                return None;
            }
        };

        if pids.is_empty() {
            debug!(process = %self.process_name, "Process not running");
            return None;
        }

        let mut ports = BTreeSet::new();
        for pid in pids {
            match self.introspector.list_udp_ports(pid).await {
                Ok(found) => ports.extend(found),
                Err(e) => {
                    warn!(pid, error = %e, "Failed to list UDP ports");
                    return None;
                }
            }
        }

        Some(TargetPortSet::from_ports(ports))
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::{MockIntrospector, RecordingNotifier};
    use super::*;

    fn resolver(
        introspector: MockIntrospector,
    ) -> (PortResolver<MockIntrospector, RecordingNotifier>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (
            PortResolver::new(introspector, notifier.clone(), "RISK"),
            notifier,
        )
    }

    fn ports(set: &TargetPortSet) -> Vec<u16> {
        set.ports().collect()
    }

    #[tokio::test]
    async fn test_first_resolve_discovers_ports_without_reset() {
        let (resolver, notifier) = resolver(MockIntrospector::with_process(10, &[5000, 5001]));

        let set = resolver.resolve_at(1_000).await;
        assert_eq!(ports(&set), vec![5000, 5001]);
        assert_eq!(set.generation(), 1);
        assert_eq!(notifier.resets(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_returns_identical_set() {
        let (resolver, _notifier) = resolver(MockIntrospector::with_process(10, &[5000]));

        let first = resolver.resolve_at(1_000).await;
        resolver.introspector.set(10, &[6000]);
        let second = resolver.resolve_at(1_000).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*resolver.introspector.calls.lock(), 1);

        let third = resolver.resolve_at(1_001).await;
        assert_eq!(ports(&third), vec![6000]);
    }

    #[tokio::test]
    async fn test_unchanged_ports_keep_the_same_arc() {
        let (resolver, notifier) = resolver(MockIntrospector::with_process(10, &[5000]));

        let first = resolver.resolve_at(1_000).await;
        let second = resolver.resolve_at(1_005).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(notifier.resets(), 0);
    }

    #[tokio::test]
    async fn test_reset_only_when_old_set_non_empty_and_different() {
        let introspector = MockIntrospector::with_process(10, &[5000, 5001]);
        let (resolver, notifier) = resolver(introspector);

        // {} -> {A, B}: no reset
        resolver.resolve_at(1_000).await;
        assert_eq!(notifier.resets(), 0);

        // {A, B} -> {}: reset (process alive, sockets closed)
        resolver.introspector.set(10, &[]);
        let set = resolver.resolve_at(1_001).await;
        assert!(set.is_empty());
        assert_eq!(notifier.resets(), 1);

        // {} -> {C}: no reset
        resolver.introspector.set(10, &[7000]);
        resolver.resolve_at(1_002).await;
        assert_eq!(notifier.resets(), 1);

        // {C} -> {D}: reset
        resolver.introspector.set(10, &[7001]);
        resolver.resolve_at(1_003).await;
        assert_eq!(notifier.resets(), 2);
    }

    #[tokio::test]
    async fn test_reset_is_emitted_before_swap() {
        let (resolver, notifier) = resolver(MockIntrospector::with_process(10, &[5000]));
        resolver.resolve_at(1_000).await;

        resolver.introspector.set(10, &[6000]);
        let next = resolver.resolve_at(1_001).await;

        assert_eq!(notifier.events.lock().as_slice(), &[LobbyEvent::LobbyReset]);
        assert_eq!(next.generation(), 2);
    }

    #[tokio::test]
    async fn test_process_gone_keeps_cached_set() {
        let (resolver, notifier) = resolver(MockIntrospector::with_process(10, &[5000]));
        let first = resolver.resolve_at(1_000).await;

        resolver.introspector.kill(10);
        let second = resolver.resolve_at(1_001).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(notifier.resets(), 0);
    }

    #[tokio::test]
    async fn test_introspection_failure_keeps_cached_set() {
        let (resolver, _notifier) = resolver(MockIntrospector::with_process(10, &[5000]));
        let first = resolver.resolve_at(1_000).await;

        *resolver.introspector.failing.lock() = true;
        let second = resolver.resolve_at(1_001).await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_port_query_failure_keeps_cached_set_without_reset() {
        let introspector = MockIntrospector::with_process(10, &[5000]);
        introspector.set(11, &[5001]);
        let (resolver, notifier) = resolver(introspector);
        let first = resolver.resolve_at(1_000).await;
        assert_eq!(ports(&first), vec![5000, 5001]);

        // One pid failing abandons the cycle instead of reporting no ports
        resolver.introspector.failing_pids.lock().push(11);
        let second = resolver.resolve_at(1_001).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &resolver.snapshot()));
        assert_eq!(notifier.resets(), 0);

        resolver.introspector.failing_pids.lock().clear();
        let third = resolver.resolve_at(1_002).await;
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(notifier.resets(), 0);
    }

    #[tokio::test]
    async fn test_ports_are_unioned_across_pids() {
        let introspector = MockIntrospector::with_process(10, &[5000]);
        introspector.set(11, &[5001, 5000]);
        let (resolver, _notifier) = resolver(introspector);

        let set = resolver.resolve_at(1_000).await;
        assert_eq!(ports(&set), vec![5000, 5001]);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_enumerate_once() {
        let (resolver, _notifier) = resolver(MockIntrospector::with_process(10, &[5000]));
        let resolver = Arc::new(resolver);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move { resolver.resolve_at(1_000).await }));
        }

        for handle in handles {
            assert_eq!(ports(&handle.await.unwrap()), vec![5000]);
        }
        assert_eq!(*resolver.introspector.calls.lock(), 1);
    }
}
