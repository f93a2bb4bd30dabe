//! Sighting repository port (interface).

use crate::domain::Sighting;
use crate::error::Result;

/// Port for sighting persistence and identity links.
///
/// This is the collaborator surface the identity linker and the ingest
/// service work against. Link inserts are symmetric and idempotent.
pub trait SightingRepository: Send + Sync {
    // =========================================================================
    // Sightings
    // =========================================================================

    /// Record a sighting and add it to the current lobby.
    fn record_sighting(
        &self,
        sighting: Sighting,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// All sightings whose device id is `device_id` or whose user id is `user_id`.
    fn sightings_by_device_or_user(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Sighting>>> + Send;

    /// All sightings of `device_id`, newest first.
    fn sightings_by_device(
        &self,
        device_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Sighting>>> + Send;

    /// All sightings of `user_id`, newest first.
    fn sightings_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Sighting>>> + Send;

    /// Sightings of the identifiers or anything linked to them, newest first.
    fn sightings_with_linked(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Sighting>>> + Send;

    // =========================================================================
    // Current lobby
    // =========================================================================

    /// Whether the (device, user) pair is already in the current lobby.
    fn current_lobby_contains(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Members of the current lobby in join order.
    fn current_lobby(&self) -> impl std::future::Future<Output = Result<Vec<Sighting>>> + Send;

    /// Clear the current lobby.
    fn reset_lobby(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Whether `user_id` belongs to the operator and should not be tracked.
    fn is_ignored(&self, user_id: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    // =========================================================================
    // Identity links
    // =========================================================================

    /// Link two device ids in both directions. Returns `true` if the link is new.
    fn link_devices(
        &self,
        a: &str,
        b: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Link two user ids in both directions. Returns `true` if the link is new.
    fn link_users(&self, a: &str, b: &str)
        -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Device ids linked to `device_id`.
    fn linked_devices(
        &self,
        device_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    /// User ids linked to `user_id`.
    fn linked_users(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}
