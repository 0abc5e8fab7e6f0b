//! `Repository` trait — single async interface for all persistence.
//!
//! Implementations: `LibSqlBackend` (production) and `MemoryRepository`
//! (tests). The controller and resolver only ever see this trait, so
//! tests can substitute the in-memory variant freely.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{AddressRecord, PreferenceRecord, ProfileRecord, ProgressRecord};

/// Backend-agnostic record store for the onboarding entities.
///
/// `get_*` calls return `Ok(None)` when no row exists — absence is a
/// normal outcome, not an error. `upsert_*` calls are true upserts keyed
/// by the record's owner: at most one row per key can ever exist.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetch a user's profile.
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, DatabaseError>;

    /// Insert or update the profile, keyed by `user_id`. Returns the
    /// stored record.
    async fn upsert_profile(&self, profile: &ProfileRecord)
    -> Result<ProfileRecord, DatabaseError>;

    /// Fetch the address owned by a profile.
    async fn get_address(&self, profile_id: Uuid)
    -> Result<Option<AddressRecord>, DatabaseError>;

    /// Insert or update the address, keyed by `profile_id`.
    async fn upsert_address(&self, address: &AddressRecord)
    -> Result<AddressRecord, DatabaseError>;

    /// Fetch the investment profile owned by a profile.
    async fn get_preferences(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<PreferenceRecord>, DatabaseError>;

    /// Insert or update the investment profile, keyed by `profile_id`.
    async fn upsert_preferences(
        &self,
        preferences: &PreferenceRecord,
    ) -> Result<PreferenceRecord, DatabaseError>;

    /// Fetch a user's wizard progress.
    async fn get_progress(&self, user_id: &str) -> Result<Option<ProgressRecord>, DatabaseError>;

    /// Insert or update the progress row, keyed by `user_id`. The backing
    /// store enforces uniqueness on the key; concurrent upserts for the
    /// same user can never create duplicate rows.
    async fn upsert_progress(
        &self,
        progress: &ProgressRecord,
    ) -> Result<ProgressRecord, DatabaseError>;

    /// Administrative removal of a user's profile and all owned records.
    /// Not exercised by the normal wizard flow.
    async fn delete_profile(&self, user_id: &str) -> Result<(), DatabaseError>;
}
