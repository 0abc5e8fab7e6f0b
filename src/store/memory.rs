//! In-memory `Repository` — used by tests and local experiments.
//!
//! Upserts are keyed exactly like the libSQL backend (profiles by user,
//! addresses/preferences by profile, progress by user) so either backend
//! can sit behind the controller. A failure toggle lets tests exercise
//! the backend-error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{AddressRecord, PreferenceRecord, ProfileRecord, ProgressRecord};
use crate::store::traits::Repository;

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<String, ProfileRecord>,
    addresses: HashMap<Uuid, AddressRecord>,
    preferences: HashMap<Uuid, PreferenceRecord>,
    progress: HashMap<String, ProgressRecord>,
}

/// In-memory repository.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
    failing: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a query error until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn gate(&self) -> Result<(), DatabaseError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DatabaseError::Query("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, DatabaseError> {
        self.gate()?;
        Ok(self.state.read().await.profiles.get(user_id).cloned())
    }

    async fn upsert_profile(
        &self,
        profile: &ProfileRecord,
    ) -> Result<ProfileRecord, DatabaseError> {
        self.gate()?;
        let mut state = self.state.write().await;
        let stored = state
            .profiles
            .entry(profile.user_id.clone())
            .and_modify(|existing| {
                // Keyed upsert keeps the original id and created_at.
                existing.first_name = profile.first_name.clone();
                existing.middle_name = profile.middle_name.clone();
                existing.last_name = profile.last_name.clone();
                existing.email = profile.email.clone();
                existing.phone = profile.phone.clone();
                existing.date_of_birth = profile.date_of_birth;
                existing.bio = profile.bio.clone();
                existing.avatar_url = profile.avatar_url.clone();
                existing.updated_at = profile.updated_at;
            })
            .or_insert_with(|| profile.clone());
        Ok(stored.clone())
    }

    async fn get_address(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<AddressRecord>, DatabaseError> {
        self.gate()?;
        Ok(self.state.read().await.addresses.get(&profile_id).cloned())
    }

    async fn upsert_address(
        &self,
        address: &AddressRecord,
    ) -> Result<AddressRecord, DatabaseError> {
        self.gate()?;
        let mut state = self.state.write().await;
        let stored = state
            .addresses
            .entry(address.profile_id)
            .and_modify(|existing| {
                existing.unit = address.unit.clone();
                existing.street = address.street.clone();
                existing.city = address.city.clone();
                existing.state = address.state.clone();
                existing.postal_code = address.postal_code.clone();
                existing.country = address.country.clone();
                existing.updated_at = address.updated_at;
            })
            .or_insert_with(|| address.clone());
        Ok(stored.clone())
    }

    async fn get_preferences(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<PreferenceRecord>, DatabaseError> {
        self.gate()?;
        Ok(self
            .state
            .read()
            .await
            .preferences
            .get(&profile_id)
            .cloned())
    }

    async fn upsert_preferences(
        &self,
        preferences: &PreferenceRecord,
    ) -> Result<PreferenceRecord, DatabaseError> {
        self.gate()?;
        let mut state = self.state.write().await;
        let stored = state
            .preferences
            .entry(preferences.profile_id)
            .and_modify(|existing| {
                existing.experience = preferences.experience;
                existing.risk_tolerance = preferences.risk_tolerance;
                existing.timeline = preferences.timeline;
                existing.income_band = preferences.income_band;
                existing.net_worth_band = preferences.net_worth_band;
                existing.investment_goals = preferences.investment_goals.clone();
                existing.preferred_sectors = preferences.preferred_sectors.clone();
                existing.wants_advisor = preferences.wants_advisor;
                existing.previous_investments = preferences.previous_investments.clone();
                existing.updated_at = preferences.updated_at;
            })
            .or_insert_with(|| preferences.clone());
        Ok(stored.clone())
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<ProgressRecord>, DatabaseError> {
        self.gate()?;
        Ok(self.state.read().await.progress.get(user_id).cloned())
    }

    async fn upsert_progress(
        &self,
        progress: &ProgressRecord,
    ) -> Result<ProgressRecord, DatabaseError> {
        self.gate()?;
        let mut state = self.state.write().await;
        state
            .progress
            .insert(progress.user_id.clone(), progress.clone());
        Ok(progress.clone())
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), DatabaseError> {
        self.gate()?;
        let mut state = self.state.write().await;
        if let Some(profile) = state.profiles.remove(user_id) {
            state.addresses.remove(&profile.id);
            state.preferences.remove(&profile.id);
        }
        state.progress.remove(user_id);
        Ok(())
    }
}
