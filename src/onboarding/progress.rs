//! Progress persistence — idempotent upserts of the wizard cursor plus a
//! rolling-window rate limiter.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::OnboardingConfig;
use crate::error::OnboardingError;
use crate::onboarding::model::ProgressRecord;
use crate::store::Repository;

/// Rolling-window rate limiter, keyed per identity.
///
/// One limiter instance covers one logical action type; its attempts do
/// not count against other limiters.
pub struct RateLimiter {
    action: &'static str,
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn new(action: &'static str, max_attempts: u32, window: Duration) -> Self {
        Self {
            action,
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt, rejecting it if the window is already full.
    pub fn check(&self, key: &str) -> Result<(), OnboardingError> {
        self.check_at(key, Utc::now())
    }

    /// Clock-injected variant for deterministic tests.
    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<(), OnboardingError> {
        let cutoff = now
            .checked_sub_signed(
                chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX),
            )
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|t| *t > cutoff);

        if entry.len() >= self.max_attempts as usize {
            return Err(OnboardingError::RateLimited {
                action: self.action,
            });
        }
        entry.push(now);
        Ok(())
    }
}

/// Persists wizard progress through the repository.
///
/// Submission attempts and auto-saves are limited independently so a
/// burst of debounced auto-saves can never lock the user out of the
/// manual next/complete actions.
pub struct ProgressStore {
    repo: Arc<dyn Repository>,
    update_limiter: RateLimiter,
    autosave_limiter: RateLimiter,
}

impl ProgressStore {
    pub fn new(repo: Arc<dyn Repository>, config: &OnboardingConfig) -> Self {
        Self {
            repo,
            update_limiter: RateLimiter::new(
                "update",
                config.max_update_attempts,
                config.rate_limit_window,
            ),
            autosave_limiter: RateLimiter::new(
                "autosave",
                config.max_autosave_attempts,
                config.rate_limit_window,
            ),
        }
    }

    /// Record a submission attempt against the update limit.
    ///
    /// The controller calls this before touching any records so a
    /// rate-limited submission performs no writes at all.
    pub fn check_rate(&self, user_id: &str) -> Result<(), OnboardingError> {
        self.update_limiter.check(user_id)
    }

    /// Mark `step` completed and store its payload snapshot.
    ///
    /// Read-merge-upsert keyed by identity: the payload shallow-replaces
    /// `step_data[step]`, the step joins `completed_steps`, the cursor
    /// moves to `step + 1` capped at the final step, and `completed_at`
    /// is stamped when `step` is the final one. The single-row-per-user
    /// guarantee comes from the store's uniqueness constraint plus a
    /// true upsert.
    pub async fn upsert_progress(
        &self,
        user_id: &str,
        step: u32,
        payload: serde_json::Value,
        final_step: u32,
    ) -> Result<ProgressRecord, OnboardingError> {
        self.check_rate(user_id)?;
        self.apply(user_id, step, payload, final_step).await
    }

    /// The merge half of `upsert_progress`, with no rate accounting.
    pub async fn apply(
        &self,
        user_id: &str,
        step: u32,
        payload: serde_json::Value,
        final_step: u32,
    ) -> Result<ProgressRecord, OnboardingError> {
        let now = Utc::now();
        let mut record = self
            .repo
            .get_progress(user_id)
            .await?
            .unwrap_or_else(|| ProgressRecord::new(user_id));

        record.step_data.insert(step.to_string(), payload);
        if !record.completed_steps.contains(&step) {
            record.completed_steps.push(step);
            record.completed_steps.sort_unstable();
        }
        record.current_step = (step + 1).min(final_step);
        record.last_activity = now;
        if step >= final_step {
            record.completed_at = Some(now);
        }

        let stored = self.repo.upsert_progress(&record).await?;
        Ok(stored)
    }

    /// Best-effort auto-save of partial step data.
    ///
    /// Touches only `step_data` and `last_activity` — a keystroke burst
    /// must never mark a step completed or move the cursor.
    pub async fn save_partial(
        &self,
        user_id: &str,
        step: u32,
        payload: serde_json::Value,
    ) -> Result<ProgressRecord, OnboardingError> {
        self.autosave_limiter.check(user_id)?;

        let mut record = self
            .repo
            .get_progress(user_id)
            .await?
            .unwrap_or_else(|| ProgressRecord::new(user_id));

        record.step_data.insert(step.to_string(), payload);
        record.last_activity = Utc::now();

        let stored = self.repo.upsert_progress(&record).await?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;
    use serde_json::json;

    fn store() -> ProgressStore {
        ProgressStore::new(Arc::new(MemoryRepository::new()), &OnboardingConfig::default())
    }

    #[tokio::test]
    async fn sequential_upserts_accumulate_into_one_record() {
        let store = store();

        let first = store
            .upsert_progress("u1", 1, json!({"first_name": "Ann"}), 3)
            .await
            .unwrap();
        assert_eq!(first.current_step, 2);
        assert_eq!(first.completed_steps, vec![1]);

        let second = store
            .upsert_progress("u1", 2, json!({"city": "Springfield"}), 3)
            .await
            .unwrap();
        assert_eq!(second.current_step, 3);
        assert_eq!(second.completed_steps, vec![1, 2]);
        assert_eq!(second.step_data["1"]["first_name"], "Ann");
        assert_eq!(second.step_data["2"]["city"], "Springfield");
        assert!(second.completed_at.is_none());
    }

    #[tokio::test]
    async fn final_step_stamps_completion_and_caps_cursor() {
        let store = store();
        store.upsert_progress("u1", 1, json!({}), 3).await.unwrap();
        store.upsert_progress("u1", 2, json!({}), 3).await.unwrap();
        let done = store.upsert_progress("u1", 3, json!({}), 3).await.unwrap();

        assert_eq!(done.current_step, 3);
        assert_eq!(done.completed_steps, vec![1, 2, 3]);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn resubmitting_a_step_replaces_its_snapshot_only() {
        let store = store();
        store
            .upsert_progress("u1", 1, json!({"first_name": "Ann", "bio": "hi"}), 3)
            .await
            .unwrap();
        let updated = store
            .upsert_progress("u1", 1, json!({"first_name": "Anne"}), 3)
            .await
            .unwrap();

        // Shallow replace at the step key, not a deep merge.
        assert_eq!(updated.step_data["1"], json!({"first_name": "Anne"}));
        assert_eq!(updated.completed_steps, vec![1]);
        assert_eq!(updated.current_step, 2);
    }

    #[tokio::test]
    async fn autosave_never_marks_steps_completed() {
        let store = store();
        let saved = store
            .save_partial("u1", 1, json!({"first_name": "An"}))
            .await
            .unwrap();

        assert!(saved.completed_steps.is_empty());
        assert_eq!(saved.current_step, 1);
        assert!(saved.completed_at.is_none());
        assert_eq!(saved.step_data["1"]["first_name"], "An");
    }

    #[tokio::test]
    async fn sixth_update_within_window_is_rejected() {
        let store = store();
        for _ in 0..5 {
            store.upsert_progress("u1", 1, json!({}), 3).await.unwrap();
        }
        let err = store.upsert_progress("u1", 1, json!({}), 3).await.unwrap_err();
        assert!(matches!(err, OnboardingError::RateLimited { .. }));

        // A different user is unaffected.
        store.upsert_progress("u2", 1, json!({}), 3).await.unwrap();
    }

    #[test]
    fn window_rolls_over() {
        let limiter = RateLimiter::new("update", 2, Duration::from_secs(3600));
        let start = Utc::now();

        limiter.check_at("u1", start).unwrap();
        limiter
            .check_at("u1", start + chrono::Duration::seconds(10))
            .unwrap();
        assert!(limiter
            .check_at("u1", start + chrono::Duration::seconds(20))
            .is_err());

        // Just past the window from the first attempt, one slot frees up.
        let later = start + chrono::Duration::seconds(3601);
        limiter.check_at("u1", later).unwrap();
        assert!(limiter.check_at("u1", later).is_err());
    }

    #[test]
    fn limiters_are_keyed_per_identity() {
        let limiter = RateLimiter::new("update", 1, Duration::from_secs(3600));
        let now = Utc::now();
        limiter.check_at("u1", now).unwrap();
        limiter.check_at("u2", now).unwrap();
        assert!(limiter.check_at("u1", now).is_err());
    }
}
