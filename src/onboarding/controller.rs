//! Onboarding controller — per-session state machine and the service
//! that owns the sessions.
//!
//! A session loads by resolving the resume step from existing records,
//! then dispatches submit / previous / skip / auto-save. Validation
//! failures block transitions with field errors; backend failures keep
//! the user on the current step with a single general message; auto-save
//! failures are logged and only ever reach the transient status
//! indicator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::config::OnboardingConfig;
use crate::error::{DatabaseError, Error, FieldError, OnboardingError, UploadError};
use crate::store::Repository;
use crate::upload::{BlobStore, UploadConstraints};

use super::flow::{FlowConfig, FlowVariant};
use super::model::{
    AddressInput, AddressRecord, PreferenceRecord, PreferencesInput, ProfileInput, ProfileRecord,
    StepInput,
};
use super::progress::ProgressStore;
use super::resolver;
use super::sanitize::{sanitize, sanitize_opt};
use super::state::WizardCursor;
use super::validate::validate_step;

/// Transient auto-save indicator shown by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

/// Result of a step submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Step persisted; the wizard moved to `step`.
    Advanced { step: u32 },
    /// Final step persisted; onboarding is terminal and navigation is
    /// handed back to the caller.
    Completed,
    /// Validation failed; nothing was persisted.
    Invalid { errors: Vec<FieldError> },
    /// Too many submission attempts; nothing was persisted.
    RateLimited { message: String },
    /// Backend failure; the session stays on the current step.
    Failed { message: String },
}

/// Snapshot of a session for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub user_id: String,
    pub flow: FlowVariant,
    pub current_step: u32,
    pub complete: bool,
    pub completed_steps: Vec<u32>,
    pub save_status: SaveStatus,
}

/// One user's active wizard session.
pub struct OnboardingSession {
    user_id: String,
    flow: FlowConfig,
    repo: Arc<dyn Repository>,
    progress: Arc<ProgressStore>,
    config: OnboardingConfig,
    cursor: RwLock<WizardCursor>,
    profile_id: RwLock<Option<Uuid>>,
    status_tx: watch::Sender<SaveStatus>,
    autosave_task: StdMutex<Option<JoinHandle<()>>>,
    revert_task: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl OnboardingSession {
    /// Fetch existing records, resolve the resume step, and build the
    /// session. Callers see no intermediate state — the async load is
    /// the wizard's loading phase.
    pub async fn load(
        repo: Arc<dyn Repository>,
        progress: Arc<ProgressStore>,
        config: OnboardingConfig,
        flow: FlowConfig,
        user_id: impl Into<String>,
    ) -> Arc<Self> {
        let user_id = user_id.into();
        let resolution = resolver::resolve_step(repo.as_ref(), &flow, &user_id).await;
        let profile_id = repo
            .get_profile(&user_id)
            .await
            .ok()
            .flatten()
            .map(|p| p.id);

        let cursor = if resolution.complete {
            WizardCursor::completed(flow.final_step)
        } else {
            WizardCursor::at(resolution.step)
        };

        let (status_tx, _) = watch::channel(SaveStatus::Idle);
        Arc::new(Self {
            user_id,
            flow,
            repo,
            progress,
            config,
            cursor: RwLock::new(cursor),
            profile_id: RwLock::new(profile_id),
            status_tx,
            autosave_task: StdMutex::new(None),
            revert_task: Arc::new(StdMutex::new(None)),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.flow
    }

    pub async fn current_step(&self) -> u32 {
        self.cursor.read().await.current_step
    }

    pub async fn is_complete(&self) -> bool {
        self.cursor.read().await.complete
    }

    /// Subscribe to the auto-save status indicator.
    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.status_tx.subscribe()
    }

    /// Submit the current step's fields.
    ///
    /// Dispatching input for any other step is a transition error; all
    /// recoverable conditions are reported through [`SubmitOutcome`].
    pub async fn submit(&self, input: StepInput) -> Result<SubmitOutcome, OnboardingError> {
        self.cancel_pending_autosave();

        let cursor = *self.cursor.read().await;
        if cursor.complete {
            return Err(OnboardingError::InvalidTransition {
                step: cursor.current_step,
                reason: "onboarding is already complete".to_string(),
            });
        }
        if input.step() != cursor.current_step {
            return Err(OnboardingError::InvalidTransition {
                step: cursor.current_step,
                reason: format!("received fields for step {}", input.step()),
            });
        }

        let errors = validate_step(&input, &self.flow);
        if !errors.is_empty() {
            return Ok(SubmitOutcome::Invalid { errors });
        }

        // Count the attempt before any write so a rate-limited submission
        // touches nothing.
        if let Err(e) = self.progress.check_rate(&self.user_id) {
            return Ok(SubmitOutcome::RateLimited {
                message: e.to_string(),
            });
        }

        let sanitized = sanitize_input(input);
        if let Err(e) = self.persist_records(&sanitized).await {
            warn!(user_id = %self.user_id, step = cursor.current_step, error = %e, "Step save failed");
            return Ok(SubmitOutcome::Failed {
                message: "Could not save your information. Please try again.".to_string(),
            });
        }

        let snapshot = step_snapshot(&sanitized);
        if let Err(e) = self
            .progress
            .apply(&self.user_id, cursor.current_step, snapshot, self.flow.final_step)
            .await
        {
            warn!(user_id = %self.user_id, step = cursor.current_step, error = %e, "Progress save failed");
            return Ok(SubmitOutcome::Failed {
                message: "Could not save your progress. Please try again.".to_string(),
            });
        }

        let mut cursor_guard = self.cursor.write().await;
        if cursor_guard.current_step < self.flow.final_step {
            let step = cursor_guard
                .advance(&self.flow)
                .map_err(|reason| OnboardingError::InvalidTransition {
                    step: cursor_guard.current_step,
                    reason,
                })?;
            Ok(SubmitOutcome::Advanced { step })
        } else {
            cursor_guard
                .finish(&self.flow)
                .map_err(|reason| OnboardingError::InvalidTransition {
                    step: cursor_guard.current_step,
                    reason,
                })?;
            Ok(SubmitOutcome::Completed)
        }
    }

    /// Move back one step. Data already persisted is untouched.
    pub async fn previous(&self) -> Result<u32, OnboardingError> {
        self.cancel_pending_autosave();
        let mut cursor = self.cursor.write().await;
        let step = cursor.current_step;
        cursor
            .retreat()
            .map_err(|reason| OnboardingError::InvalidTransition { step, reason })
    }

    /// Skip the wizard from step 1 (investor flow only). Persists nothing
    /// and hands navigation straight back to the caller.
    pub async fn skip(&self) -> Result<(), OnboardingError> {
        self.cancel_pending_autosave();
        let cursor = *self.cursor.read().await;
        if !cursor.can_skip(&self.flow) {
            return Err(OnboardingError::InvalidTransition {
                step: cursor.current_step,
                reason: "skip is only available on step 1 of the investor flow".to_string(),
            });
        }
        Ok(())
    }

    /// Queue a debounced best-effort auto-save of partial step data.
    ///
    /// Each call resets the quiet-period timer, so only the last burst
    /// member actually writes. Failures are logged and surface only in
    /// the transient status indicator.
    pub fn queue_autosave(&self, step: u32, fields: serde_json::Value) {
        let mut guard = self
            .autosave_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = guard.take() {
            pending.abort();
        }

        let progress = Arc::clone(&self.progress);
        let user_id = self.user_id.clone();
        let status_tx = self.status_tx.clone();
        let revert_slot = Arc::clone(&self.revert_task);
        let debounce = self.config.autosave_debounce;
        let revert_after = self.config.save_status_revert;

        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            status_tx.send_replace(SaveStatus::Saving);
            let status = match progress.save_partial(&user_id, step, fields).await {
                Ok(_) => SaveStatus::Saved,
                Err(e) => {
                    warn!(user_id = %user_id, step, error = %e, "Auto-save failed");
                    SaveStatus::Error
                }
            };
            status_tx.send_replace(status);

            let tx = status_tx.clone();
            let revert = tokio::spawn(async move {
                tokio::time::sleep(revert_after).await;
                tx.send_replace(SaveStatus::Idle);
            });
            let mut slot = revert_slot.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(old) = slot.replace(revert) {
                old.abort();
            }
        }));
    }

    /// Session status for the REST surface.
    pub async fn status(&self) -> SessionStatus {
        let cursor = *self.cursor.read().await;
        let completed_steps = self
            .repo
            .get_progress(&self.user_id)
            .await
            .ok()
            .flatten()
            .map(|p| p.completed_steps)
            .unwrap_or_default();

        SessionStatus {
            user_id: self.user_id.clone(),
            flow: self.flow.variant,
            current_step: cursor.current_step,
            complete: cursor.complete,
            completed_steps,
            save_status: *self.status_tx.borrow(),
        }
    }

    /// Cancel scheduled tasks. Called on teardown so no write fires
    /// after the session is gone.
    pub fn shutdown(&self) {
        self.cancel_pending_autosave();
        let mut slot = self.revert_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }

    fn cancel_pending_autosave(&self) {
        let mut guard = self
            .autosave_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(task) = guard.take() {
            task.abort();
        }
    }

    async fn persist_records(&self, input: &StepInput) -> Result<(), DatabaseError> {
        match input {
            StepInput::Profile(profile) => {
                let existing = self.repo.get_profile(&self.user_id).await?;
                let record = build_profile(&self.user_id, existing.as_ref(), profile)
                    .map_err(DatabaseError::Serialization)?;
                let stored = self.repo.upsert_profile(&record).await?;
                *self.profile_id.write().await = Some(stored.id);
                Ok(())
            }
            StepInput::Address(address) => {
                let profile_id = self.resolve_profile_id().await?;
                let existing = self.repo.get_address(profile_id).await?;
                let record = build_address(profile_id, existing.as_ref(), address)
                    .map_err(DatabaseError::Serialization)?;
                self.repo.upsert_address(&record).await?;
                Ok(())
            }
            StepInput::Preferences(preferences) => {
                let profile_id = self.resolve_profile_id().await?;
                let existing = self.repo.get_preferences(profile_id).await?;
                let record = build_preferences(profile_id, existing.as_ref(), preferences)
                    .map_err(DatabaseError::Serialization)?;
                self.repo.upsert_preferences(&record).await?;
                Ok(())
            }
        }
    }

    async fn resolve_profile_id(&self) -> Result<Uuid, DatabaseError> {
        if let Some(id) = *self.profile_id.read().await {
            return Ok(id);
        }
        match self.repo.get_profile(&self.user_id).await? {
            Some(profile) => {
                *self.profile_id.write().await = Some(profile.id);
                Ok(profile.id)
            }
            None => Err(DatabaseError::Query(
                "no profile record exists for this user".to_string(),
            )),
        }
    }
}

impl Drop for OnboardingSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Record builders ─────────────────────────────────────────────────────

fn required(value: &Option<String>, field: &str) -> Result<String, String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("missing required field {field}"))
}

fn build_profile(
    user_id: &str,
    existing: Option<&ProfileRecord>,
    input: &ProfileInput,
) -> Result<ProfileRecord, String> {
    let now = Utc::now();
    let dob_raw = required(&input.date_of_birth, "date_of_birth")?;
    let date_of_birth = NaiveDate::parse_from_str(&dob_raw, "%Y-%m-%d")
        .map_err(|e| format!("unparseable date_of_birth: {e}"))?;

    Ok(ProfileRecord {
        id: existing.map(|p| p.id).unwrap_or_else(Uuid::new_v4),
        user_id: user_id.to_string(),
        first_name: required(&input.first_name, "first_name")?,
        middle_name: input.middle_name.clone(),
        last_name: required(&input.last_name, "last_name")?,
        email: required(&input.email, "email")?,
        phone: input.phone.clone(),
        date_of_birth,
        bio: input.bio.clone(),
        avatar_url: existing.and_then(|p| p.avatar_url.clone()),
        created_at: existing.map(|p| p.created_at).unwrap_or(now),
        updated_at: now,
    })
}

fn build_address(
    profile_id: Uuid,
    existing: Option<&AddressRecord>,
    input: &AddressInput,
) -> Result<AddressRecord, String> {
    let now = Utc::now();
    Ok(AddressRecord {
        id: existing.map(|a| a.id).unwrap_or_else(Uuid::new_v4),
        profile_id,
        unit: input.unit.clone(),
        street: required(&input.street, "street")?,
        city: required(&input.city, "city")?,
        state: required(&input.state, "state")?,
        postal_code: required(&input.postal_code, "postal_code")?,
        country: required(&input.country, "country")?,
        created_at: existing.map(|a| a.created_at).unwrap_or(now),
        updated_at: now,
    })
}

fn build_preferences(
    profile_id: Uuid,
    existing: Option<&PreferenceRecord>,
    input: &PreferencesInput,
) -> Result<PreferenceRecord, String> {
    let now = Utc::now();
    let experience = required(&input.experience, "experience")?
        .parse()
        .map_err(|e: String| e)?;
    let risk_tolerance = required(&input.risk_tolerance, "risk_tolerance")?
        .parse()
        .map_err(|e: String| e)?;
    let timeline = required(&input.timeline, "timeline")?
        .parse()
        .map_err(|e: String| e)?;
    let income_band = match input.income_band.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.parse().map_err(|e: String| e)?),
        _ => None,
    };
    let net_worth_band = match input.net_worth_band.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.parse().map_err(|e: String| e)?),
        _ => None,
    };

    Ok(PreferenceRecord {
        id: existing.map(|p| p.id).unwrap_or_else(Uuid::new_v4),
        profile_id,
        experience,
        risk_tolerance,
        timeline,
        income_band,
        net_worth_band,
        investment_goals: input.investment_goals.clone().unwrap_or_default(),
        preferred_sectors: input.preferred_sectors.clone().unwrap_or_default(),
        wants_advisor: input.wants_advisor.unwrap_or(false),
        previous_investments: input.previous_investments.clone().unwrap_or_default(),
        created_at: existing.map(|p| p.created_at).unwrap_or(now),
        updated_at: now,
    })
}

// ── Sanitization ────────────────────────────────────────────────────────

fn trim_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn sanitize_list(list: &Option<Vec<String>>) -> Option<Vec<String>> {
    list.as_ref().map(|items| {
        items
            .iter()
            .map(|item| sanitize(item))
            .filter(|item| !item.is_empty())
            .collect()
    })
}

/// Sanitize free text on its way to the backend. Structured fields
/// (email, phone, dates, enum values) are only trimmed.
fn sanitize_input(input: StepInput) -> StepInput {
    match input {
        StepInput::Profile(p) => StepInput::Profile(ProfileInput {
            first_name: sanitize_opt(p.first_name.as_deref()),
            middle_name: sanitize_opt(p.middle_name.as_deref()),
            last_name: sanitize_opt(p.last_name.as_deref()),
            email: trim_opt(&p.email),
            phone: trim_opt(&p.phone),
            date_of_birth: trim_opt(&p.date_of_birth),
            bio: sanitize_opt(p.bio.as_deref()),
        }),
        StepInput::Address(a) => StepInput::Address(AddressInput {
            unit: sanitize_opt(a.unit.as_deref()),
            street: sanitize_opt(a.street.as_deref()),
            city: sanitize_opt(a.city.as_deref()),
            state: sanitize_opt(a.state.as_deref()),
            postal_code: sanitize_opt(a.postal_code.as_deref()),
            country: sanitize_opt(a.country.as_deref()),
        }),
        StepInput::Preferences(p) => StepInput::Preferences(PreferencesInput {
            experience: trim_opt(&p.experience),
            risk_tolerance: trim_opt(&p.risk_tolerance),
            timeline: trim_opt(&p.timeline),
            income_band: trim_opt(&p.income_band),
            net_worth_band: trim_opt(&p.net_worth_band),
            investment_goals: sanitize_list(&p.investment_goals),
            preferred_sectors: sanitize_list(&p.preferred_sectors),
            wants_advisor: p.wants_advisor,
            previous_investments: sanitize_list(&p.previous_investments),
        }),
    }
}

/// The partial field snapshot persisted into `step_data`.
fn step_snapshot(input: &StepInput) -> serde_json::Value {
    let result = match input {
        StepInput::Profile(p) => serde_json::to_value(p),
        StepInput::Address(a) => serde_json::to_value(a),
        StepInput::Preferences(p) => serde_json::to_value(p),
    };
    result.unwrap_or(serde_json::Value::Null)
}

// ── Service ─────────────────────────────────────────────────────────────

/// Owns the repository, progress store, and the per-user sessions.
pub struct OnboardingService {
    repo: Arc<dyn Repository>,
    progress: Arc<ProgressStore>,
    config: OnboardingConfig,
    blob_store: Option<Arc<dyn BlobStore>>,
    upload_constraints: UploadConstraints,
    sessions: RwLock<HashMap<String, Arc<OnboardingSession>>>,
}

impl OnboardingService {
    pub fn new(repo: Arc<dyn Repository>, config: OnboardingConfig) -> Self {
        let progress = Arc::new(ProgressStore::new(Arc::clone(&repo), &config));
        Self {
            repo,
            progress,
            config,
            blob_store: None,
            upload_constraints: UploadConstraints::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a blob store for the optional avatar upload.
    pub fn with_blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// Get the active session for a user, loading one if needed. At most
    /// one session per identity is kept; a flow change replaces it.
    pub async fn session(
        &self,
        user_id: &str,
        variant: FlowVariant,
    ) -> Arc<OnboardingSession> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(user_id) {
                if session.flow().variant == variant {
                    return Arc::clone(session);
                }
            }
        }

        let session = OnboardingSession::load(
            Arc::clone(&self.repo),
            Arc::clone(&self.progress),
            self.config.clone(),
            FlowConfig::for_variant(variant),
            user_id,
        )
        .await;

        let mut sessions = self.sessions.write().await;
        if let Some(old) = sessions.insert(user_id.to_string(), Arc::clone(&session)) {
            old.shutdown();
        }
        session
    }

    /// Drop a user's session, cancelling its scheduled tasks.
    pub async fn end_session(&self, user_id: &str) {
        if let Some(session) = self.sessions.write().await.remove(user_id) {
            session.shutdown();
        }
    }

    /// Administrative: remove the user's profile and everything it owns.
    pub async fn delete_profile(&self, user_id: &str) -> Result<(), Error> {
        self.end_session(user_id).await;
        self.repo.delete_profile(user_id).await?;
        Ok(())
    }

    /// Store an avatar image and attach its URL to the user's profile.
    ///
    /// Constraints are checked before any backend call.
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        data: Vec<u8>,
        mime: &str,
    ) -> Result<String, Error> {
        self.upload_constraints.check(data.len(), mime)?;

        let store = self.blob_store.as_ref().ok_or_else(|| {
            Error::Upload(UploadError::Backend("no blob store configured".to_string()))
        })?;
        let url = store.store_blob(user_id, data, mime).await?;

        if let Some(mut profile) = self.repo.get_profile(user_id).await? {
            profile.avatar_url = Some(url.clone());
            profile.updated_at = Utc::now();
            self.repo.upsert_profile(&profile).await?;
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;
    use serde_json::json;
    use std::time::Duration;

    fn fast_config() -> OnboardingConfig {
        OnboardingConfig {
            autosave_debounce: Duration::from_millis(20),
            save_status_revert: Duration::from_millis(40),
            ..OnboardingConfig::default()
        }
    }

    async fn session(
        repo: &Arc<MemoryRepository>,
        flow: FlowConfig,
    ) -> Arc<OnboardingSession> {
        let repo: Arc<dyn Repository> = Arc::clone(repo) as Arc<dyn Repository>;
        let config = fast_config();
        let progress = Arc::new(ProgressStore::new(Arc::clone(&repo), &config));
        OnboardingSession::load(repo, progress, config, flow, "u1").await
    }

    fn profile_input() -> StepInput {
        StepInput::Profile(ProfileInput {
            first_name: Some("Ann".into()),
            middle_name: None,
            last_name: Some("Lee".into()),
            email: Some("a@x.com".into()),
            phone: Some("+14155550123".into()),
            date_of_birth: Some("1990-06-15".into()),
            bio: None,
        })
    }

    fn address_input() -> StepInput {
        StepInput::Address(AddressInput {
            unit: None,
            street: Some("123 Main Street".into()),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            postal_code: Some("62704".into()),
            country: Some("US".into()),
        })
    }

    fn preferences_input() -> StepInput {
        StepInput::Preferences(PreferencesInput {
            experience: Some("beginner".into()),
            risk_tolerance: Some("moderate".into()),
            timeline: Some("long_term".into()),
            income_band: None,
            net_worth_band: None,
            investment_goals: Some(vec!["Retirement Planning".into()]),
            preferred_sectors: None,
            wants_advisor: Some(false),
            previous_investments: None,
        })
    }

    #[tokio::test]
    async fn happy_path_walks_to_completion() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::investor()).await;
        assert_eq!(session.current_step().await, 1);

        match session.submit(profile_input()).await.unwrap() {
            SubmitOutcome::Advanced { step } => assert_eq!(step, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match session.submit(address_input()).await.unwrap() {
            SubmitOutcome::Advanced { step } => assert_eq!(step, 3),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match session.submit(preferences_input()).await.unwrap() {
            SubmitOutcome::Completed => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(session.is_complete().await);

        let progress = repo.get_progress("u1").await.unwrap().unwrap();
        assert_eq!(progress.completed_steps, vec![1, 2, 3]);
        assert!(progress.completed_at.is_some());
    }

    #[tokio::test]
    async fn validation_failure_blocks_and_persists_nothing() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;

        let mut input = ProfileInput::default();
        input.email = Some("not-an-email".into());
        match session.submit(StepInput::Profile(input)).await.unwrap() {
            SubmitOutcome::Invalid { errors } => assert!(!errors.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(session.current_step().await, 1);
        assert!(repo.get_profile("u1").await.unwrap().is_none());
        assert!(repo.get_progress("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_step_input_is_a_transition_error() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;

        let err = session.submit(address_input()).await.unwrap_err();
        assert!(matches!(err, OnboardingError::InvalidTransition { step: 1, .. }));
    }

    #[tokio::test]
    async fn backend_failure_keeps_current_step() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;
        repo.set_failing(true);

        match session.submit(profile_input()).await.unwrap() {
            SubmitOutcome::Failed { .. } => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.current_step().await, 1);

        // Manual retry succeeds once the backend recovers.
        repo.set_failing(false);
        match session.submit(profile_input()).await.unwrap() {
            SubmitOutcome::Advanced { step } => assert_eq!(step, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn previous_moves_back_without_discarding_data() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;
        session.submit(profile_input()).await.unwrap();

        assert_eq!(session.previous().await.unwrap(), 1);
        assert!(repo.get_profile("u1").await.unwrap().is_some());
        assert!(session.previous().await.is_err());
    }

    #[tokio::test]
    async fn skip_rules() {
        let repo = Arc::new(MemoryRepository::new());
        let investor = session(&repo, FlowConfig::investor()).await;
        investor.skip().await.unwrap();
        // Nothing was persisted.
        assert!(repo.get_profile("u1").await.unwrap().is_none());

        let generic = session(&repo, FlowConfig::generic()).await;
        assert!(generic.skip().await.is_err());
    }

    #[tokio::test]
    async fn resumed_session_lands_on_resolved_step() {
        let repo = Arc::new(MemoryRepository::new());
        let first = session(&repo, FlowConfig::generic()).await;
        first.submit(profile_input()).await.unwrap();

        let resumed = session(&repo, FlowConfig::generic()).await;
        assert_eq!(resumed.current_step().await, 2);
        assert!(!resumed.is_complete().await);
    }

    #[tokio::test]
    async fn autosave_debounce_is_last_write_wins() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;

        session.queue_autosave(1, json!({"first_name": "A"}));
        session.queue_autosave(1, json!({"first_name": "An"}));
        session.queue_autosave(1, json!({"first_name": "Ann"}));
        tokio::time::sleep(Duration::from_millis(120)).await;

        let progress = repo.get_progress("u1").await.unwrap().unwrap();
        assert_eq!(progress.step_data["1"], json!({"first_name": "Ann"}));
        assert!(progress.completed_steps.is_empty());
        assert_eq!(progress.current_step, 1);

        // Status indicator has reverted to idle.
        let rx = session.save_status();
        assert_eq!(*rx.borrow(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn autosave_failure_is_swallowed() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;
        repo.set_failing(true);

        session.queue_autosave(1, json!({"first_name": "Ann"}));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(*session.save_status().borrow(), SaveStatus::Error);

        // A manual submit still works once the backend is back.
        repo.set_failing(false);
        match session.submit(profile_input()).await.unwrap() {
            SubmitOutcome::Advanced { step } => assert_eq!(step, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_autosave() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;

        session.queue_autosave(1, json!({"first_name": "Ann"}));
        session.shutdown();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(repo.get_progress("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sanitizer_runs_before_persistence() {
        let repo = Arc::new(MemoryRepository::new());
        let session = session(&repo, FlowConfig::generic()).await;

        let input = StepInput::Profile(ProfileInput {
            first_name: Some("  Ann  ".into()),
            middle_name: None,
            last_name: Some("Lee".into()),
            email: Some("a@x.com".into()),
            phone: None,
            date_of_birth: Some("1990-06-15".into()),
            bio: Some("hello <world>".into()),
        });
        session.submit(input).await.unwrap();

        let profile = repo.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.first_name, "Ann");
        assert_eq!(profile.bio.as_deref(), Some("hello world"));
    }
}
