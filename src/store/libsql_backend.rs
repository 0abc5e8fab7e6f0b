//! libSQL backend — async `Repository` implementation.
//!
//! Supports local file and in-memory databases. All timestamps are stored
//! as RFC 3339 text; list and map columns are stored as JSON text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{AddressRecord, PreferenceRecord, ProfileRecord, ProgressRecord};
use crate::store::migrations;
use crate::store::traits::Repository;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn string_list_from_json(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

// ── Row mappers ─────────────────────────────────────────────────────

const PROFILE_COLUMNS: &str = "id, user_id, first_name, middle_name, last_name, email, phone, date_of_birth, bio, avatar_url, created_at, updated_at";

const ADDRESS_COLUMNS: &str =
    "id, profile_id, unit, street, city, state, postal_code, country, created_at, updated_at";

const PREFS_COLUMNS: &str = "id, profile_id, experience, risk_tolerance, timeline, income_band, net_worth_band, investment_goals, preferred_sectors, wants_advisor, previous_investments, created_at, updated_at";

const PROGRESS_COLUMNS: &str =
    "user_id, current_step, completed_steps, step_data, started_at, last_activity, completed_at";

fn row_to_profile(row: &libsql::Row) -> Result<ProfileRecord, libsql::Error> {
    let id_str: String = row.get(0)?;
    let dob_str: String = row.get(7)?;
    let created_str: String = row.get(10)?;
    let updated_str: String = row.get(11)?;

    Ok(ProfileRecord {
        id: parse_uuid(&id_str),
        user_id: row.get(1)?,
        first_name: row.get(2)?,
        middle_name: row.get(3).ok(),
        last_name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6).ok(),
        date_of_birth: parse_date(&dob_str),
        bio: row.get(8).ok(),
        avatar_url: row.get(9).ok(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

fn row_to_address(row: &libsql::Row) -> Result<AddressRecord, libsql::Error> {
    let id_str: String = row.get(0)?;
    let profile_str: String = row.get(1)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;

    Ok(AddressRecord {
        id: parse_uuid(&id_str),
        profile_id: parse_uuid(&profile_str),
        unit: row.get(2).ok(),
        street: row.get(3)?,
        city: row.get(4)?,
        state: row.get(5)?,
        postal_code: row.get(6)?,
        country: row.get(7)?,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

fn row_to_preferences(row: &libsql::Row) -> Result<PreferenceRecord, libsql::Error> {
    let id_str: String = row.get(0)?;
    let profile_str: String = row.get(1)?;
    let experience_str: String = row.get(2)?;
    let risk_str: String = row.get(3)?;
    let timeline_str: String = row.get(4)?;
    let income_str: Option<String> = row.get(5).ok();
    let net_worth_str: Option<String> = row.get(6).ok();
    let goals_str: String = row.get(7)?;
    let sectors_str: String = row.get(8)?;
    let advisor: i64 = row.get(9)?;
    let previous_str: String = row.get(10)?;
    let created_str: String = row.get(11)?;
    let updated_str: String = row.get(12)?;

    Ok(PreferenceRecord {
        id: parse_uuid(&id_str),
        profile_id: parse_uuid(&profile_str),
        experience: experience_str.parse().unwrap_or_default(),
        risk_tolerance: risk_str.parse().unwrap_or_default(),
        timeline: timeline_str.parse().unwrap_or_default(),
        income_band: income_str.and_then(|s| s.parse().ok()),
        net_worth_band: net_worth_str.and_then(|s| s.parse().ok()),
        investment_goals: string_list_from_json(&goals_str),
        preferred_sectors: string_list_from_json(&sectors_str),
        wants_advisor: advisor != 0,
        previous_investments: string_list_from_json(&previous_str),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

fn row_to_progress(row: &libsql::Row) -> Result<ProgressRecord, libsql::Error> {
    let current_step: i64 = row.get(1)?;
    let completed_str: String = row.get(2)?;
    let data_str: String = row.get(3)?;
    let started_str: String = row.get(4)?;
    let activity_str: String = row.get(5)?;
    let completed_at_str: Option<String> = row.get(6).ok();

    Ok(ProgressRecord {
        user_id: row.get(0)?,
        current_step: current_step.max(1) as u32,
        completed_steps: serde_json::from_str(&completed_str).unwrap_or_default(),
        step_data: serde_json::from_str(&data_str).unwrap_or_default(),
        started_at: parse_datetime(&started_str),
        last_activity: parse_datetime(&activity_str),
        completed_at: parse_optional_datetime(&completed_at_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Repository for LibSqlBackend {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let profile = row_to_profile(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_profile row parse: {e}")))?;
                Ok(Some(profile))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_profile: {e}"))),
        }
    }

    async fn upsert_profile(
        &self,
        profile: &ProfileRecord,
    ) -> Result<ProfileRecord, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO profiles (id, user_id, first_name, middle_name, last_name, email, phone, date_of_birth, bio, avatar_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(user_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    middle_name = excluded.middle_name,
                    last_name = excluded.last_name,
                    email = excluded.email,
                    phone = excluded.phone,
                    date_of_birth = excluded.date_of_birth,
                    bio = excluded.bio,
                    avatar_url = excluded.avatar_url,
                    updated_at = excluded.updated_at",
                params![
                    profile.id.to_string(),
                    profile.user_id.as_str(),
                    profile.first_name.as_str(),
                    opt_text_owned(profile.middle_name.clone()),
                    profile.last_name.as_str(),
                    profile.email.as_str(),
                    opt_text_owned(profile.phone.clone()),
                    profile.date_of_birth.format("%Y-%m-%d").to_string(),
                    opt_text_owned(profile.bio.clone()),
                    opt_text_owned(profile.avatar_url.clone()),
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_profile: {e}")))?;

        // Read back so the caller sees the stored id/created_at when the
        // conflict branch kept an existing row.
        self.get_profile(&profile.user_id)
            .await?
            .ok_or_else(|| DatabaseError::Query("upsert_profile: row vanished".to_string()))
    }

    async fn get_address(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<AddressRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE profile_id = ?1"),
                params![profile_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_address: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let address = row_to_address(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_address row parse: {e}")))?;
                Ok(Some(address))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_address: {e}"))),
        }
    }

    async fn upsert_address(
        &self,
        address: &AddressRecord,
    ) -> Result<AddressRecord, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO addresses (id, profile_id, unit, street, city, state, postal_code, country, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(profile_id) DO UPDATE SET
                    unit = excluded.unit,
                    street = excluded.street,
                    city = excluded.city,
                    state = excluded.state,
                    postal_code = excluded.postal_code,
                    country = excluded.country,
                    updated_at = excluded.updated_at",
                params![
                    address.id.to_string(),
                    address.profile_id.to_string(),
                    opt_text_owned(address.unit.clone()),
                    address.street.as_str(),
                    address.city.as_str(),
                    address.state.as_str(),
                    address.postal_code.as_str(),
                    address.country.as_str(),
                    address.created_at.to_rfc3339(),
                    address.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_address: {e}")))?;

        self.get_address(address.profile_id)
            .await?
            .ok_or_else(|| DatabaseError::Query("upsert_address: row vanished".to_string()))
    }

    async fn get_preferences(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<PreferenceRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PREFS_COLUMNS} FROM investment_profiles WHERE profile_id = ?1"
                ),
                params![profile_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_preferences: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let prefs = row_to_preferences(&row).map_err(|e| {
                    DatabaseError::Query(format!("get_preferences row parse: {e}"))
                })?;
                Ok(Some(prefs))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_preferences: {e}"))),
        }
    }

    async fn upsert_preferences(
        &self,
        preferences: &PreferenceRecord,
    ) -> Result<PreferenceRecord, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO investment_profiles (id, profile_id, experience, risk_tolerance, timeline, income_band, net_worth_band, investment_goals, preferred_sectors, wants_advisor, previous_investments, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(profile_id) DO UPDATE SET
                    experience = excluded.experience,
                    risk_tolerance = excluded.risk_tolerance,
                    timeline = excluded.timeline,
                    income_band = excluded.income_band,
                    net_worth_band = excluded.net_worth_band,
                    investment_goals = excluded.investment_goals,
                    preferred_sectors = excluded.preferred_sectors,
                    wants_advisor = excluded.wants_advisor,
                    previous_investments = excluded.previous_investments,
                    updated_at = excluded.updated_at",
                params![
                    preferences.id.to_string(),
                    preferences.profile_id.to_string(),
                    preferences.experience.to_string(),
                    preferences.risk_tolerance.to_string(),
                    preferences.timeline.to_string(),
                    opt_text_owned(preferences.income_band.map(|b| b.to_string())),
                    opt_text_owned(preferences.net_worth_band.map(|b| b.to_string())),
                    to_json_text(&preferences.investment_goals)?,
                    to_json_text(&preferences.preferred_sectors)?,
                    preferences.wants_advisor as i64,
                    to_json_text(&preferences.previous_investments)?,
                    preferences.created_at.to_rfc3339(),
                    preferences.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_preferences: {e}")))?;

        self.get_preferences(preferences.profile_id)
            .await?
            .ok_or_else(|| DatabaseError::Query("upsert_preferences: row vanished".to_string()))
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<ProgressRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PROGRESS_COLUMNS} FROM onboarding_progress WHERE user_id = ?1"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_progress: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let progress = row_to_progress(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_progress row parse: {e}")))?;
                Ok(Some(progress))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_progress: {e}"))),
        }
    }

    async fn upsert_progress(
        &self,
        progress: &ProgressRecord,
    ) -> Result<ProgressRecord, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO onboarding_progress (user_id, current_step, completed_steps, step_data, started_at, last_activity, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                    current_step = excluded.current_step,
                    completed_steps = excluded.completed_steps,
                    step_data = excluded.step_data,
                    last_activity = excluded.last_activity,
                    completed_at = excluded.completed_at",
                params![
                    progress.user_id.as_str(),
                    progress.current_step as i64,
                    to_json_text(&progress.completed_steps)?,
                    to_json_text(&progress.step_data)?,
                    progress.started_at.to_rfc3339(),
                    progress.last_activity.to_rfc3339(),
                    opt_text_owned(progress.completed_at.map(|t| t.to_rfc3339())),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_progress: {e}")))?;

        self.get_progress(&progress.user_id)
            .await?
            .ok_or_else(|| DatabaseError::Query("upsert_progress: row vanished".to_string()))
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), DatabaseError> {
        let profile = self.get_profile(user_id).await?;

        if let Some(profile) = profile {
            let profile_id = profile.id.to_string();
            // Explicit child deletes; foreign_keys pragma is not assumed.
            self.conn()
                .execute(
                    "DELETE FROM investment_profiles WHERE profile_id = ?1",
                    params![profile_id.as_str()],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("delete_profile prefs: {e}")))?;
            self.conn()
                .execute(
                    "DELETE FROM addresses WHERE profile_id = ?1",
                    params![profile_id.as_str()],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("delete_profile address: {e}")))?;
            self.conn()
                .execute("DELETE FROM profiles WHERE id = ?1", params![profile_id.as_str()])
                .await
                .map_err(|e| DatabaseError::Query(format!("delete_profile: {e}")))?;
        }

        self.conn()
            .execute(
                "DELETE FROM onboarding_progress WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_profile progress: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{ExperienceTier, InvestmentTimeline, RiskTolerance};

    fn profile(user_id: &str) -> ProfileRecord {
        let now = Utc::now();
        ProfileRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            first_name: "Ann".into(),
            middle_name: None,
            last_name: "Lee".into(),
            email: "a@x.com".into(),
            phone: Some("+14155550123".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn profile_upsert_roundtrip() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        assert!(backend.get_profile("u1").await.unwrap().is_none());

        let stored = backend.upsert_profile(&profile("u1")).await.unwrap();
        assert_eq!(stored.first_name, "Ann");
        assert_eq!(
            stored.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap()
        );

        let fetched = backend.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.phone.as_deref(), Some("+14155550123"));
    }

    #[tokio::test]
    async fn profile_resubmission_keeps_one_row_and_original_id() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        let first = backend.upsert_profile(&profile("u1")).await.unwrap();

        let mut second = profile("u1");
        second.first_name = "Anne".into();
        let stored = backend.upsert_profile(&second).await.unwrap();

        // Conflict branch keeps the existing row's id.
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.first_name, "Anne");
    }

    #[tokio::test]
    async fn address_and_preferences_roundtrip() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        let stored = backend.upsert_profile(&profile("u1")).await.unwrap();
        let now = Utc::now();

        let address = AddressRecord {
            id: Uuid::new_v4(),
            profile_id: stored.id,
            unit: None,
            street: "123 Main Street".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62704".into(),
            country: "US".into(),
            created_at: now,
            updated_at: now,
        };
        backend.upsert_address(&address).await.unwrap();
        let fetched = backend.get_address(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.street, "123 Main Street");

        let prefs = PreferenceRecord {
            id: Uuid::new_v4(),
            profile_id: stored.id,
            experience: ExperienceTier::Intermediate,
            risk_tolerance: RiskTolerance::Aggressive,
            timeline: InvestmentTimeline::ShortTerm,
            income_band: None,
            net_worth_band: None,
            investment_goals: vec!["Retirement Planning".into()],
            preferred_sectors: vec!["Technology".into()],
            wants_advisor: true,
            previous_investments: vec![],
            created_at: now,
            updated_at: now,
        };
        backend.upsert_preferences(&prefs).await.unwrap();
        let fetched = backend.get_preferences(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.experience, ExperienceTier::Intermediate);
        assert_eq!(fetched.investment_goals, vec!["Retirement Planning"]);
        assert!(fetched.wants_advisor);
    }

    #[tokio::test]
    async fn progress_upserts_never_duplicate() {
        let backend = LibSqlBackend::new_memory().await.unwrap();

        let mut progress = ProgressRecord::new("u1");
        progress.completed_steps = vec![1];
        progress.current_step = 2;
        backend.upsert_progress(&progress).await.unwrap();

        progress.completed_steps = vec![1, 2];
        progress.current_step = 3;
        let stored = backend.upsert_progress(&progress).await.unwrap();
        assert_eq!(stored.completed_steps, vec![1, 2]);
        assert_eq!(stored.current_step, 3);

        let mut rows = backend
            .conn()
            .query(
                "SELECT COUNT(*) FROM onboarding_progress WHERE user_id = 'u1'",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn delete_profile_removes_owned_records() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        let stored = backend.upsert_profile(&profile("u1")).await.unwrap();
        let now = Utc::now();
        backend
            .upsert_address(&AddressRecord {
                id: Uuid::new_v4(),
                profile_id: stored.id,
                unit: None,
                street: "123 Main Street".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                postal_code: "62704".into(),
                country: "US".into(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        backend
            .upsert_progress(&ProgressRecord::new("u1"))
            .await
            .unwrap();

        backend.delete_profile("u1").await.unwrap();

        assert!(backend.get_profile("u1").await.unwrap().is_none());
        assert!(backend.get_address(stored.id).await.unwrap().is_none());
        assert!(backend.get_progress("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("onboard.db");

        {
            let backend = LibSqlBackend::new_local(&path).await.unwrap();
            backend.upsert_profile(&profile("u1")).await.unwrap();
        }

        let backend = LibSqlBackend::new_local(&path).await.unwrap();
        let fetched = backend.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(fetched.first_name, "Ann");
    }
}
