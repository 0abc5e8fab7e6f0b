//! Step resolution — where should a resuming session land?
//!
//! Highest completion wins: the terminal investment profile beats the
//! address, the address beats the profile, nothing means step 1. Lookup
//! failures are logged and resolved as step 1; resolution never fails.

use tracing::warn;

use crate::store::Repository;

use super::flow::{ADDRESS_STEP, FlowConfig, PROFILE_STEP};

/// Outcome of resolving a resuming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Step the session should present.
    pub step: u32,
    /// Whether every step has already been completed; the final step is
    /// then shown as a review rather than a form.
    pub complete: bool,
}

/// Compute the resume step for a user from the records that already exist.
pub async fn resolve_step(repo: &dyn Repository, flow: &FlowConfig, user_id: &str) -> Resolution {
    let fresh = Resolution {
        step: PROFILE_STEP,
        complete: false,
    };

    let profile = match repo.get_profile(user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return fresh,
        Err(e) => {
            warn!(user_id, error = %e, "Step resolution lookup failed, defaulting to step 1");
            return fresh;
        }
    };

    match repo.get_preferences(profile.id).await {
        Ok(Some(_)) => {
            return Resolution {
                step: flow.final_step,
                complete: true,
            };
        }
        Ok(None) => {}
        Err(e) => {
            warn!(user_id, error = %e, "Step resolution lookup failed, defaulting to step 1");
            return fresh;
        }
    }

    match repo.get_address(profile.id).await {
        Ok(Some(_)) => Resolution {
            step: ADDRESS_STEP + 1,
            complete: false,
        },
        Ok(None) => Resolution {
            step: PROFILE_STEP + 1,
            complete: false,
        },
        Err(e) => {
            warn!(user_id, error = %e, "Step resolution lookup failed, defaulting to step 1");
            fresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::flow::FlowConfig;
    use crate::onboarding::model::{
        AddressRecord, ExperienceTier, InvestmentTimeline, PreferenceRecord, ProfileRecord,
        RiskTolerance,
    };
    use crate::store::MemoryRepository;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn profile(user_id: &str) -> ProfileRecord {
        let now = Utc::now();
        ProfileRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            first_name: "Ann".into(),
            middle_name: None,
            last_name: "Lee".into(),
            email: "a@x.com".into(),
            phone: None,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn address(profile_id: Uuid) -> AddressRecord {
        let now = Utc::now();
        AddressRecord {
            id: Uuid::new_v4(),
            profile_id,
            unit: None,
            street: "123 Main Street".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62704".into(),
            country: "US".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn preferences(profile_id: Uuid) -> PreferenceRecord {
        let now = Utc::now();
        PreferenceRecord {
            id: Uuid::new_v4(),
            profile_id,
            experience: ExperienceTier::Beginner,
            risk_tolerance: RiskTolerance::Moderate,
            timeline: InvestmentTimeline::LongTerm,
            income_band: None,
            net_worth_band: None,
            investment_goals: vec!["Retirement Planning".into()],
            preferred_sectors: vec![],
            wants_advisor: false,
            previous_investments: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn no_records_resolves_to_step_one() {
        let repo = MemoryRepository::new();
        let flow = FlowConfig::generic();
        let resolution = resolve_step(&repo, &flow, "u1").await;
        assert_eq!(resolution, Resolution { step: 1, complete: false });
    }

    #[tokio::test]
    async fn profile_only_resolves_to_step_two() {
        let repo = MemoryRepository::new();
        repo.upsert_profile(&profile("u1")).await.unwrap();

        let resolution = resolve_step(&repo, &FlowConfig::generic(), "u1").await;
        assert_eq!(resolution, Resolution { step: 2, complete: false });
    }

    #[tokio::test]
    async fn profile_and_address_resolve_to_step_three() {
        let repo = MemoryRepository::new();
        let stored = repo.upsert_profile(&profile("u1")).await.unwrap();
        repo.upsert_address(&address(stored.id)).await.unwrap();

        let resolution = resolve_step(&repo, &FlowConfig::generic(), "u1").await;
        assert_eq!(resolution, Resolution { step: 3, complete: false });
    }

    #[tokio::test]
    async fn all_records_resolve_to_terminal() {
        let repo = MemoryRepository::new();
        let stored = repo.upsert_profile(&profile("u1")).await.unwrap();
        repo.upsert_address(&address(stored.id)).await.unwrap();
        repo.upsert_preferences(&preferences(stored.id)).await.unwrap();

        let resolution = resolve_step(&repo, &FlowConfig::investor(), "u1").await;
        assert_eq!(resolution, Resolution { step: 3, complete: true });
    }

    #[tokio::test]
    async fn lookup_failure_defaults_to_step_one() {
        let repo = MemoryRepository::new();
        repo.upsert_profile(&profile("u1")).await.unwrap();
        repo.set_failing(true);

        let resolution = resolve_step(&repo, &FlowConfig::generic(), "u1").await;
        assert_eq!(resolution, Resolution { step: 1, complete: false });
    }
}
