//! Onboarding data model — persisted records, closed enums, and raw step
//! input types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Closed enums ────────────────────────────────────────────────────────

/// Self-reported investing experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Default for ExperienceTier {
    fn default() -> Self {
        Self::Beginner
    }
}

impl std::fmt::Display for ExperienceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ExperienceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            other => Err(format!("unknown experience tier: {other}")),
        }
    }
}

/// Appetite for investment risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl Default for RiskTolerance {
    fn default() -> Self {
        Self::Moderate
    }
}

impl std::fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RiskTolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(Self::Conservative),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!("unknown risk tolerance: {other}")),
        }
    }
}

/// How long the user intends to stay invested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentTimeline {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl Default for InvestmentTimeline {
    fn default() -> Self {
        Self::LongTerm
    }
}

impl std::fmt::Display for InvestmentTimeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for InvestmentTimeline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(Self::ShortTerm),
            "medium_term" => Ok(Self::MediumTerm),
            "long_term" => Ok(Self::LongTerm),
            other => Err(format!("unknown timeline: {other}")),
        }
    }
}

/// Annual income band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBand {
    Under50k,
    From50kTo100k,
    From100kTo250k,
    Over250k,
}

impl std::fmt::Display for IncomeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Under50k => "under_50k",
            Self::From50kTo100k => "from_50k_to_100k",
            Self::From100kTo250k => "from_100k_to_250k",
            Self::Over250k => "over_250k",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for IncomeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "under_50k" => Ok(Self::Under50k),
            "from_50k_to_100k" => Ok(Self::From50kTo100k),
            "from_100k_to_250k" => Ok(Self::From100kTo250k),
            "over_250k" => Ok(Self::Over250k),
            other => Err(format!("unknown income band: {other}")),
        }
    }
}

/// Net worth band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetWorthBand {
    Under100k,
    From100kTo500k,
    From500kTo1m,
    Over1m,
}

impl std::fmt::Display for NetWorthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Under100k => "under_100k",
            Self::From100kTo500k => "from_100k_to_500k",
            Self::From500kTo1m => "from_500k_to_1m",
            Self::Over1m => "over_1m",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NetWorthBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "under_100k" => Ok(Self::Under100k),
            "from_100k_to_500k" => Ok(Self::From100kTo500k),
            "from_500k_to_1m" => Ok(Self::From500kTo1m),
            "over_1m" => Ok(Self::Over1m),
            other => Err(format!("unknown net worth band: {other}")),
        }
    }
}

// ── Persisted records ───────────────────────────────────────────────────

/// Personal information collected on step 1. One per user; created on the
/// first successful save, mutated on resubmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    /// Opaque externally-issued user key.
    pub user_id: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mailing address collected on step 2. Zero-or-one per user, keyed by the
/// profile's generated id; its existence implies step 2 was completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Investment profile collected on step 3. Zero-or-one per user; its
/// presence is the terminal "onboarding complete" signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub experience: ExperienceTier,
    pub risk_tolerance: RiskTolerance,
    pub timeline: InvestmentTimeline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_band: Option<IncomeBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_worth_band: Option<NetWorthBand>,
    #[serde(default)]
    pub investment_goals: Vec<String>,
    #[serde(default)]
    pub preferred_sectors: Vec<String>,
    pub wants_advisor: bool,
    #[serde(default)]
    pub previous_investments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted wizard cursor plus partial data snapshots, one row per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    /// Step the user should see next, always ≥1 and capped at the final step.
    pub current_step: u32,
    /// Steps already submitted, ascending, never removed by normal flow.
    pub completed_steps: Vec<u32>,
    /// Partial field snapshot per step, keyed by step number.
    pub step_data: serde_json::Map<String, serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Fresh progress for a user who has not saved anything yet.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            current_step: 1,
            completed_steps: Vec::new(),
            step_data: serde_json::Map::new(),
            started_at: now,
            last_activity: now,
            completed_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

// ── Raw step input ──────────────────────────────────────────────────────

/// Raw profile fields as submitted, before validation and sanitization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// ISO date string, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Raw address fields as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Raw investment-profile fields as submitted.
///
/// Multi-select fields distinguish "omitted" (`None`) from "supplied but
/// empty" (`Some(vec![])`) — the two are validated differently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesInput {
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub risk_tolerance: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub income_band: Option<String>,
    #[serde(default)]
    pub net_worth_band: Option<String>,
    #[serde(default)]
    pub investment_goals: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_sectors: Option<Vec<String>>,
    #[serde(default)]
    pub wants_advisor: Option<bool>,
    #[serde(default)]
    pub previous_investments: Option<Vec<String>>,
}

/// One step's worth of submitted fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepInput {
    Profile(ProfileInput),
    Address(AddressInput),
    Preferences(PreferencesInput),
}

impl StepInput {
    /// The wizard step this input belongs to.
    pub fn step(&self) -> u32 {
        match self {
            Self::Profile(_) => super::flow::PROFILE_STEP,
            Self::Address(_) => super::flow::ADDRESS_STEP,
            Self::Preferences(_) => super::flow::PREFERENCES_STEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_display_matches_serde() {
        let tiers = [
            ExperienceTier::Beginner,
            ExperienceTier::Intermediate,
            ExperienceTier::Advanced,
            ExperienceTier::Expert,
        ];
        for tier in tiers {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{tier}\""));
            let parsed: ExperienceTier = tier.to_string().parse().unwrap();
            assert_eq!(parsed, tier);
        }
    }

    #[test]
    fn enum_rejects_unknown_values() {
        assert!("guru".parse::<ExperienceTier>().is_err());
        assert!("reckless".parse::<RiskTolerance>().is_err());
        assert!("forever".parse::<InvestmentTimeline>().is_err());
        assert!("billions".parse::<IncomeBand>().is_err());
        assert!("billions".parse::<NetWorthBand>().is_err());
    }

    #[test]
    fn fresh_progress() {
        let p = ProgressRecord::new("u1");
        assert_eq!(p.current_step, 1);
        assert!(p.completed_steps.is_empty());
        assert!(p.step_data.is_empty());
        assert!(!p.is_complete());
    }

    #[test]
    fn progress_serde_roundtrip() {
        let mut p = ProgressRecord::new("u1");
        p.current_step = 2;
        p.completed_steps = vec![1];
        p.step_data
            .insert("1".into(), serde_json::json!({"first_name": "Ann"}));

        let json = serde_json::to_string(&p).unwrap();
        let parsed: ProgressRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.current_step, 2);
        assert_eq!(parsed.completed_steps, vec![1]);
        assert_eq!(parsed.step_data["1"]["first_name"], "Ann");
        assert!(parsed.completed_at.is_none());
    }

    #[test]
    fn step_input_tagged_deserialization() {
        let input: StepInput = serde_json::from_str(
            r#"{"kind": "profile", "first_name": "Ann", "email": "a@x.com"}"#,
        )
        .unwrap();
        assert_eq!(input.step(), 1);
        match input {
            StepInput::Profile(p) => {
                assert_eq!(p.first_name.as_deref(), Some("Ann"));
                assert!(p.phone.is_none());
            }
            other => panic!("expected profile input, got {other:?}"),
        }
    }

    #[test]
    fn multi_select_omitted_vs_empty() {
        let omitted: PreferencesInput = serde_json::from_str(r#"{}"#).unwrap();
        assert!(omitted.investment_goals.is_none());

        let empty: PreferencesInput =
            serde_json::from_str(r#"{"investment_goals": []}"#).unwrap();
        assert_eq!(empty.investment_goals, Some(vec![]));
    }
}
