//! Flow variant configuration.
//!
//! The wizard serves two parallel flows — the generic signup and the
//! investor signup. Both walk the same three steps (profile → address →
//! preferences) but differ in field policy. The differences live here as
//! data so the state machine, validator, and resolver stay shared.

use serde::{Deserialize, Serialize};

/// Step numbers shared by both flows.
pub const PROFILE_STEP: u32 = 1;
pub const ADDRESS_STEP: u32 = 2;
pub const PREFERENCES_STEP: u32 = 3;

/// Which signup flow a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    Generic,
    Investor,
}

impl Default for FlowVariant {
    fn default() -> Self {
        Self::Generic
    }
}

impl std::fmt::Display for FlowVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Investor => write!(f, "investor"),
        }
    }
}

impl std::str::FromStr for FlowVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "investor" => Ok(Self::Investor),
            other => Err(format!("unknown flow variant: {other}")),
        }
    }
}

/// How strictly address fields are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRule {
    /// Required fields must be non-empty and meet minimum lengths
    /// (street ≥5, city ≥2, state ≥2, postal ≥3, country ≥2 after trim).
    MinLengths,
    /// Required fields must only be non-empty.
    NonEmptyOnly,
}

/// Per-flow field policy and step layout.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub variant: FlowVariant,
    /// Number of the last step (K). Both observed flows use 3.
    pub final_step: u32,
    /// Whether the phone number is required on the profile step.
    pub phone_required: bool,
    /// Address validation strictness.
    pub address_rule: AddressRule,
    /// Whether step 1 may be skipped, routing straight to completion.
    pub allow_skip: bool,
    /// Whether a supplied-but-empty multi-select is accepted.
    ///
    /// The source systems accept an omitted multi-select but reject an
    /// empty list. That asymmetry is preserved; this flag exists so a
    /// deployment can opt out of it deliberately.
    pub empty_selection_allowed: bool,
}

impl FlowConfig {
    /// Generic signup: phone optional, strict address lengths, no skip.
    pub fn generic() -> Self {
        Self {
            variant: FlowVariant::Generic,
            final_step: PREFERENCES_STEP,
            phone_required: false,
            address_rule: AddressRule::MinLengths,
            allow_skip: false,
            empty_selection_allowed: false,
        }
    }

    /// Investor signup: phone required, non-empty address checks, step 1
    /// may be skipped.
    pub fn investor() -> Self {
        Self {
            variant: FlowVariant::Investor,
            final_step: PREFERENCES_STEP,
            phone_required: true,
            address_rule: AddressRule::NonEmptyOnly,
            allow_skip: true,
            empty_selection_allowed: false,
        }
    }

    pub fn for_variant(variant: FlowVariant) -> Self {
        match variant {
            FlowVariant::Generic => Self::generic(),
            FlowVariant::Investor => Self::investor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_parse_roundtrip() {
        for v in [FlowVariant::Generic, FlowVariant::Investor] {
            let parsed: FlowVariant = v.to_string().parse().unwrap();
            assert_eq!(parsed, v);
        }
        assert!("retail".parse::<FlowVariant>().is_err());
    }

    #[test]
    fn flow_policies_differ() {
        let generic = FlowConfig::generic();
        let investor = FlowConfig::investor();

        assert!(!generic.phone_required);
        assert!(investor.phone_required);
        assert_eq!(generic.address_rule, AddressRule::MinLengths);
        assert_eq!(investor.address_rule, AddressRule::NonEmptyOnly);
        assert!(!generic.allow_skip);
        assert!(investor.allow_skip);
        assert_eq!(generic.final_step, investor.final_step);
    }
}
