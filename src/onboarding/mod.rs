//! Onboarding system — the multi-step signup wizard.
//!
//! A session walks a user through profile → address → investment
//! preferences, persisting each step through the repository. Resuming
//! sessions land on the step computed from the records that already
//! exist; partial edits ride on a debounced auto-save.

pub mod controller;
pub mod flow;
pub mod model;
pub mod progress;
pub mod resolver;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod validate;

pub use controller::{
    OnboardingService, OnboardingSession, SaveStatus, SessionStatus, SubmitOutcome,
};
pub use flow::{AddressRule, FlowConfig, FlowVariant};
pub use model::{
    AddressInput, AddressRecord, PreferenceRecord, PreferencesInput, ProfileInput, ProfileRecord,
    ProgressRecord, StepInput,
};
pub use progress::{ProgressStore, RateLimiter};
pub use resolver::{Resolution, resolve_step};
pub use routes::{AppState, onboarding_routes};
pub use sanitize::sanitize;
pub use state::WizardCursor;
