//! Configuration types.

use std::time::Duration;

/// Onboarding service configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Maximum step-submission attempts per identity within the window.
    pub max_update_attempts: u32,
    /// Maximum auto-save writes per identity within the window.
    pub max_autosave_attempts: u32,
    /// Rolling window for rate limiting.
    pub rate_limit_window: Duration,
    /// Quiet period after the last field edit before an auto-save fires.
    pub autosave_debounce: Duration,
    /// How long the saved/error status indicator stays visible before
    /// reverting to idle.
    pub save_status_revert: Duration,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 5,
            max_autosave_attempts: 60,
            rate_limit_window: Duration::from_secs(3600), // 60 minutes
            autosave_debounce: Duration::from_secs(1),
            save_status_revert: Duration::from_secs(2),
        }
    }
}
