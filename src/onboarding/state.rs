//! Wizard cursor — tracks which step the session is on.
//!
//! Pure transition logic, no I/O. The controller owns a cursor per
//! session and consults it before persisting anything.

use serde::{Deserialize, Serialize};

use super::flow::FlowConfig;

/// Position of a session inside the wizard.
///
/// Steps run 1..=K linearly; `complete` is the terminal state, reached
/// only from step K.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardCursor {
    pub current_step: u32,
    pub complete: bool,
}

impl WizardCursor {
    pub fn at(step: u32) -> Self {
        Self {
            current_step: step.max(1),
            complete: false,
        }
    }

    pub fn completed(final_step: u32) -> Self {
        Self {
            current_step: final_step,
            complete: true,
        }
    }

    /// Advance after a successful non-final submission.
    pub fn advance(&mut self, flow: &FlowConfig) -> Result<u32, String> {
        if self.complete {
            return Err("Onboarding is already complete".to_string());
        }
        if self.current_step >= flow.final_step {
            return Err(format!(
                "Step {} is the final step; use complete instead",
                self.current_step
            ));
        }
        self.current_step += 1;
        Ok(self.current_step)
    }

    /// Move back one step. Persisted data is untouched.
    pub fn retreat(&mut self) -> Result<u32, String> {
        if self.complete {
            return Err("Onboarding is already complete".to_string());
        }
        if self.current_step <= 1 {
            return Err("Already at the first step".to_string());
        }
        self.current_step -= 1;
        Ok(self.current_step)
    }

    /// Enter the terminal state after the final step's submission.
    pub fn finish(&mut self, flow: &FlowConfig) -> Result<(), String> {
        if self.complete {
            return Err("Onboarding is already complete".to_string());
        }
        if self.current_step != flow.final_step {
            return Err(format!(
                "Cannot complete from step {}; the final step is {}",
                self.current_step, flow.final_step
            ));
        }
        self.complete = true;
        Ok(())
    }

    /// Whether step 1 may be skipped from the current position.
    pub fn can_skip(&self, flow: &FlowConfig) -> bool {
        flow.allow_skip && self.current_step == 1 && !self.complete
    }
}
