//! Wizard State Management

use crate::types::Delegate;

use super::step::ClaimStep;

/// Complete wizard state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub step: ClaimStep,

    // Delegate selection
    pub delegate: Option<Delegate>,
    pub input_value: String,
    pub show_confirm_modal: bool,
    pub show_info_modal: Option<Delegate>,

    // Submission
    pub error: Option<String>,
    pub show_try_again: bool,

    // In-flight guards
    pub checking_votes: bool,
    pub submitting: bool,

    /// Bumped on every externally forced step change
    pub generation: u64,
    pub last_claimed_signal: Option<bool>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            step: ClaimStep::Start,

            delegate: None,
            input_value: String::new(),
            show_confirm_modal: false,
            show_info_modal: None,

            error: None,
            show_try_again: false,

            checking_votes: false,
            submitting: false,

            generation: 0,
            last_claimed_signal: None,
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Either async suspension point is outstanding
    pub fn is_busy(&self) -> bool {
        self.checking_votes || self.submitting
    }

    /// Move to `step` because of an outside signal. In-flight work started
    /// before this point is invalidated.
    pub(crate) fn force_step(&mut self, step: ClaimStep) {
        self.step = step;
        self.generation += 1;
        self.show_confirm_modal = false;
        self.show_try_again = false;
        self.error = None;
        self.checking_votes = false;
        self.submitting = false;
    }
}
