//! Claim wizard state machine
//!
//! Drives `Start -> ChooseDelegate -> Review -> Confirming -> Claimed`.
//! User actions go through the transition methods; the provider's
//! "already claimed" signal goes through [`ClaimWizard::on_already_claimed`],
//! which always wins over user-driven transitions in flight.
//!
//! The state lock is never held across an `.await`. Each async action
//! records the state generation before suspending and discards its result
//! if the generation moved while it was waiting.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::gate::ClaimGate;
use super::state::WizardState;
use super::step::{ClaimStep, StepView, WizardView};
use crate::claim::{send_claim, ClaimProvider, SubmissionOutcome, TxReceipt};
use crate::config::WizardConfig;
use crate::error::{FormattedError, WizardError};
use crate::types::{Address, Delegate};

/// Result of a claim submission, after the wizard applied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimAttempt {
    /// Success status; the wizard moved to Claimed
    Claimed(TxReceipt),
    /// Receipt with another status; retry offered
    Rejected { status: u64 },
    /// Provider failure; formatted message shown, retry offered
    Failed { message: String },
    /// Resolved after the step was changed from outside; ignored
    Stale,
}

/// Result of continuing from ChooseDelegate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateCheck {
    /// Vote weight under threshold; moved to Review
    Advanced,
    /// Vote weight over threshold; confirmation modal opened
    NeedsConfirmation,
    /// Resolved after the step was changed from outside; ignored
    Stale,
}

#[derive(Debug, Clone, Copy)]
enum InFlight {
    VoteCheck,
    Submission,
}

/// Clears an in-flight flag when the action's future is dropped before it
/// could apply its result, so the wizard never stays `Busy`.
struct InFlightGuard<'a> {
    state: &'a Mutex<WizardState>,
    kind: InFlight,
    generation: u64,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(state: &'a Mutex<WizardState>, kind: InFlight, generation: u64) -> Self {
        Self {
            state,
            kind,
            generation,
            armed: true,
        }
    }

    /// Must be called before re-locking the state
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return;
        }
        match self.kind {
            InFlight::VoteCheck => state.checking_votes = false,
            InFlight::Submission => {
                if state.submitting {
                    state.submitting = false;
                    state.show_try_again = true;
                }
            }
        }
        warn!("{:?} abandoned before completion", self.kind);
    }
}

struct Inner<P> {
    provider: Arc<P>,
    config: WizardConfig,
    state: Mutex<WizardState>,
}

/// Claim wizard bound to a claim-data provider
pub struct ClaimWizard<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for ClaimWizard<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: ClaimProvider> ClaimWizard<P> {
    pub fn new(provider: Arc<P>, config: WizardConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                state: Mutex::new(WizardState::new()),
            }),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.inner.provider
    }

    pub fn config(&self) -> &WizardConfig {
        &self.inner.config
    }

    /// Copy of the current state
    pub fn state(&self) -> WizardState {
        self.inner.state.lock().clone()
    }

    pub fn step(&self) -> ClaimStep {
        self.inner.state.lock().step
    }

    /// Payload of the current step, built from wizard state and the
    /// provider's latest context
    pub fn view(&self) -> WizardView {
        let ctx = self.inner.provider.context();
        let state = self.inner.state.lock();

        let payload = match state.step {
            ClaimStep::Start => StepView::Start {
                claimable_tokens: ctx.claimable_tokens,
            },
            ClaimStep::ChooseDelegate => StepView::ChooseDelegate {
                input_value: state.input_value.clone(),
                delegate: state.delegate.clone(),
                show_confirm_modal: state.show_confirm_modal,
                show_info_modal: state.show_info_modal.clone(),
            },
            ClaimStep::Review => StepView::Review {
                claimable_tokens: ctx.claimable_tokens,
                delegate: state.delegate.clone(),
            },
            ClaimStep::Confirming => StepView::Confirming {
                claiming: ctx.claiming,
                tx: ctx.claim_tokens_tx,
                delegate: state.delegate.clone(),
                claimable_tokens: ctx.claimable_tokens,
                show_try_again: state.show_try_again,
            },
            ClaimStep::Claimed => StepView::Claimed,
        };

        let step = payload.step();
        WizardView {
            step,
            title: step.title(&self.inner.config.token_symbol),
            payload,
            error: state.error.clone(),
        }
    }

    /// Whether the steps can be shown at all for this connection
    pub fn gate(&self, connected_chain: Option<u64>) -> ClaimGate {
        ClaimGate::evaluate(
            &self.inner.provider.context(),
            connected_chain,
            self.inner.config.claim_chain_id,
        )
    }

    /// Leave the Start step
    pub fn next_step(&self) -> Result<ClaimStep, WizardError> {
        let claimable = self.inner.provider.context().claimable_tokens;
        let mut state = self.inner.state.lock();

        match state.step {
            ClaimStep::Start => {
                if claimable.is_zero() {
                    return Err(WizardError::NothingToClaim);
                }
                state.step = ClaimStep::ChooseDelegate;
                debug!("Claim wizard: Start -> ChooseDelegate");
                Ok(state.step)
            }
            step => Err(WizardError::InvalidTransition {
                step,
                action: "advance",
            }),
        }
    }

    pub fn prev_step(&self) -> Result<ClaimStep, WizardError> {
        let mut state = self.inner.state.lock();
        if state.is_busy() {
            return Err(WizardError::Busy);
        }
        let prev = state.step.prev().ok_or(WizardError::InvalidTransition {
            step: state.step,
            action: "go back",
        })?;
        state.step = prev;
        state.show_confirm_modal = false;
        debug!("Claim wizard: back to {:?}", prev);
        Ok(prev)
    }

    pub fn set_input_value(&self, value: impl Into<String>) {
        self.inner.state.lock().input_value = value.into();
    }

    /// Choose the delegate for the claim. Only allowed on ChooseDelegate;
    /// a different delegate closes any pending many-votes confirmation.
    pub fn select_delegate(&self, delegate: Delegate) -> Result<(), WizardError> {
        let mut state = self.inner.state.lock();
        if state.step != ClaimStep::ChooseDelegate {
            return Err(WizardError::InvalidTransition {
                step: state.step,
                action: "select a delegate",
            });
        }
        if state.checking_votes {
            return Err(WizardError::Busy);
        }
        if state.delegate.as_ref() != Some(&delegate) {
            state.show_confirm_modal = false;
        }
        state.delegate = Some(delegate);
        Ok(())
    }

    /// Select the address typed into the delegate input
    pub fn select_delegate_from_input(&self) -> Result<Delegate, WizardError> {
        let input = self.inner.state.lock().input_value.clone();
        let address: Address = input.parse()?;
        let delegate = Delegate::new(address);
        self.select_delegate(delegate.clone())?;
        Ok(delegate)
    }

    pub fn show_delegate_info(&self, delegate: Delegate) {
        self.inner.state.lock().show_info_modal = Some(delegate);
    }

    pub fn close_delegate_info(&self) {
        self.inner.state.lock().show_info_modal = None;
    }

    /// Continue from ChooseDelegate.
    ///
    /// Looks up the selected delegate's vote weight first. Above the
    /// threshold the confirmation modal opens instead of advancing.
    pub async fn continue_with_delegate(&self) -> Result<DelegateCheck, WizardError> {
        let (delegate, generation) = {
            let mut state = self.inner.state.lock();
            if state.step != ClaimStep::ChooseDelegate {
                return Err(WizardError::InvalidTransition {
                    step: state.step,
                    action: "continue with a delegate",
                });
            }
            if state.is_busy() {
                return Err(WizardError::Busy);
            }
            let delegate = state
                .delegate
                .clone()
                .ok_or(WizardError::NoDelegateSelected)?;
            state.checking_votes = true;
            state.clear_error();
            (delegate, state.generation)
        };

        let guard = InFlightGuard::new(&self.inner.state, InFlight::VoteCheck, generation);
        let result = self
            .inner
            .provider
            .has_many_votes(&delegate.address)
            .await;
        guard.disarm();

        let mut state = self.inner.state.lock();
        if state.generation != generation || state.step != ClaimStep::ChooseDelegate {
            debug!("Discarding stale vote check for {}", delegate.address);
            return Ok(DelegateCheck::Stale);
        }
        state.checking_votes = false;

        match result {
            Ok(true) => {
                info!(
                    "Delegate {} holds many votes, asking for confirmation",
                    delegate.address
                );
                state.show_confirm_modal = true;
                Ok(DelegateCheck::NeedsConfirmation)
            }
            Ok(false) => {
                state.step = ClaimStep::Review;
                debug!("Claim wizard: ChooseDelegate -> Review");
                Ok(DelegateCheck::Advanced)
            }
            Err(e) => {
                warn!("Vote weight lookup for {} failed: {}", delegate.address, e);
                let formatted = FormattedError::from(&e);
                state.set_error(formatted.message());
                Err(WizardError::VoteCheckFailed(formatted))
            }
        }
    }

    /// Answer the many-votes confirmation modal
    pub fn handle_delegate_confirm(&self, confirmed: bool) -> Result<ClaimStep, WizardError> {
        let mut state = self.inner.state.lock();
        if state.step != ClaimStep::ChooseDelegate || !state.show_confirm_modal {
            return Err(WizardError::NoPendingConfirmation);
        }
        state.show_confirm_modal = false;
        if confirmed {
            state.step = ClaimStep::Review;
            debug!("Claim wizard: delegate confirmed, ChooseDelegate -> Review");
        }
        Ok(state.step)
    }

    /// Confirm the claim from Review: move to Confirming and submit
    pub async fn handle_claim_tokens(&self) -> Result<ClaimAttempt, WizardError> {
        let (delegate, generation) = {
            let mut state = self.inner.state.lock();
            if state.step != ClaimStep::Review {
                return Err(WizardError::InvalidTransition {
                    step: state.step,
                    action: "claim",
                });
            }
            if state.delegate.is_none() {
                return Err(WizardError::NoDelegateSelected);
            }
            state.step = ClaimStep::Confirming;
            debug!("Claim wizard: Review -> Confirming");
            Self::begin_submission(&mut state)?
        };
        Ok(self.run_submission(delegate, generation).await)
    }

    /// Retry after a rejected or failed submission
    pub async fn retry_claim(&self) -> Result<ClaimAttempt, WizardError> {
        self.submit_claim().await
    }

    /// Submit the claim from Confirming.
    ///
    /// Provider failures are absorbed into `error` / `show_try_again`;
    /// the `Err` side only reports a refused call.
    pub async fn submit_claim(&self) -> Result<ClaimAttempt, WizardError> {
        let (delegate, generation) = {
            let mut state = self.inner.state.lock();
            if state.step != ClaimStep::Confirming {
                return Err(WizardError::InvalidTransition {
                    step: state.step,
                    action: "submit a claim",
                });
            }
            if state.submitting {
                return Err(WizardError::Busy);
            }
            Self::begin_submission(&mut state)?
        };
        Ok(self.run_submission(delegate, generation).await)
    }

    fn begin_submission(state: &mut WizardState) -> Result<(Delegate, u64), WizardError> {
        let delegate = state
            .delegate
            .clone()
            .ok_or(WizardError::NoDelegateSelected)?;
        state.clear_error();
        state.show_try_again = false;
        state.submitting = true;
        Ok((delegate, state.generation))
    }

    async fn run_submission(&self, delegate: Delegate, generation: u64) -> ClaimAttempt {
        let guard = InFlightGuard::new(&self.inner.state, InFlight::Submission, generation);
        let result = send_claim(
            self.inner.provider.as_ref(),
            &delegate,
            self.inner.config.success_status,
        )
        .await;
        guard.disarm();

        let mut state = self.inner.state.lock();
        if state.generation != generation || state.step != ClaimStep::Confirming {
            // The signal may have arrived because this very claim landed
            if let (ClaimStep::Claimed, Ok(SubmissionOutcome::Confirmed(receipt))) =
                (state.step, &result)
            {
                info!("Claim confirmed in {} after the wizard moved to Claimed", receipt.hash);
                return ClaimAttempt::Claimed(*receipt);
            }
            debug!("Discarding stale claim result at step {:?}", state.step);
            return ClaimAttempt::Stale;
        }
        state.submitting = false;

        match result {
            Ok(SubmissionOutcome::Confirmed(receipt)) => {
                state.show_try_again = false;
                state.step = state.step.next();
                info!("Claim confirmed in {}", receipt.hash);
                ClaimAttempt::Claimed(receipt)
            }
            Ok(SubmissionOutcome::Rejected(receipt)) => {
                state.show_try_again = true;
                ClaimAttempt::Rejected {
                    status: receipt.status,
                }
            }
            Err(formatted) => {
                let message = formatted.into_message();
                state.set_error(message.clone());
                state.show_try_again = true;
                ClaimAttempt::Failed { message }
            }
        }
    }

    /// Re-derive the step from the "already claimed" signal.
    ///
    /// Only a change from the last observed value acts; the first
    /// observation always does. Returns the new step when it moved.
    pub fn on_already_claimed(&self, claimed: bool) -> Option<ClaimStep> {
        let mut state = self.inner.state.lock();
        if state.last_claimed_signal == Some(claimed) {
            return None;
        }
        state.last_claimed_signal = Some(claimed);

        if claimed {
            if state.step != ClaimStep::Claimed {
                info!(
                    "Account has already claimed, jumping from {:?} to Claimed",
                    state.step
                );
                state.force_step(ClaimStep::Claimed);
                return Some(ClaimStep::Claimed);
            }
        } else if state.step == ClaimStep::Claimed {
            info!("Claimed state no longer holds, restarting wizard");
            state.force_step(ClaimStep::Start);
            return Some(ClaimStep::Start);
        }
        None
    }
}
