//! Token claim wizard
//!
//! Guides an account through:
//! 1. Reviewing the claimable amount
//! 2. Choosing a delegate for the claimed voting power
//! 3. Reviewing the claim
//! 4. Confirming the transaction in the wallet
//! 5. Done

pub mod gate;
pub mod machine;
pub mod state;
pub mod step;
pub mod watcher;

pub use gate::ClaimGate;
pub use machine::{ClaimAttempt, ClaimWizard, DelegateCheck};
pub use state::WizardState;
pub use step::{ClaimStep, StepView, WizardView};
pub use watcher::{spawn_claimed_watcher, WatcherHandle};
