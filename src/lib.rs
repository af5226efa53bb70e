//! Token Claim Wizard
//!
//! Walks an account through claiming its token allocation and delegating
//! the claimed voting power. Chain access is delegated to a
//! [`ClaimProvider`]; this crate owns only the step sequencing, the
//! guard conditions and the error recovery around the claim transaction.
//!
//! ## Module Structure
//!
//! - `types`: Address, TxHash, TokenAmount, Delegate
//! - `error`: Error types and user-facing error formatting
//! - `claim`: Claim-data provider trait and the in-memory provider
//! - `wizard`: Step state machine, step payloads, claimed-signal watcher
//! - `config`: Wizard and stats worker configuration

pub mod claim;
pub mod config;
pub mod error;
pub mod types;
pub mod wizard;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use claim::{
    send_claim, ClaimContext, ClaimProvider, InMemoryClaimProvider, SubmissionOutcome, TxReceipt,
    SUCCESS_STATUS,
};
pub use config::{load_dotenv, load_env_file, StatsWorkerConfig, WizardConfig};
pub use error::{format_error, ClaimError, ConfigError, FormattedError, ParseError, WizardError};
pub use types::{Address, Delegate, TokenAmount, TxHash};
pub use wizard::{
    spawn_claimed_watcher, ClaimAttempt, ClaimGate, ClaimStep, ClaimWizard, DelegateCheck,
    StepView, WatcherHandle, WizardState, WizardView,
};
