//! Claim-data provider interface
//!
//! The wizard never talks to a wallet or a chain itself. Everything it
//! knows about the connected account comes through [`ClaimProvider`].

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::error::{ClaimError, FormattedError};
use crate::types::{Address, Delegate, TokenAmount, TxHash};

pub use memory::InMemoryClaimProvider;

/// Status code of a successful transaction receipt
pub const SUCCESS_STATUS: u64 = 1;

/// Snapshot of the provider's claim state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimContext {
    pub claimable_tokens: TokenAmount,
    pub can_claim: bool,
    pub loading: bool,
    pub warning: Option<String>,
    pub has_already_claimed: bool,
    /// Last claim transaction sent, if any
    pub claim_tokens_tx: Option<TxHash>,
    /// A claim transaction is waiting for confirmation
    pub claiming: bool,
}

/// Mined claim transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub status: u64,
}

#[async_trait]
pub trait ClaimProvider: Send + Sync {
    /// Current claim state. May change at any time between calls.
    fn context(&self) -> ClaimContext;

    /// Subscribe to the "already claimed" signal
    fn subscribe_claimed(&self) -> watch::Receiver<bool>;

    /// Send the claim transaction, delegating the claimed voting power to
    /// `delegate`, and wait for its receipt.
    /// May wait indefinitely on wallet confirmation.
    async fn send_claim_tokens(&self, delegate: &Delegate) -> Result<TxReceipt, ClaimError>;

    /// Whether `delegate` already holds more votes than the warning threshold
    async fn has_many_votes(&self, delegate: &Address) -> Result<bool, ClaimError>;
}

/// How a completed submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Receipt carried the success status
    Confirmed(TxReceipt),
    /// Receipt returned without error but with another status
    Rejected(TxReceipt),
}

/// Send a claim through `provider`, absorbing provider failures.
///
/// Failures are logged and formatted for display; they never escape as
/// `ClaimError`.
pub async fn send_claim<P: ClaimProvider + ?Sized>(
    provider: &P,
    delegate: &Delegate,
    success_status: u64,
) -> Result<SubmissionOutcome, FormattedError> {
    debug!("Sending claim delegated to {}", delegate.label());
    match provider.send_claim_tokens(delegate).await {
        Ok(receipt) if receipt.status == success_status => {
            debug!("Claim transaction {} confirmed", receipt.hash);
            Ok(SubmissionOutcome::Confirmed(receipt))
        }
        Ok(receipt) => {
            warn!(
                "Claim transaction {} finished with status {}",
                receipt.hash, receipt.status
            );
            Ok(SubmissionOutcome::Rejected(receipt))
        }
        Err(e) => {
            error!("Claim submission failed: {}", e);
            Err(FormattedError::from(&e))
        }
    }
}
