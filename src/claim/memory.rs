//! In-memory claim provider
//!
//! Scripted stand-in for a wallet-backed provider. Used by the demo CLI
//! and by tests that need to control when and how a claim resolves.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tracing::debug;

use super::{ClaimContext, ClaimProvider, TxReceipt, SUCCESS_STATUS};
use crate::error::ClaimError;
use crate::types::{Address, Delegate, TokenAmount, TxHash};

/// Blocks callers until released, when held
struct Hold {
    held: AtomicBool,
    permits: Semaphore,
}

impl Hold {
    fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
            permits: Semaphore::new(0),
        }
    }

    async fn pass(&self) {
        if !self.held.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

pub struct InMemoryClaimProvider {
    context: Mutex<ClaimContext>,
    claimed_tx: watch::Sender<bool>,
    vote_weights: Mutex<HashMap<Address, TokenAmount>>,
    many_votes_threshold: TokenAmount,
    scripted: Mutex<VecDeque<Result<u64, ClaimError>>>,
    latency: Duration,
    mark_claimed_on_success: bool,
    submissions: AtomicU64,
    claimed_delegates: Mutex<Vec<Delegate>>,
    claim_hold: Hold,
    vote_hold: Hold,
}

impl InMemoryClaimProvider {
    pub fn new(claimable_tokens: TokenAmount) -> Self {
        let (claimed_tx, _) = watch::channel(false);
        Self {
            context: Mutex::new(ClaimContext {
                claimable_tokens,
                can_claim: !claimable_tokens.is_zero(),
                ..ClaimContext::default()
            }),
            claimed_tx,
            vote_weights: Mutex::new(HashMap::new()),
            many_votes_threshold: TokenAmount::from_tokens(5_000_000),
            scripted: Mutex::new(VecDeque::new()),
            latency: Duration::ZERO,
            mark_claimed_on_success: false,
            submissions: AtomicU64::new(0),
            claimed_delegates: Mutex::new(Vec::new()),
            claim_hold: Hold::new(),
            vote_hold: Hold::new(),
        }
    }

    pub fn with_many_votes_threshold(mut self, threshold: TokenAmount) -> Self {
        self.many_votes_threshold = threshold;
        self
    }

    /// Simulated wallet + confirmation delay per submission
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Raise the claimed signal when a submission succeeds, as a chain
    /// refresh would
    pub fn with_mark_claimed_on_success(mut self, enabled: bool) -> Self {
        self.mark_claimed_on_success = enabled;
        self
    }

    pub fn set_vote_weight(&self, delegate: Address, weight: TokenAmount) {
        self.vote_weights.lock().insert(delegate, weight);
    }

    /// Queue the status of the next receipt
    pub fn push_receipt_status(&self, status: u64) {
        self.scripted.lock().push_back(Ok(status));
    }

    /// Queue a failure for the next submission
    pub fn push_failure(&self, err: ClaimError) {
        self.scripted.lock().push_back(Err(err));
    }

    pub fn set_already_claimed(&self, claimed: bool) {
        self.context.lock().has_already_claimed = claimed;
        self.claimed_tx.send_replace(claimed);
    }

    pub fn set_loading(&self, loading: bool) {
        self.context.lock().loading = loading;
    }

    pub fn set_warning(&self, warning: Option<String>) {
        self.context.lock().warning = warning;
    }

    /// Make submissions wait until [`Self::release_claims`] is called
    pub fn hold_claims(&self) {
        self.claim_hold.held.store(true, Ordering::SeqCst);
    }

    pub fn release_claims(&self, count: usize) {
        self.claim_hold.permits.add_permits(count);
    }

    /// Make vote lookups wait until [`Self::release_vote_checks`] is called
    pub fn hold_vote_checks(&self) {
        self.vote_hold.held.store(true, Ordering::SeqCst);
    }

    pub fn release_vote_checks(&self, count: usize) {
        self.vote_hold.permits.add_permits(count);
    }

    /// Number of claim submissions received so far
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Delegates received with each claim submission, oldest first
    pub fn claimed_delegates(&self) -> Vec<Delegate> {
        self.claimed_delegates.lock().clone()
    }

    fn next_tx_hash(&self, nonce: u64) -> TxHash {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&nonce.to_be_bytes());
        TxHash::new(bytes)
    }
}

#[async_trait]
impl ClaimProvider for InMemoryClaimProvider {
    fn context(&self) -> ClaimContext {
        self.context.lock().clone()
    }

    fn subscribe_claimed(&self) -> watch::Receiver<bool> {
        self.claimed_tx.subscribe()
    }

    async fn send_claim_tokens(&self, delegate: &Delegate) -> Result<TxReceipt, ClaimError> {
        let nonce = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        self.claimed_delegates.lock().push(delegate.clone());
        let hash = self.next_tx_hash(nonce);
        {
            let mut ctx = self.context.lock();
            ctx.claiming = true;
            ctx.claim_tokens_tx = Some(hash);
        }

        self.claim_hold.pass().await;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self.scripted.lock().pop_front();
        let result = scripted.unwrap_or(Ok(SUCCESS_STATUS));
        self.context.lock().claiming = false;

        let status = result?;
        debug!("In-memory claim {} resolved with status {}", hash, status);
        if status == SUCCESS_STATUS && self.mark_claimed_on_success {
            self.set_already_claimed(true);
        }
        Ok(TxReceipt { hash, status })
    }

    async fn has_many_votes(&self, delegate: &Address) -> Result<bool, ClaimError> {
        self.vote_hold.pass().await;
        let weight = self
            .vote_weights
            .lock()
            .get(delegate)
            .copied()
            .unwrap_or_default();
        Ok(weight > self.many_votes_threshold)
    }
}
