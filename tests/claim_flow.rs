//! End-to-end claim wizard flows against scripted providers

use async_trait::async_trait;
use claim_wizard::{
    spawn_claimed_watcher, Address, ClaimAttempt, ClaimContext, ClaimError, ClaimProvider,
    ClaimStep, ClaimWizard, Delegate, DelegateCheck, InMemoryClaimProvider, TokenAmount,
    TxReceipt, WizardConfig, WizardError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn create_test_wizard(
    claimable: u128,
) -> (Arc<InMemoryClaimProvider>, ClaimWizard<InMemoryClaimProvider>) {
    let provider = Arc::new(
        InMemoryClaimProvider::new(TokenAmount::from_tokens(claimable))
            .with_many_votes_threshold(TokenAmount::from_tokens(1_000)),
    );
    let wizard = ClaimWizard::new(Arc::clone(&provider), WizardConfig::default());
    (provider, wizard)
}

fn delegate(byte: u8) -> Delegate {
    Delegate::new(Address::new([byte; 20]))
}

async fn wait_until<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

async fn advance_to_review(wizard: &ClaimWizard<InMemoryClaimProvider>) {
    wizard.next_step().unwrap();
    wizard.select_delegate(delegate(0x11)).unwrap();
    assert_eq!(
        wizard.continue_with_delegate().await.unwrap(),
        DelegateCheck::Advanced
    );
}

#[tokio::test]
async fn test_full_claim_scenario() {
    let (provider, wizard) = create_test_wizard(100);
    let watcher = spawn_claimed_watcher(wizard.clone());

    assert_eq!(wizard.step(), ClaimStep::Start);

    wizard.next_step().unwrap();
    assert_eq!(wizard.step(), ClaimStep::ChooseDelegate);

    provider.set_vote_weight(Address::new([0x11; 20]), TokenAmount::from_tokens(10));
    wizard.select_delegate(delegate(0x11)).unwrap();
    assert_eq!(
        wizard.continue_with_delegate().await.unwrap(),
        DelegateCheck::Advanced
    );
    assert_eq!(wizard.step(), ClaimStep::Review);
    assert!(!wizard.state().show_confirm_modal);

    provider.push_receipt_status(1);
    let attempt = wizard.handle_claim_tokens().await.unwrap();
    assert!(matches!(attempt, ClaimAttempt::Claimed(TxReceipt { status: 1, .. })));
    assert_eq!(wizard.step(), ClaimStep::Claimed);
    assert_eq!(provider.submissions(), 1);

    watcher.shutdown();
    watcher.task_handle.await.unwrap();
}

#[tokio::test]
async fn test_submission_in_flight_is_visible() {
    let (provider, wizard) = create_test_wizard(100);
    advance_to_review(&wizard).await;
    provider.hold_claims();

    let claiming = wizard.clone();
    let task = tokio::spawn(async move { claiming.handle_claim_tokens().await });

    wait_until(|| wizard.state().submitting).await;
    assert_eq!(wizard.step(), ClaimStep::Confirming);
    assert!(provider.context().claiming);

    // No second submission while one is outstanding
    assert_eq!(wizard.retry_claim().await, Err(WizardError::Busy));

    provider.release_claims(1);
    let attempt = task.await.unwrap().unwrap();
    assert!(matches!(attempt, ClaimAttempt::Claimed(_)));
    assert_eq!(provider.submissions(), 1);
}

#[tokio::test]
async fn test_already_claimed_wins_over_inflight_submission() {
    let (provider, wizard) = create_test_wizard(100);
    let watcher = spawn_claimed_watcher(wizard.clone());
    advance_to_review(&wizard).await;

    provider.hold_claims();
    provider.push_failure(ClaimError::Network("connection reset".into()));

    let claiming = wizard.clone();
    let task = tokio::spawn(async move { claiming.handle_claim_tokens().await });
    wait_until(|| wizard.state().submitting).await;

    // Claimed from another session while the wallet prompt is open
    provider.set_already_claimed(true);
    wait_until(|| wizard.step() == ClaimStep::Claimed).await;

    provider.release_claims(1);
    let attempt = task.await.unwrap().unwrap();
    assert_eq!(attempt, ClaimAttempt::Stale);

    let state = wizard.state();
    assert_eq!(state.step, ClaimStep::Claimed);
    assert!(state.error.is_none());
    assert!(!state.show_try_again);
    assert!(!state.submitting);

    watcher.shutdown();
    watcher.task_handle.await.unwrap();
}

#[tokio::test]
async fn test_stale_vote_check_is_ignored() {
    let (provider, wizard) = create_test_wizard(100);
    wizard.next_step().unwrap();
    wizard.select_delegate(delegate(0x33)).unwrap();
    provider.hold_vote_checks();

    let checking = wizard.clone();
    let task = tokio::spawn(async move { checking.continue_with_delegate().await });
    wait_until(|| wizard.state().checking_votes).await;

    // The delegate cannot change and the user cannot go back mid-check
    assert_eq!(wizard.select_delegate(delegate(0x44)), Err(WizardError::Busy));
    assert_eq!(wizard.prev_step(), Err(WizardError::Busy));

    wizard.on_already_claimed(true);
    provider.release_vote_checks(1);

    assert_eq!(task.await.unwrap().unwrap(), DelegateCheck::Stale);
    assert_eq!(wizard.step(), ClaimStep::Claimed);
    assert!(!wizard.state().show_confirm_modal);
}

#[tokio::test]
async fn test_heavy_delegate_never_advances_without_confirm() {
    let (provider, wizard) = create_test_wizard(100);
    let heavy = Address::new([0x55; 20]);
    provider.set_vote_weight(heavy, TokenAmount::from_tokens(1_001));

    wizard.next_step().unwrap();
    wizard.select_delegate(Delegate::new(heavy)).unwrap();
    for _ in 0..3 {
        assert_eq!(
            wizard.continue_with_delegate().await.unwrap(),
            DelegateCheck::NeedsConfirmation
        );
        assert_eq!(wizard.step(), ClaimStep::ChooseDelegate);
        assert!(wizard.next_step().is_err());
        wizard.handle_delegate_confirm(false).unwrap();
    }
    assert_eq!(wizard.step(), ClaimStep::ChooseDelegate);
}

#[tokio::test]
async fn test_reset_after_account_switch() {
    let (provider, wizard) = create_test_wizard(100);
    provider.set_already_claimed(true);
    let watcher = spawn_claimed_watcher(wizard.clone());
    assert_eq!(wizard.step(), ClaimStep::Claimed);

    // Switching to an account that has not claimed yet
    provider.set_already_claimed(false);
    wait_until(|| wizard.step() == ClaimStep::Start).await;

    // Re-sending the same value does not move anything
    wizard.next_step().unwrap();
    provider.set_already_claimed(false);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(wizard.step(), ClaimStep::ChooseDelegate);

    watcher.shutdown();
    watcher.task_handle.await.unwrap();
}

/// Provider whose vote lookups always fail
struct FlakyVotesProvider {
    claimed: watch::Sender<bool>,
}

#[async_trait]
impl ClaimProvider for FlakyVotesProvider {
    fn context(&self) -> ClaimContext {
        ClaimContext {
            claimable_tokens: TokenAmount::from_tokens(1),
            can_claim: true,
            ..ClaimContext::default()
        }
    }

    fn subscribe_claimed(&self) -> watch::Receiver<bool> {
        self.claimed.subscribe()
    }

    async fn send_claim_tokens(&self, _delegate: &Delegate) -> Result<TxReceipt, ClaimError> {
        Err(ClaimError::Other("not used".into()))
    }

    async fn has_many_votes(&self, _delegate: &Address) -> Result<bool, ClaimError> {
        Err(ClaimError::Network("header not found".into()))
    }
}

#[tokio::test]
async fn test_vote_lookup_failure_keeps_delegate_step() {
    let (claimed, _) = watch::channel(false);
    let wizard = ClaimWizard::new(
        Arc::new(FlakyVotesProvider { claimed }),
        WizardConfig::default(),
    );
    wizard.next_step().unwrap();
    wizard.select_delegate(delegate(0x66)).unwrap();

    let err = wizard.continue_with_delegate().await.unwrap_err();
    assert!(matches!(err, WizardError::VoteCheckFailed(_)));

    let state = wizard.state();
    assert_eq!(state.step, ClaimStep::ChooseDelegate);
    assert!(!state.checking_votes);
    assert_eq!(
        state.error.as_deref(),
        Some("RPC provider error, please try again")
    );
}

#[tokio::test]
async fn test_random_walk_keeps_invariants() {
    // Every 4-action sequence from a fresh wizard
    const ACTIONS: usize = 6;
    for seq in 0..ACTIONS.pow(4) {
        let (provider, wizard) = create_test_wizard(100);
        provider.set_vote_weight(Address::new([0x77; 20]), TokenAmount::from_tokens(5_000));

        let mut code = seq;
        for _ in 0..4 {
            let action = code % ACTIONS;
            code /= ACTIONS;

            let before = wizard.step();
            let _ = match action {
                0 => wizard.next_step().map(|_| ()),
                1 => wizard.prev_step().map(|_| ()),
                2 => match wizard.select_delegate(delegate(0x77)) {
                    Ok(()) => wizard.continue_with_delegate().await.map(|_| ()),
                    Err(e) => Err(e),
                },
                3 => wizard.handle_delegate_confirm(true).map(|_| ()),
                4 => wizard.handle_claim_tokens().await.map(|_| ()),
                _ => {
                    wizard.on_already_claimed(seq % 2 == 0);
                    Ok(())
                }
            };

            let state = wizard.state();
            assert!(state.step.index() <= 4);
            if state.show_confirm_modal {
                assert_eq!(state.step, ClaimStep::ChooseDelegate);
            }
            if state.step == ClaimStep::Review && before == ClaimStep::ChooseDelegate {
                // only an explicit confirm gets a heavy delegate past this step
                assert_eq!(action, 3);
            }
            assert!(!state.is_busy());
        }

        // Whatever got submitted carried the heavy delegate, never another
        for sent in provider.claimed_delegates() {
            assert_eq!(sent, delegate(0x77));
        }
    }
}

#[tokio::test]
async fn test_claim_carries_confirmed_delegate() {
    let (provider, wizard) = create_test_wizard(100);
    let heavy = Delegate::new(Address::new([0x88; 20])).with_name("whale.eth");
    provider.set_vote_weight(heavy.address, TokenAmount::from_tokens(2_000));

    wizard.next_step().unwrap();
    wizard.select_delegate(delegate(0x11)).unwrap();
    wizard.select_delegate(heavy.clone()).unwrap();
    assert_eq!(
        wizard.continue_with_delegate().await.unwrap(),
        DelegateCheck::NeedsConfirmation
    );
    wizard.handle_delegate_confirm(true).unwrap();

    let attempt = wizard.handle_claim_tokens().await.unwrap();
    assert!(matches!(attempt, ClaimAttempt::Claimed(_)));
    assert_eq!(provider.claimed_delegates(), vec![heavy]);
}

#[tokio::test]
async fn test_delegate_locked_after_vote_check() {
    let (provider, wizard) = create_test_wizard(100);
    let heavy = Address::new([0x99; 20]);
    provider.set_vote_weight(heavy, TokenAmount::from_tokens(50_000));
    advance_to_review(&wizard).await;

    // Swapping in a heavy delegate at Review would skip its vote check
    assert!(matches!(
        wizard.select_delegate(Delegate::new(heavy)),
        Err(WizardError::InvalidTransition {
            step: ClaimStep::Review,
            ..
        })
    ));

    wizard.handle_claim_tokens().await.unwrap();
    assert_eq!(wizard.step(), ClaimStep::Claimed);
    assert_eq!(provider.claimed_delegates(), vec![delegate(0x11)]);
    assert_eq!(wizard.state().delegate, Some(delegate(0x11)));
}

#[tokio::test]
async fn test_changing_delegate_closes_pending_confirmation() {
    let (provider, wizard) = create_test_wizard(100);
    let heavy = Address::new([0xaa; 20]);
    provider.set_vote_weight(heavy, TokenAmount::from_tokens(50_000));

    wizard.next_step().unwrap();
    wizard.select_delegate(Delegate::new(heavy)).unwrap();
    assert_eq!(
        wizard.continue_with_delegate().await.unwrap(),
        DelegateCheck::NeedsConfirmation
    );

    wizard.select_delegate(delegate(0x12)).unwrap();
    assert!(!wizard.state().show_confirm_modal);
    assert_eq!(
        wizard.handle_delegate_confirm(true),
        Err(WizardError::NoPendingConfirmation)
    );
    assert_eq!(wizard.step(), ClaimStep::ChooseDelegate);
}

#[tokio::test]
async fn test_abandoned_submission_offers_retry() {
    let (provider, wizard) = create_test_wizard(100);
    advance_to_review(&wizard).await;
    provider.hold_claims();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), wizard.handle_claim_tokens()).await;
    assert!(timed_out.is_err());

    let state = wizard.state();
    assert_eq!(state.step, ClaimStep::Confirming);
    assert!(!state.submitting);
    assert!(state.show_try_again);

    provider.release_claims(1);
    let attempt = wizard.retry_claim().await.unwrap();
    assert!(matches!(attempt, ClaimAttempt::Claimed(_)));
    assert_eq!(wizard.step(), ClaimStep::Claimed);
}

#[tokio::test]
async fn test_abandoned_vote_check_unblocks_wizard() {
    let (provider, wizard) = create_test_wizard(100);
    wizard.next_step().unwrap();
    wizard.select_delegate(delegate(0x13)).unwrap();
    provider.hold_vote_checks();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), wizard.continue_with_delegate()).await;
    assert!(timed_out.is_err());
    assert!(!wizard.state().checking_votes);

    wizard.select_delegate(delegate(0x14)).unwrap();
    provider.release_vote_checks(1);
    assert_eq!(
        wizard.continue_with_delegate().await.unwrap(),
        DelegateCheck::Advanced
    );
    assert_eq!(wizard.prev_step().unwrap(), ClaimStep::ChooseDelegate);
}

#[tokio::test]
async fn test_self_confirmed_claim_reports_receipt() {
    let provider = Arc::new(
        InMemoryClaimProvider::new(TokenAmount::from_tokens(100))
            .with_many_votes_threshold(TokenAmount::from_tokens(1_000))
            .with_mark_claimed_on_success(true),
    );
    let wizard = ClaimWizard::new(Arc::clone(&provider), WizardConfig::default());
    let watcher = spawn_claimed_watcher(wizard.clone());
    advance_to_review(&wizard).await;

    // The provider raises the claimed signal before the receipt returns
    let attempt = wizard.handle_claim_tokens().await.unwrap();
    assert!(matches!(attempt, ClaimAttempt::Claimed(TxReceipt { status: 1, .. })));
    assert_eq!(wizard.step(), ClaimStep::Claimed);

    watcher.shutdown();
    watcher.task_handle.await.unwrap();
}
