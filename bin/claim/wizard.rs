//! Claim Wizard - Interactive CLI

use anyhow::Result;
use claim_wizard::{
    ClaimAttempt, ClaimGate, ClaimProvider, ClaimStep, ClaimWizard, DelegateCheck, StepView,
    WizardError,
};
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

pub async fn run_claim_wizard<P: ClaimProvider>(
    wizard: &ClaimWizard<P>,
    connected_chain: u64,
) -> Result<()> {
    let term = Term::stdout();
    term.clear_screen()?;

    println!();
    println!(
        "{}",
        style(format!("  {} Claim", wizard.config().token_symbol))
            .cyan()
            .bold()
    );
    println!(
        "  {}",
        style("Claim your tokens and choose who votes with them").dim()
    );
    println!();

    if !check_gate(wizard.gate(Some(connected_chain)), wizard.config().claim_chain_id) {
        return Ok(());
    }

    loop {
        let view = wizard.view();
        if view.step != ClaimStep::Claimed {
            println!();
            println!(
                "  {} {}",
                style(format!(
                    "Step {}/{}:",
                    view.step.index() + 1,
                    ClaimStep::ALL.len() - 1
                ))
                .dim(),
                style(&view.title).bold()
            );
            println!();
        }

        let keep_going = match view.payload {
            StepView::Start { claimable_tokens } => {
                println!(
                    "  You can claim {} {}",
                    style(claimable_tokens).cyan().bold(),
                    wizard.config().token_symbol
                );
                println!();
                let go = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("  Start claim?")
                    .default(true)
                    .interact()?;
                if go {
                    report(wizard.next_step().map(|_| ()));
                }
                go
            }
            StepView::ChooseDelegate { input_value, .. } => {
                choose_delegate(wizard, input_value).await?
            }
            StepView::Review {
                claimable_tokens,
                delegate,
            } => {
                println!(
                    "  Amount:   {} {}",
                    style(claimable_tokens).cyan(),
                    wizard.config().token_symbol
                );
                if let Some(delegate) = &delegate {
                    println!("  Delegate: {}", style(delegate.label()).cyan());
                }
                println!();

                let choice = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt("  Ready?")
                    .items(&["Claim", "Back"])
                    .default(0)
                    .interact()?;
                if choice == 0 {
                    println!();
                    println!("  {} Confirm the transaction in your wallet...", style("→").cyan());
                    match wizard.handle_claim_tokens().await {
                        Ok(attempt) => print_attempt(&attempt),
                        Err(e) => print_refused(&e),
                    }
                } else {
                    report(wizard.prev_step().map(|_| ()));
                }
                true
            }
            StepView::Confirming {
                show_try_again,
                tx,
                ..
            } => {
                if let Some(tx) = tx {
                    println!("  Transaction: {}", style(tx).dim());
                }
                if let Some(error) = &view.error {
                    println!("  {} {}", style("✗").red(), error);
                }
                if !show_try_again {
                    // still waiting on a previous submission
                    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
                    true
                } else {
                    let retry = Confirm::with_theme(&ColorfulTheme::default())
                        .with_prompt("  Try again?")
                        .default(true)
                        .interact()?;
                    if retry {
                        match wizard.retry_claim().await {
                            Ok(attempt) => print_attempt(&attempt),
                            Err(e) => print_refused(&e),
                        }
                    }
                    retry
                }
            }
            StepView::Claimed => {
                println!();
                println!("  {}", style("═".repeat(50)).dim());
                println!();
                println!(
                    "  {} {} claimed and delegated!",
                    style("✓").green().bold(),
                    wizard.config().token_symbol
                );
                println!();
                false
            }
        };

        if !keep_going {
            break;
        }
    }

    Ok(())
}

fn check_gate(gate: ClaimGate, expected_chain: u64) -> bool {
    match gate {
        ClaimGate::Open => return true,
        ClaimGate::Loading => println!("  {} Loading claim data...", style("ℹ").blue()),
        ClaimGate::Disconnected => {
            println!("  {} Connect a wallet to continue", style("⚠").yellow())
        }
        ClaimGate::WrongNetwork { connected, .. } => println!(
            "  {} Wallet is on chain {}; switch to chain {} to claim",
            style("⚠").yellow(),
            connected,
            expected_chain
        ),
        ClaimGate::Warning { message } => println!("  {} {}", style("⚠").yellow(), message),
        ClaimGate::NotEligible => println!(
            "  {} This account has no tokens to claim",
            style("ℹ").blue()
        ),
    }
    false
}

async fn choose_delegate<P: ClaimProvider>(
    wizard: &ClaimWizard<P>,
    current_input: String,
) -> Result<bool> {
    println!(
        "  {}",
        style("Delegates vote on your behalf. You keep your tokens and can change delegate later.")
            .dim()
    );
    println!();

    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("  Delegate address (empty to go back)")
        .with_initial_text(current_input)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        report(wizard.prev_step().map(|_| ()));
        return Ok(true);
    }

    wizard.set_input_value(input.trim());
    if let Err(e) = wizard.select_delegate_from_input() {
        print_refused(&e);
        return Ok(true);
    }

    println!("  {} Checking delegate votes...", style("→").cyan());
    match wizard.continue_with_delegate().await {
        Ok(DelegateCheck::Advanced) | Ok(DelegateCheck::Stale) => {}
        Ok(DelegateCheck::NeedsConfirmation) => {
            println!();
            println!(
                "  {} This delegate already holds a large share of votes.",
                style("⚠").yellow()
            );
            println!(
                "  {}",
                style("Spreading votes across delegates keeps governance healthy.").dim()
            );
            let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("  Delegate to them anyway?")
                .default(false)
                .interact()?;
            report(wizard.handle_delegate_confirm(confirmed).map(|_| ()));
        }
        Err(e) => print_refused(&e),
    }
    Ok(true)
}

fn print_attempt(attempt: &ClaimAttempt) {
    match attempt {
        ClaimAttempt::Claimed(receipt) => {
            println!("  {} Confirmed in {}", style("✓").green(), style(receipt.hash).cyan())
        }
        ClaimAttempt::Rejected { status } => println!(
            "  {} Transaction finished with status {}",
            style("✗").red(),
            status
        ),
        ClaimAttempt::Stale => println!(
            "  {} Claim state changed while waiting for the wallet",
            style("ℹ").blue()
        ),
        ClaimAttempt::Failed { .. } => {}
    }
}

fn print_refused(err: &WizardError) {
    println!("  {} {}", style("✗").red(), err);
}

fn report(result: Result<(), WizardError>) {
    if let Err(e) = result {
        print_refused(&e);
    }
}
