//! Pre-step checks shown around the wizard

use serde::Serialize;

use crate::claim::ClaimContext;

/// Why the steps are (or are not) available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum ClaimGate {
    /// Provider still loading claim data
    Loading,
    /// No wallet connected
    Disconnected,
    /// Wallet on a chain other than the claim chain
    WrongNetwork { expected: u64, connected: u64 },
    /// Provider warning, e.g. an unsupported wallet
    Warning { message: String },
    /// Connected account has nothing to claim
    NotEligible,
    /// Steps can be shown
    Open,
}

impl ClaimGate {
    pub fn evaluate(ctx: &ClaimContext, connected_chain: Option<u64>, expected_chain: u64) -> Self {
        if ctx.loading {
            return Self::Loading;
        }
        let connected = match connected_chain {
            Some(id) => id,
            None => return Self::Disconnected,
        };
        if connected != expected_chain {
            return Self::WrongNetwork {
                expected: expected_chain,
                connected,
            };
        }
        // Claimed accounts still see the final step
        if ctx.has_already_claimed {
            return Self::Open;
        }
        if let Some(warning) = &ctx.warning {
            return Self::Warning {
                message: warning.clone(),
            };
        }
        if !ctx.can_claim {
            return Self::NotEligible;
        }
        Self::Open
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible() -> ClaimContext {
        ClaimContext {
            can_claim: true,
            ..ClaimContext::default()
        }
    }

    #[test]
    fn test_gate_order() {
        let mut ctx = eligible();
        ctx.loading = true;
        ctx.warning = Some("warn".into());
        assert_eq!(ClaimGate::evaluate(&ctx, None, 1), ClaimGate::Loading);

        ctx.loading = false;
        assert_eq!(ClaimGate::evaluate(&ctx, None, 1), ClaimGate::Disconnected);
        assert_eq!(
            ClaimGate::evaluate(&ctx, Some(10), 1),
            ClaimGate::WrongNetwork {
                expected: 1,
                connected: 10
            }
        );
        assert_eq!(
            ClaimGate::evaluate(&ctx, Some(1), 1),
            ClaimGate::Warning {
                message: "warn".into()
            }
        );
    }

    #[test]
    fn test_gate_eligibility() {
        let ctx = ClaimContext::default();
        assert_eq!(ClaimGate::evaluate(&ctx, Some(1), 1), ClaimGate::NotEligible);
        assert!(ClaimGate::evaluate(&eligible(), Some(1), 1).is_open());
    }

    #[test]
    fn test_gate_serializes_tagged() {
        let json = serde_json::to_value(ClaimGate::Warning {
            message: "unsupported wallet".into(),
        })
        .unwrap();
        assert_eq!(json["gate"], "warning");
        assert_eq!(json["message"], "unsupported wallet");
    }

    #[test]
    fn test_claimed_account_is_open() {
        let ctx = ClaimContext {
            has_already_claimed: true,
            warning: Some("nothing left".into()),
            ..ClaimContext::default()
        };
        assert!(ClaimGate::evaluate(&ctx, Some(1), 1).is_open());
    }
}
