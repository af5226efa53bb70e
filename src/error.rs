//! Error types for the claim flow
//!
//! Provider failures (`ClaimError`) never reach the presentation layer raw:
//! they pass through [`format_error`] and surface as a [`FormattedError`].

use std::fmt;
use thiserror::Error;

use crate::wizard::ClaimStep;

/// Shown when a failure carries no usable message
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Longest message shown to the user
const MAX_ERROR_LEN: usize = 300;

/// Failed to parse an address or hash
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Failure reported by the claim-data provider
#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    #[error("User rejected the request: {0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Transaction reverted: {0}")]
    Reverted(String),
    #[error("{0}")]
    Other(String),
}

/// User-facing failure message produced by [`format_error`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedError(String);

impl FormattedError {
    pub fn from_raw(raw: &str) -> Self {
        Self(format_error(raw))
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    pub fn into_message(self) -> String {
        self.0
    }
}

impl fmt::Display for FormattedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FormattedError {}

impl From<&ClaimError> for FormattedError {
    fn from(err: &ClaimError) -> Self {
        Self::from_raw(&err.to_string())
    }
}

/// A wizard action that was refused; state is left untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("cannot {action} from step {step:?}")]
    InvalidTransition {
        step: ClaimStep,
        action: &'static str,
    },
    #[error("no tokens to claim")]
    NothingToClaim,
    #[error("no delegate selected")]
    NoDelegateSelected,
    #[error("no delegate confirmation pending")]
    NoPendingConfirmation,
    #[error("another request is in progress")]
    Busy,
    #[error("invalid delegate address: {0}")]
    InvalidAddress(#[from] ParseError),
    #[error("vote weight lookup failed: {0}")]
    VoteCheckFailed(FormattedError),
}

/// Invalid or deprecated configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is deprecated, use {replacement} instead")]
    Deprecated {
        var: &'static str,
        replacement: &'static str,
    },
    #[error("cannot load env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Turn a raw provider/wallet message into text fit for display
pub fn format_error(raw: &str) -> String {
    let mut msg = raw.trim();
    while let Some(rest) = msg.strip_prefix("Error:") {
        msg = rest.trim_start();
    }
    if msg.is_empty() {
        return DEFAULT_ERROR_MESSAGE.to_string();
    }

    let lower = msg.to_lowercase();
    if lower.contains("user denied")
        || lower.contains("user rejected")
        || lower.contains("rejected the request")
    {
        return "Transaction was rejected in your wallet".to_string();
    }
    if lower.contains("cannot estimate gas") || lower.contains("unpredictable_gas_limit") {
        return "The transaction would fail. Check that the tokens have not already been claimed and try again.".to_string();
    }
    if lower.contains("insufficient funds") {
        return "Insufficient funds to pay for gas".to_string();
    }
    if lower.contains("header not found") || lower.contains("internal json-rpc error") {
        return "RPC provider error, please try again".to_string();
    }

    // ethers-style messages append a `(key="value", ...)` or JSON payload
    let mut cut = msg.len();
    if let Some(i) = msg.find(" (") {
        if msg[i..].contains('=') {
            cut = cut.min(i);
        }
    }
    if let Some(i) = msg.find('{') {
        cut = cut.min(i);
    }
    let msg = msg[..cut].trim_end_matches([' ', ':', ',']).trim();
    if msg.is_empty() {
        return DEFAULT_ERROR_MESSAGE.to_string();
    }

    if msg.chars().count() > MAX_ERROR_LEN {
        let truncated: String = msg.chars().take(MAX_ERROR_LEN).collect();
        return format!("{}…", truncated);
    }
    msg.to_string()
}
