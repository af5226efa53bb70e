//! Wizard steps and their display payloads

use serde::{Deserialize, Serialize};

use crate::types::{Delegate, TokenAmount, TxHash};

/// Current step in the claim wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStep {
    Start,
    ChooseDelegate,
    Review,
    Confirming,
    Claimed,
}

impl ClaimStep {
    pub const ALL: [ClaimStep; 5] = [
        Self::Start,
        Self::ChooseDelegate,
        Self::Review,
        Self::Confirming,
        Self::Claimed,
    ];

    pub fn index(&self) -> usize {
        match self {
            Self::Start => 0,
            Self::ChooseDelegate => 1,
            Self::Review => 2,
            Self::Confirming => 3,
            Self::Claimed => 4,
        }
    }

    /// Following step; Claimed is terminal
    pub fn next(&self) -> Self {
        match self {
            Self::Start => Self::ChooseDelegate,
            Self::ChooseDelegate => Self::Review,
            Self::Review => Self::Confirming,
            Self::Confirming => Self::Claimed,
            Self::Claimed => Self::Claimed,
        }
    }

    /// Step the back button returns to, if it is offered here
    pub fn prev(&self) -> Option<Self> {
        match self {
            Self::ChooseDelegate => Some(Self::Start),
            Self::Review => Some(Self::ChooseDelegate),
            Self::Start | Self::Confirming | Self::Claimed => None,
        }
    }

    pub fn title(&self, token_symbol: &str) -> String {
        match self {
            Self::Start => format!("Claim {}", token_symbol),
            Self::ChooseDelegate => "Choose a Delegate".to_string(),
            Self::Review => "Review your Claim".to_string(),
            Self::Confirming => "Confirm with Wallet".to_string(),
            Self::Claimed => String::new(),
        }
    }
}

/// What a step needs to render, one variant per step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepView {
    Start {
        claimable_tokens: TokenAmount,
    },
    ChooseDelegate {
        input_value: String,
        delegate: Option<Delegate>,
        show_confirm_modal: bool,
        show_info_modal: Option<Delegate>,
    },
    Review {
        claimable_tokens: TokenAmount,
        delegate: Option<Delegate>,
    },
    Confirming {
        claiming: bool,
        tx: Option<TxHash>,
        delegate: Option<Delegate>,
        claimable_tokens: TokenAmount,
        show_try_again: bool,
    },
    Claimed,
}

impl StepView {
    pub fn step(&self) -> ClaimStep {
        match self {
            Self::Start { .. } => ClaimStep::Start,
            Self::ChooseDelegate { .. } => ClaimStep::ChooseDelegate,
            Self::Review { .. } => ClaimStep::Review,
            Self::Confirming { .. } => ClaimStep::Confirming,
            Self::Claimed => ClaimStep::Claimed,
        }
    }
}

/// Everything the presentation layer shows for the current step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    pub step: ClaimStep,
    pub title: String,
    pub payload: StepView,
    pub error: Option<String>,
}
