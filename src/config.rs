//! Configuration
//!
//! - `WizardConfig`: claim chain, token symbol, receipt success status and
//!   the many-votes warning threshold
//! - `StatsWorkerConfig`: API keys, database path and per-chain RPC
//!   endpoints for the statistics worker
//!
//! Both read the process environment through `from_env`, or any lookup
//! function through `from_lookup`. Binaries call [`load_dotenv`] first so a
//! `.env` file in the working directory fills in unset variables.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::claim::SUCCESS_STATUS;
use crate::error::ConfigError;
use crate::types::TokenAmount;

/// Bridged tokens and the chains each is bridged to, mainnet
pub const MAINNET_BRIDGES: &[(&str, &[&str])] = &[
    (
        "USDC",
        &["ethereum", "polygon", "gnosis", "optimism", "arbitrum", "base"],
    ),
    (
        "USDT",
        &["ethereum", "polygon", "gnosis", "optimism", "arbitrum"],
    ),
    ("DAI", &["ethereum", "polygon", "gnosis", "optimism", "arbitrum"]),
    (
        "ETH",
        &[
            "ethereum",
            "polygon",
            "gnosis",
            "optimism",
            "arbitrum",
            "nova",
            "base",
            "linea",
            "polygonzk",
        ],
    ),
    ("MATIC", &["ethereum", "polygon", "gnosis"]),
    (
        "HOP",
        &[
            "ethereum",
            "polygon",
            "gnosis",
            "optimism",
            "arbitrum",
            "nova",
            "base",
            "linea",
            "polygonzk",
        ],
    ),
    ("SNX", &["ethereum", "optimism"]),
    ("sUSD", &["ethereum", "optimism"]),
    ("rETH", &["ethereum", "optimism", "arbitrum"]),
    ("MAGIC", &["ethereum", "arbitrum", "nova"]),
];

/// Public RPC endpoint used when `<CHAIN>_RPC` is not set
pub fn default_rpc_url(chain: &str) -> Option<&'static str> {
    match chain {
        "ethereum" => Some("https://rpc.ankr.com/eth"),
        "polygon" => Some("https://polygon-rpc.com"),
        "gnosis" => Some("https://rpc.gnosischain.com"),
        "optimism" => Some("https://mainnet.optimism.io"),
        "arbitrum" => Some("https://arb1.arbitrum.io/rpc"),
        "nova" => Some("https://nova.arbitrum.io/rpc"),
        "base" => Some("https://mainnet.base.org"),
        "linea" => Some("https://rpc.linea.build"),
        "polygonzk" => Some("https://zkevm-rpc.com"),
        _ => None,
    }
}

/// Variables that were renamed, with their replacement
const DEPRECATED_VARS: &[(&str, &str)] = &[
    ("XDAI_RPC", "GNOSIS_RPC"),
    ("XDAI_ARCHIVE_RPC", "GNOSIS_ARCHIVE_RPC"),
];

const REDACTED: &str = "[REDACTED]";

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Load `.env` from the working directory or its parents, if there is one.
/// Variables already set in the process environment win.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::EnvFile {
            path: ".env".to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Load variables from a specific env file. Existing variables win.
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Look up `key`, treating an empty value as unset
fn lookup_non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup_non_empty(lookup, key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

/// Claim wizard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Chain id the claim contract lives on
    pub claim_chain_id: u64,
    /// Symbol of the claimed token
    pub token_symbol: String,
    /// Receipt status counted as a successful claim
    pub success_status: u64,
    /// Delegates holding more votes than this need an explicit confirm
    pub many_votes_threshold: TokenAmount,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            claim_chain_id: 1,
            token_symbol: "HOP".to_string(),
            success_status: SUCCESS_STATUS,
            many_votes_threshold: TokenAmount::from_tokens(5_000_000),
        }
    }
}

impl WizardConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let threshold_tokens: u128 = parse_var(
            &lookup,
            "CLAIM_MANY_VOTES_THRESHOLD",
            default.many_votes_threshold.base_units() / TokenAmount::from_tokens(1).base_units(),
        )?;

        Ok(Self {
            claim_chain_id: parse_var(&lookup, "CLAIM_CHAIN_ID", default.claim_chain_id)?,
            token_symbol: lookup_non_empty(&lookup, "CLAIM_TOKEN_SYMBOL")
                .unwrap_or(default.token_symbol),
            success_status: parse_var(&lookup, "CLAIM_SUCCESS_STATUS", default.success_status)?,
            many_votes_threshold: TokenAmount::from_tokens(threshold_tokens),
        })
    }
}

/// Statistics worker configuration
#[derive(Clone, Serialize)]
pub struct StatsWorkerConfig {
    pub pinata_api_key: Option<String>,
    pub pinata_secret_api_key: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    /// SQLite database file
    pub db_path: String,
    pub coingecko_api_key: String,
    /// Tokens with a bridge, in table order
    pub enabled_tokens: IndexSet<String>,
    /// Chains with any bridge, in first-seen order
    pub enabled_chains: IndexSet<String>,
    pub etherscan_api_keys: IndexMap<String, Option<String>>,
    pub rpc_urls: IndexMap<String, String>,
    /// Only chains with `<CHAIN>_ARCHIVE_RPC` set
    pub archive_rpc_urls: IndexMap<String, String>,
}

// Custom Debug implementation that redacts credentials
impl std::fmt::Debug for StatsWorkerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = self.redacted();
        f.debug_struct("StatsWorkerConfig")
            .field("pinata_api_key", &redacted.pinata_api_key)
            .field("pinata_secret_api_key", &redacted.pinata_secret_api_key)
            .field("aws_access_key_id", &redacted.aws_access_key_id)
            .field("aws_secret_access_key", &redacted.aws_secret_access_key)
            .field("aws_region", &self.aws_region)
            .field("aws_profile", &self.aws_profile)
            .field("db_path", &self.db_path)
            .field("coingecko_api_key", &redacted.coingecko_api_key)
            .field("enabled_tokens", &self.enabled_tokens)
            .field("enabled_chains", &self.enabled_chains)
            .field("etherscan_api_keys", &redacted.etherscan_api_keys)
            .field("rpc_urls", &self.rpc_urls)
            .field("archive_rpc_urls", &self.archive_rpc_urls)
            .finish()
    }
}

impl StatsWorkerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for &(var, replacement) in DEPRECATED_VARS {
            if lookup_non_empty(&lookup, var).is_some() {
                return Err(ConfigError::Deprecated { var, replacement });
            }
        }

        let mut enabled_tokens = IndexSet::new();
        let mut enabled_chains = IndexSet::new();
        for (token, chains) in MAINNET_BRIDGES {
            enabled_tokens.insert(token.to_string());
            for chain in chains.iter() {
                enabled_chains.insert(chain.to_string());
            }
        }

        let mut etherscan_api_keys = IndexMap::new();
        let mut rpc_urls = IndexMap::new();
        let mut archive_rpc_urls = IndexMap::new();
        for chain in &enabled_chains {
            let prefix = chain.to_uppercase();

            etherscan_api_keys.insert(
                chain.clone(),
                lookup_non_empty(&lookup, &format!("ETHERSCAN_{}_API_KEY", prefix)),
            );

            let rpc = lookup_non_empty(&lookup, &format!("{}_RPC", prefix))
                .or_else(|| default_rpc_url(chain).map(str::to_string));
            if let Some(url) = rpc {
                rpc_urls.insert(chain.clone(), url);
            }

            if let Some(url) = lookup_non_empty(&lookup, &format!("{}_ARCHIVE_RPC", prefix)) {
                archive_rpc_urls.insert(chain.clone(), url);
            }
        }

        Ok(Self {
            pinata_api_key: lookup_non_empty(&lookup, "PINATA_API_KEY"),
            pinata_secret_api_key: lookup_non_empty(&lookup, "PINATA_SECRET_API_KEY"),
            aws_access_key_id: lookup_non_empty(&lookup, "AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: lookup_non_empty(&lookup, "AWS_SECRET_ACCESS_KEY"),
            aws_region: lookup_non_empty(&lookup, "AWS_REGION"),
            aws_profile: lookup_non_empty(&lookup, "AWS_PROFILE"),
            db_path: lookup_non_empty(&lookup, "SQLITE3_DB")
                .unwrap_or_else(|| "./sqlite3.db".to_string()),
            coingecko_api_key: lookup("COINGECKO_API_KEY").unwrap_or_default(),
            enabled_tokens,
            enabled_chains,
            etherscan_api_keys,
            rpc_urls,
            archive_rpc_urls,
        })
    }

    /// Copy with every credential replaced by a placeholder
    pub fn redacted(&self) -> Self {
        let hide = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        Self {
            pinata_api_key: hide(&self.pinata_api_key),
            pinata_secret_api_key: hide(&self.pinata_secret_api_key),
            aws_access_key_id: hide(&self.aws_access_key_id),
            aws_secret_access_key: hide(&self.aws_secret_access_key),
            coingecko_api_key: if self.coingecko_api_key.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            },
            etherscan_api_keys: self
                .etherscan_api_keys
                .iter()
                .map(|(chain, key)| (chain.clone(), hide(key)))
                .collect(),
            ..self.clone()
        }
    }
}
