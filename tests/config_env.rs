//! Configuration read from the real process environment

use claim_wizard::{load_env_file, ConfigError, StatsWorkerConfig, TokenAmount, WizardConfig};
use std::io::Write;
use serial_test::serial;

const VARS: &[&str] = &[
    "CLAIM_CHAIN_ID",
    "CLAIM_TOKEN_SYMBOL",
    "CLAIM_MANY_VOTES_THRESHOLD",
    "XDAI_RPC",
    "POLYGON_RPC",
    "GNOSIS_RPC",
];

fn clear_vars() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_wizard_config_from_env() {
    clear_vars();
    std::env::set_var("CLAIM_CHAIN_ID", "10");
    std::env::set_var("CLAIM_TOKEN_SYMBOL", "GOV");
    std::env::set_var("CLAIM_MANY_VOTES_THRESHOLD", "42");

    let config = WizardConfig::from_env().unwrap();
    assert_eq!(config.claim_chain_id, 10);
    assert_eq!(config.token_symbol, "GOV");
    assert_eq!(config.many_votes_threshold, TokenAmount::from_tokens(42));

    clear_vars();
}

#[test]
#[serial]
fn test_stats_config_from_env() {
    clear_vars();
    std::env::set_var("POLYGON_RPC", "https://polygon.internal");

    let config = StatsWorkerConfig::from_env().unwrap();
    assert_eq!(config.rpc_urls["polygon"], "https://polygon.internal");

    std::env::set_var("XDAI_RPC", "https://xdai.internal");
    assert!(matches!(
        StatsWorkerConfig::from_env(),
        Err(ConfigError::Deprecated { var: "XDAI_RPC", .. })
    ));

    clear_vars();
}

#[test]
#[serial]
fn test_env_file_fills_unset_vars() {
    clear_vars();
    std::env::set_var("CLAIM_CHAIN_ID", "10");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "CLAIM_CHAIN_ID=5").unwrap();
    writeln!(file, "CLAIM_TOKEN_SYMBOL=GOV").unwrap();
    writeln!(file, "GNOSIS_RPC=https://gnosis.internal").unwrap();
    load_env_file(file.path()).unwrap();

    // The process environment wins over the file
    let config = WizardConfig::from_env().unwrap();
    assert_eq!(config.claim_chain_id, 10);
    assert_eq!(config.token_symbol, "GOV");

    let stats = StatsWorkerConfig::from_env().unwrap();
    assert_eq!(stats.rpc_urls["gnosis"], "https://gnosis.internal");

    clear_vars();
}

#[test]
fn test_missing_env_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_env_file(&dir.path().join("missing.env")).unwrap_err();
    assert!(matches!(err, ConfigError::EnvFile { .. }));
}
