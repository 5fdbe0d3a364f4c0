//! Environment validation tests

use geoprobe::ConfigError;
use geoprobe::config::{ConnectionParams, REQUIRED_VARS, missing_vars};

#[test]
#[ignore = "requires the tut_* connection variables"]
fn test_conn_env_vars() {
    let missing = missing_vars(|name| std::env::var(name).ok());
    assert!(missing.is_empty(), "missing: {}", missing.join(", "));
}

#[test]
fn test_empty_environment_names_every_variable() {
    match ConnectionParams::from_lookup(|_| None) {
        Err(ConfigError::MissingVars(missing)) => assert_eq!(missing, REQUIRED_VARS.to_vec()),
        other => panic!("Expected MissingVars, got {:?}", other),
    }
}

#[test]
fn test_blank_values_rejected() {
    let result = ConnectionParams::from_lookup(|name| match name {
        "tut_password" => Some(String::new()),
        _ => Some("5432".to_string()),
    });
    match result {
        Err(ConfigError::MissingVars(missing)) => assert_eq!(missing, vec!["tut_password"]),
        other => panic!("Expected MissingVars, got {:?}", other),
    }
}

#[tokio::test]
async fn test_setup_fails_fast_without_environment() {
    // Only meaningful when the variables are absent
    if missing_vars(|name| std::env::var(name).ok()).is_empty() {
        eprintln!("Skipping test: tut_* variables are set");
        return;
    }
    let err = match crate::common::try_setup().await {
        Ok(_) => panic!("setup should fail without tut_* variables"),
        Err(e) => e,
    };
    assert!(
        err.downcast_ref::<ConfigError>().is_some(),
        "expected a configuration error, got {:#}",
        err
    );
}
