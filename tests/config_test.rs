use sloguard::config::SloguardConfig;
use sloguard::flags::FlagName;
use sloguard::guard::RecoveryPolicy;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn missing_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = SloguardConfig::load_from(tmp.path().join("nope.toml")).unwrap();

    assert_eq!(config.guard.slo_threshold_ms, 250);
    assert_eq!(config.guard.cooldown_secs, 600);
    assert_eq!(config.guard.recovery, RecoveryPolicy::Manual);
}

#[test]
fn file_values_reach_guard_settings() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[guard]
capacity = 200
min_samples = 50
tail_percentile = 0.99
cooldown_secs = 30
governed_flag = "PROPAGATION_ON"
recovery = "auto"
"#,
    )
    .unwrap();

    let config = SloguardConfig::load_from(&path).unwrap();
    let settings = config.guard.settings().unwrap();

    assert_eq!(settings.capacity, 200);
    assert_eq!(settings.min_samples, 50);
    assert_eq!(settings.tail_percentile, 0.99);
    assert_eq!(settings.cooldown, Duration::from_secs(30));
    assert_eq!(settings.governed_flag, FlagName::PropagationEnabled);
    assert_eq!(settings.recovery, RecoveryPolicy::Auto);
}

#[test]
fn malformed_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[guard]\ncapacity = \"lots\"\n").unwrap();

    let err = SloguardConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse config TOML"));
}

#[test]
fn unknown_recovery_policy_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[guard]\nrecovery = \"sometimes\"\n").unwrap();

    assert!(SloguardConfig::load_from(&path).is_err());
}
