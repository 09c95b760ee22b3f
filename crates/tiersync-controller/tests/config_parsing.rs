use std::{env, fs};

use tiersync_controller::config::loader::{load_config, load_config_with_default_path};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tiersync.toml");

    let toml_content = r#"
[controller]
failure_threshold = 3
retry_delay_ms = 2500
workers = 2
resync_on_lag = false

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.controller.failure_threshold, 3);
    assert_eq!(cfg.controller.retry_delay_ms, 2500);
    assert_eq!(cfg.controller.workers, 2);
    assert!(!cfg.controller.resync_on_lag);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("TIERSYNC__CONTROLLER__FAILURE_THRESHOLD", "7");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.controller.failure_threshold, 7);
    unsafe {
        env::remove_var("TIERSYNC__CONTROLLER__FAILURE_THRESHOLD");
    }

    // 3) Missing sections fall back to defaults
    let partial = dir.path().join("partial.toml");
    fs::write(&partial, "[logging]\nlevel = \"warn\"\n").expect("write toml");
    let cfg = load_config_with_default_path(Some(&partial)).expect("should parse partial config");
    assert_eq!(cfg.controller.failure_threshold, 2);
    assert_eq!(cfg.controller.retry_delay_ms, 5000);
    assert_eq!(cfg.controller.workers, 4);
    assert!(cfg.controller.resync_on_lag);

    // 4) A missing file is not an error
    let missing = dir.path().join("missing.toml");
    let cfg = load_config(missing.to_str()).expect("defaults without a file");
    assert_eq!(cfg.logging.level, "info");

    // 5) Invalid values are rejected
    let invalid = dir.path().join("invalid.toml");
    fs::write(&invalid, "[controller]\nfailure_threshold = 0\n").expect("write toml");
    let err = load_config(invalid.to_str()).expect_err("threshold 0 must be rejected");
    assert!(err.contains("failure_threshold"));

    let invalid_level = dir.path().join("invalid_level.toml");
    fs::write(&invalid_level, "[logging]\nlevel = \"loud\"\n").expect("write toml");
    assert!(load_config(invalid_level.to_str()).is_err());
}
