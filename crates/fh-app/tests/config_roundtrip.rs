use std::path::PathBuf;

use fh_app::{ConfigError, ControllerConfig, load_json, load_yaml, save_yaml};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[test]
fn demo_config_loads() {
    let config = load_yaml(&demo("floorheat.yaml")).unwrap();
    assert_eq!(config.orchestrator.initial_open_valves, 2);
    assert_eq!(config.valve.ticks_per_percent, 55);
    assert_eq!(config.sensors, ControllerConfig::default().sensors);
}

#[test]
fn roundtrip_yaml_file() {
    let mut config = ControllerConfig::default();
    config.curve.slope = -0.45;
    config.regulator.tn_s = 300.0;
    config.valve.recalibration_interval_s = 12 * 3600;

    let path = std::env::temp_dir().join("fh_app_roundtrip.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn json_config_is_accepted() {
    let path = std::env::temp_dir().join("fh_app_config.json");
    std::fs::write(&path, r#"{ "curve": { "origin": 30.0 } }"#).unwrap();
    let config = load_json(&path).unwrap();
    assert_eq!(config.curve.origin, 30.0);
    assert_eq!(config.curve.slope, -0.3);
}

#[test]
fn invalid_config_is_not_saved() {
    let mut config = ControllerConfig::default();
    config.valve.ticks_per_percent = 0;
    let path = std::env::temp_dir().join("fh_app_invalid.yaml");
    let err = save_yaml(&path, &config).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { section: "valve", .. }));
}

#[test]
fn missing_file_reports_path() {
    let err = load_yaml(&demo("does-not-exist.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("does-not-exist.yaml"));
}
