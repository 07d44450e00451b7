//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use std::fs;

use streetlevel::config::AppConfig;
use serial_test::serial;

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("SL_PHYSICS__GRAVITY", "-20.0");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("SL_PHYSICS__GRAVITY");

    assert_eq!(config.physics.gravity, -20.0);
    assert_eq!(config.to_physics_config().gravity, -20.0);
}

#[test]
#[serial]
fn test_env_override_nested_telemetry() {
    std::env::set_var("SL_TELEMETRY__POLL_INTERVAL_MS", "100");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("SL_TELEMETRY__POLL_INTERVAL_MS");

    assert_eq!(config.telemetry.poll_interval_ms, 100);
}

#[test]
#[serial]
fn test_default_file_loading() {
    std::env::remove_var("SL_PHYSICS__GRAVITY");

    let cwd = std::env::current_dir().unwrap();
    assert!(cwd.join("config/default.toml").exists());

    let config = AppConfig::load().unwrap();
    assert_eq!(config.scene.path, "scenes/city.ron");
    assert_eq!(config.vehicle.gear_max_speeds.len(), 5);
    assert_eq!(config.vehicle.to_vehicle_spec().gears.top_gear(), 5);
}

#[test]
#[serial]
fn test_user_file_overrides_default() {
    let dir = std::env::temp_dir().join(format!("streetlevel-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::copy("config/default.toml", dir.join("default.toml")).unwrap();
    fs::write(
        dir.join("user.toml"),
        "[vehicle]\nredline_rpm = 6500.0\n\n[debug]\nshow_colliders = true\n",
    )
    .unwrap();

    let config = AppConfig::load_from(&dir);
    fs::remove_dir_all(&dir).ok();
    let config = config.unwrap();

    assert_eq!(config.vehicle.redline_rpm, 6500.0);
    // Untouched keys keep the default file's values
    assert_eq!(config.vehicle.idle_rpm, 900.0);
    assert!(config.to_physics_config().debug_colliders);
}

#[test]
#[serial]
fn test_invalid_value_is_an_error() {
    std::env::set_var("SL_TELEMETRY__POLL_INTERVAL_MS", "often");
    let result = AppConfig::load();
    std::env::remove_var("SL_TELEMETRY__POLL_INTERVAL_MS");

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}
