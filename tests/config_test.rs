//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge semantics:
//! - Defaults → Global: REPLACE (global defines the real baseline)
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! The layers are read from process-global state (XDG_CONFIG_HOME and the
//! VIGNETTE_* variables), so the whole precedence walk runs as one
//! sequential test.

use std::env;
use std::fs;

use tempfile::TempDir;

use vignette::config::Settings;
use vignette::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn clear_vignette_env() {
    for key in [
        "VIGNETTE_METHOD",
        "VIGNETTE_DRAW_MULTIPLE",
        "VIGNETTE_OUTPUT",
        "VIGNETTE_MAX_DEPTH",
        "VIGNETTE_SEED",
    ] {
        env::remove_var(key);
    }
}

#[test]
fn given_layered_sources_when_loading_then_each_layer_overrides_the_last() {
    // Arrange - point the config dir at a fresh temp home
    let temp = TempDir::new().unwrap();
    env::set_var("XDG_CONFIG_HOME", temp.path());
    clear_vignette_env();

    // Act + Assert - nothing on disk, nothing in the environment
    let settings = Settings::load().expect("load defaults");
    assert_eq!(settings, Settings::default());

    // Arrange - write a global config
    let config_dir = temp.path().join("vignette");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("vignette.toml"),
        r#"
method = "complex"
draw_multiple = true
output = "text"
max_depth = 8
seed = 99
"#,
    )
    .unwrap();

    // Act + Assert - global replaces defaults where specified
    let settings = Settings::load().expect("load global");
    assert_eq!(settings.method, "complex");
    assert!(settings.draw_multiple);
    assert_eq!(settings.output, "text");
    assert_eq!(settings.max_depth, 8);
    assert_eq!(settings.seed, Some(99));

    // Arrange - environment overrides the global file
    env::set_var("VIGNETTE_METHOD", "simple");
    env::set_var("VIGNETTE_SEED", "7");

    // Act + Assert - env wins, untouched keys keep the global values
    let settings = Settings::load().expect("load with env");
    assert_eq!(settings.method, "simple");
    assert_eq!(settings.seed, Some(7));
    assert_eq!(settings.output, "text");
    assert_eq!(settings.max_depth, 8);

    // Cleanup
    clear_vignette_env();
    env::remove_var("XDG_CONFIG_HOME");
}
