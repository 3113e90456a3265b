//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/vignette/vignette.toml`
//! 3. Environment variables: `VIGNETTE_*` prefix
//!
//! CLI flags override individual fields per invocation; that happens at
//! the call site, not here.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Method, OutputStyle, DEFAULT_MAX_DEPTH};

/// Unified configuration for vignette.
///
/// Method and output style are stored as plain strings so a config file
/// with a typo fails at the point of use with the domain's own message,
/// not during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Sampling method for branch selection ("simple" or "complex")
    pub method: String,
    /// Select several branches per order instead of exactly one
    pub draw_multiple: bool,
    /// Separator style for assembled vignettes ("html" or "text")
    pub output: String,
    /// Walk depth bound; reductions beyond this abort the walk
    pub max_depth: usize,
    /// Fixed RNG seed for reproducible draws
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            method: "simple".into(),
            draw_multiple: false,
            output: "html".into(),
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
        }
    }
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub method: Option<String>,
    pub draw_multiple: Option<bool>,
    pub output: Option<String>,
    pub max_depth: Option<usize>,
    pub seed: Option<u64>,
}

/// Get the XDG config directory for vignette.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "vignette").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("vignette.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Parse the configured sampling method.
    pub fn method(&self) -> Result<Method, ApplicationError> {
        Ok(self.method.parse::<Method>()?)
    }

    /// Parse the configured output style.
    pub fn output(&self) -> Result<OutputStyle, ApplicationError> {
        self.output
            .parse::<OutputStyle>()
            .map_err(|message| ApplicationError::Config { message })
    }

    /// Apply global config onto defaults; every specified field replaces
    /// the compiled default.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            method: global.method.clone().unwrap_or_else(|| self.method.clone()),
            draw_multiple: global.draw_multiple.unwrap_or(self.draw_multiple),
            output: global.output.clone().unwrap_or_else(|| self.output.clone()),
            max_depth: global.max_depth.unwrap_or(self.max_depth),
            seed: global.seed.or(self.seed),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/vignette/vignette.toml`
    /// 3. Environment variables: `VIGNETTE_*` prefix
    pub fn load() -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Load global config (replaces defaults where specified)
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Apply environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        Ok(current)
    }

    /// Apply VIGNETTE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder =
            Config::builder().add_source(Environment::with_prefix("VIGNETTE").separator("__"));

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("method") {
            settings.method = val;
        }
        if let Ok(val) = config.get_bool("draw_multiple") {
            settings.draw_multiple = val;
        }
        if let Ok(val) = config.get_string("output") {
            settings.output = val;
        }
        if let Ok(val) = config.get_int("max_depth") {
            if val > 0 {
                settings.max_depth = val as usize;
            }
        }
        if let Ok(val) = config.get_int("seed") {
            settings.seed = Some(val as u64);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# vignette configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/vignette/vignette.toml  (your baseline)
#   Env:    VIGNETTE_* environment variables  (explicit overrides)
#
# CLI flags override individual fields per invocation.

# Sampling method for branch selection: "simple" or "complex"
# method = "simple"

# Select several branches per order instead of exactly one
# draw_multiple = false

# Separator style for assembled vignettes: "html" or "text"
# output = "html"

# Walk depth bound; trees needing more reduction rounds abort the walk
# max_depth = 64

# Fixed RNG seed for reproducible draws (omit for a fresh seed per run)
# seed = 42
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn given_no_overrides_when_created_then_simple_single_html() {
        let settings = Settings::default();
        assert_eq!(settings.method, "simple");
        assert!(!settings.draw_multiple);
        assert_eq!(settings.output, "html");
        assert_eq!(settings.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_apply_global_replaces_specified_fields() {
        let base = Settings::default();
        let global = RawSettings {
            method: Some("complex".to_string()),
            draw_multiple: Some(true),
            output: None,
            max_depth: None,
            seed: Some(7),
        };

        let result = base.apply_global(&global);

        assert_eq!(result.method, "complex");
        assert!(result.draw_multiple);
        assert_eq!(result.output, "html", "unspecified fields keep defaults");
        assert_eq!(result.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(result.seed, Some(7));
    }

    #[test]
    fn test_apply_global_keeps_base_when_not_specified() {
        let base = Settings::default();
        let result = base.apply_global(&RawSettings::default());
        assert_eq!(result, base);
    }

    #[test]
    fn given_default_settings_when_parsing_method_then_simple() {
        let settings = Settings::default();
        assert_eq!(settings.method().unwrap(), Method::Simple);
        assert_eq!(settings.output().unwrap(), OutputStyle::Html);
    }

    #[test]
    fn given_bad_method_string_when_parsing_then_domain_error_message() {
        let settings = Settings {
            method: "fancy".to_string(),
            ..Settings::default()
        };
        let err = settings.method().unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidMethod(_))
        ));
    }

    #[test]
    fn given_bad_output_string_when_parsing_then_config_error() {
        let settings = Settings {
            output: "pdf".to_string(),
            ..Settings::default()
        };
        let err = settings.output().unwrap_err();
        assert!(matches!(err, ApplicationError::Config { .. }));
        assert!(err.to_string().contains("pdf"));
    }

    #[test]
    fn given_template_when_generated_then_names_every_field() {
        let template = Settings::template();
        for field in ["method", "draw_multiple", "output", "max_depth", "seed"] {
            assert!(template.contains(field), "template should mention {field}");
        }
    }

    #[test]
    fn given_settings_when_serialized_then_toml_parses_back() {
        let settings = Settings {
            method: "complex".to_string(),
            draw_multiple: true,
            output: "text".to_string(),
            max_depth: 8,
            seed: Some(42),
        };
        let toml_str = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }
}
