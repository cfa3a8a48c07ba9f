//! Runtime configuration.
//!
//! Layers, lowest precedence first:
//! 1. built-in defaults
//! 2. optional TOML file (`--config` or `CANCERAI_CONFIG`)
//! 3. `CANCERAI_*` environment variables
//! 4. command-line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{FlowConfig, Variant};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CREDENTIAL_FILE: &str = ".cancerai/credential.json";
pub const DEFAULT_LOG_FILE: &str = "cancerai.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Shape of the TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub variant: Option<Variant>,
    pub requires_auth: Option<bool>,
    pub show_samples: Option<bool>,
    pub show_explanation: Option<bool>,
    pub scale_confidence: Option<bool>,
    pub credential_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    fn has_flags(&self) -> bool {
        self.requires_auth.is_some()
            || self.show_samples.is_some()
            || self.show_explanation.is_some()
            || self.scale_confidence.is_some()
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub variant: Option<Variant>,
    pub credential_file: Option<PathBuf>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub variant: Variant,
    pub flow: FlowConfig,
    pub credential_file: PathBuf,
    pub log_file: PathBuf,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            variant: Variant::Doctor,
            flow: Variant::Doctor.flow_config(),
            credential_file: PathBuf::from(DEFAULT_CREDENTIAL_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Load from file, process environment and flags.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or the result is invalid.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os("CANCERAI_CONFIG").map(PathBuf::from);
        let file = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => read_file_config(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Merge the layers. `env` looks up one variable by name.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` for bad values.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let env_variant = env("CANCERAI_VARIANT")
            .map(|v| v.parse::<Variant>().map_err(ConfigError::Invalid))
            .transpose()?;
        let env_timeout = env("CANCERAI_TIMEOUT_SECS")
            .map(|v| {
                v.trim().parse::<u64>().map_err(|_| {
                    ConfigError::Invalid(format!("CANCERAI_TIMEOUT_SECS must be an integer, got {v:?}"))
                })
            })
            .transpose()?;

        let variant = overrides
            .variant
            .or(env_variant)
            .or(file.variant)
            .unwrap_or_default();

        // Flag keys tune the file's own variant. Picking another variant from
        // the environment or the command line starts from its presets.
        let base = variant.flow_config();
        let flow = if file.variant.unwrap_or_default() == variant {
            FlowConfig {
                requires_auth: file.requires_auth.unwrap_or(base.requires_auth),
                show_samples: file.show_samples.unwrap_or(base.show_samples),
                show_explanation: file.show_explanation.unwrap_or(base.show_explanation),
                scale_confidence: file.scale_confidence.unwrap_or(base.scale_confidence),
            }
        } else {
            if file.has_flags() {
                tracing::debug!("Ignoring flow flags from the config file for variant {variant}");
            }
            base
        };

        let config = Self {
            api_url: overrides
                .api_url
                .clone()
                .or_else(|| env("CANCERAI_API_URL"))
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            variant,
            flow,
            credential_file: overrides
                .credential_file
                .clone()
                .or_else(|| env("CANCERAI_CREDENTIAL_FILE").map(PathBuf::from))
                .or(file.credential_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIAL_FILE)),
            log_file: env("CANCERAI_LOG_FILE")
                .map(PathBuf::from)
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            timeout: Duration::from_secs(
                env_timeout
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout_secs must be greater than 0".to_string()));
        }
        if self.credential_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("credential_file must not be empty".to_string()));
        }
        Ok(())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::resolve(FileConfig::default(), env_from(&[]), &Overrides::default())
            .expect("Should resolve");
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.flow.requires_auth);
    }

    #[test]
    fn test_file_flags_override_variant() {
        let file: FileConfig = toml::from_str(
            r#"
variant = "anonymous"
scale_confidence = true
api_url = "https://cancerai.example.org"
"#,
        )
        .unwrap();
        let cfg = AppConfig::resolve(file, env_from(&[]), &Overrides::default()).unwrap();
        assert_eq!(cfg.variant, Variant::Anonymous);
        assert!(!cfg.flow.requires_auth);
        assert!(cfg.flow.scale_confidence);
        assert_eq!(cfg.api_url, "https://cancerai.example.org");
    }

    #[test]
    fn test_file_flags_ignored_for_other_variant() {
        let file: FileConfig = toml::from_str(
            r#"
variant = "doctor"
scale_confidence = false
show_samples = false
"#,
        )
        .unwrap();

        let cfg = AppConfig::resolve(file.clone(), env_from(&[]), &Overrides::default()).unwrap();
        assert!(!cfg.flow.scale_confidence);
        assert!(!cfg.flow.show_samples);

        let cli = Overrides {
            variant: Some(Variant::Samples),
            ..Default::default()
        };
        let cfg = AppConfig::resolve(file.clone(), env_from(&[]), &cli).unwrap();
        assert_eq!(cfg.flow, FlowConfig::samples());

        let env = env_from(&[("CANCERAI_VARIANT", "anonymous")]);
        let cfg = AppConfig::resolve(file, env, &Overrides::default()).unwrap();
        assert_eq!(cfg.flow, FlowConfig::anonymous());
    }

    #[test]
    fn test_flags_without_variant_tune_the_default() {
        let file = FileConfig {
            scale_confidence: Some(true),
            ..Default::default()
        };
        let cli = Overrides {
            variant: Some(Variant::Anonymous),
            ..Default::default()
        };
        let cfg = AppConfig::resolve(file, env_from(&[]), &cli).unwrap();
        assert!(!cfg.flow.scale_confidence);
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let file = FileConfig {
            api_url: Some("http://file:1".to_string()),
            timeout_secs: Some(3),
            ..Default::default()
        };
        let env = env_from(&[
            ("CANCERAI_API_URL", "http://env:2"),
            ("CANCERAI_VARIANT", "samples"),
            ("CANCERAI_TIMEOUT_SECS", "7"),
        ]);

        let cfg = AppConfig::resolve(file.clone(), &env, &Overrides::default()).unwrap();
        assert_eq!(cfg.api_url, "http://env:2");
        assert_eq!(cfg.variant, Variant::Samples);
        assert_eq!(cfg.timeout, Duration::from_secs(7));

        let cli = Overrides {
            api_url: Some("http://cli:3".to_string()),
            variant: Some(Variant::Doctor),
            credential_file: None,
        };
        let cfg = AppConfig::resolve(file, &env, &cli).unwrap();
        assert_eq!(cfg.api_url, "http://cli:3");
        assert_eq!(cfg.variant, Variant::Doctor);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_url = FileConfig {
            api_url: Some("ftp://x".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(bad_url, env_from(&[]), &Overrides::default()).is_err());

        let zero = FileConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::resolve(zero, env_from(&[]), &Overrides::default()).is_err());

        assert!(AppConfig::resolve(
            FileConfig::default(),
            env_from(&[("CANCERAI_VARIANT", "admin")]),
            &Overrides::default()
        )
        .is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let parsed: Result<FileConfig, _> = toml::from_str("colour = \"blue\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cancerai.toml");
        std::fs::write(&path, "variant = \"samples\"\ntimeout_secs = 4\n").unwrap();

        let cfg = AppConfig::load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(cfg.variant, Variant::Samples);

        let missing = AppConfig::load(Some(&dir.path().join("nope.toml")), &Overrides::default());
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
