use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::classify::{DelegatedClassifier, DelegationSettings, GeminiOracle};
use crate::format::DEFAULT_OUTPUT_PREFIX;

pub const CONFIG_FILENAME: &str = "docx-stylist.toml";
pub const CONFIG_ENV: &str = "DOCX_STYLIST_CONFIG";
pub const MODEL_ENV: &str = "GOOGLE_MODEL";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub oracle: OracleSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct OracleSection {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variables probed, in order, for the API key.
    #[serde(default)]
    pub api_key_env: Option<Vec<String>>,
    #[serde(default)]
    pub label_temperature: Option<f32>,
    #[serde(default)]
    pub summary_temperature: Option<f32>,
    /// Deadline for one oracle call. Unset means no client-side timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub prompt_excerpt_chars: Option<usize>,
    #[serde(default)]
    pub summary_max_chars: Option<usize>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct OutputSection {
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Effective settings after defaults and overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct StylistConfig {
    pub config_path: Option<PathBuf>,
    pub model: String,
    pub endpoint: String,
    pub api_key_env: Vec<String>,
    pub timeout: Option<Duration>,
    pub delegation: DelegationSettings,
    pub output_prefix: String,
}

impl StylistConfig {
    /// Explicit path, then `DOCX_STYLIST_CONFIG`, then an upward search.
    /// A missing file means all defaults.
    pub fn from_sources(config_path: Option<PathBuf>, workdir: &Path) -> anyhow::Result<Self> {
        let cfg_file = config_path
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .or_else(|| find_default_config(workdir, CONFIG_FILENAME));

        let mut file_cfg = AppConfig::default();
        let mut loaded: Option<PathBuf> = None;
        if let Some(p) = cfg_file {
            if p.exists() {
                file_cfg = load_config(&p)?;
                loaded = Some(p);
            } else {
                debug!(path = %p.display(), "config file not found, using defaults");
            }
        }

        let model_override = std::env::var(MODEL_ENV).ok().filter(|s| !s.trim().is_empty());
        Ok(Self::resolve(file_cfg, loaded, model_override))
    }

    pub fn resolve(
        cfg: AppConfig,
        config_path: Option<PathBuf>,
        model_override: Option<String>,
    ) -> Self {
        let defaults = DelegationSettings::default();
        let o = cfg.oracle;
        Self {
            config_path,
            model: model_override
                .or(o.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: o.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key_env: o
                .api_key_env
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.iter().map(|s| s.to_string()).collect()),
            timeout: o.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            delegation: DelegationSettings {
                excerpt_chars: o.prompt_excerpt_chars.unwrap_or(defaults.excerpt_chars),
                label_temperature: o.label_temperature.unwrap_or(defaults.label_temperature),
                summary_temperature: o.summary_temperature.unwrap_or(defaults.summary_temperature),
                summary_max_chars: o.summary_max_chars.unwrap_or(defaults.summary_max_chars),
            },
            output_prefix: cfg
                .output
                .prefix
                .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
        }
    }

    /// The delegated classifier for this configuration. Without a credential
    /// delegation is simply unavailable.
    pub fn delegated_classifier(
        &self,
        credential: Option<&Credential>,
    ) -> anyhow::Result<DelegatedClassifier> {
        let Some(credential) = credential else {
            info!("no API key found, delegated classification disabled");
            return Ok(DelegatedClassifier::unavailable());
        };
        let oracle = GeminiOracle::new(&self.endpoint, &self.model, credential.secret(), self.timeout)
            .context("create oracle client")?;
        debug!(model = %self.model, "delegated classification enabled");
        Ok(DelegatedClassifier::new(Box::new(oracle), self.delegation.clone()))
    }
}

/// API key for the delegated oracle. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into().trim().to_string();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// First non-empty variable among `names`.
    pub fn discover(names: &[String]) -> Option<Self> {
        Self::discover_with(names, |n| std::env::var(n).ok())
    }

    pub fn discover_with(names: &[String], lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        names.iter().find_map(|n| lookup(n).and_then(Self::new))
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn find_default_config(workdir: &Path, filename: &str) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, filename, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, filename, 8) {
        return Some(p);
    }
    let exe = std::env::current_exe().ok()?;
    find_file_upwards(exe.parent()?, filename, 10)
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text)
        .with_context(|| format!("parse config toml: {}", path.display()))?;
    Ok(cfg)
}

const DEFAULT_CONFIG_TOML: &str = r#"[oracle]
# GOOGLE_MODEL in the environment overrides this.
model = "gemini-2.5-flash"
endpoint = "https://generativelanguage.googleapis.com/v1beta"
# Environment variables probed, in order, for the API key.
api_key_env = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
label_temperature = 0.0
summary_temperature = 0.3
# timeout_secs = 60
prompt_excerpt_chars = 200
summary_max_chars = 4000

[output]
prefix = "formatted_"
"#;

/// Writes `docx-stylist.toml` into `dir`. An existing file is kept unless `force`.
pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);
    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}
