use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hooksig_core::{SchemeRegistry, VerificationOptions};
use hooksig_http::Verifier;

use crate::error::{RootError, RootResult};

/// Sender-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Secrets to sign with. Listing the new secret next to the old one lets
    /// receivers rotate at their own pace.
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Namespace prefixed to event names (`{namespace}.{name}`).
    #[serde(default = "default_event_namespace")]
    pub event_namespace: String,
}

fn default_event_namespace() -> String {
    "hooksig".to_string()
}

impl SigningConfig {
    /// `Do-Event-Name` value for `name` under the configured namespace.
    pub fn event_name(&self, name: &str) -> String {
        hooksig_http::event_name(&self.event_namespace, name)
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            secrets: Vec::new(),
            event_namespace: default_event_namespace(),
        }
    }
}

/// Receiver-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Secrets accepted when verifying.
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Maximum signature age in seconds.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,

    /// Skip the signature age check.
    #[serde(default)]
    pub ignore_tolerance: bool,

    /// Scheme versions whose signatures are ignored.
    #[serde(default)]
    pub untrusted_schemes: Vec<i64>,
}

fn default_tolerance_secs() -> u64 {
    hooksig_core::DEFAULT_TOLERANCE.as_secs()
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            secrets: Vec::new(),
            tolerance_secs: default_tolerance_secs(),
            ignore_tolerance: false,
            untrusted_schemes: Vec::new(),
        }
    }
}

impl VerificationConfig {
    pub fn options(&self) -> VerificationOptions {
        let mut opts =
            VerificationOptions::new().with_tolerance(Duration::from_secs(self.tolerance_secs));
        if self.ignore_tolerance {
            opts = opts.ignore_tolerance();
        }
        for version in &self.untrusted_schemes {
            opts = opts.untrust_version(*version);
        }
        opts
    }
}

/// Webhook receiver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest request body buffered for verification.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    hooksig_http::middleware::DEFAULT_BODY_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Top-level configuration for the hooksig binary.
///
/// Loaded from a TOML file (typically `~/.hooksig/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RootResult<()> {
        if self.verification.tolerance_secs == 0 {
            return Err(RootError::Config("tolerance_secs must be > 0".into()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(RootError::Config("max_body_bytes must be > 0".into()));
        }
        let registry = SchemeRegistry::builtin();
        for version in &self.verification.untrusted_schemes {
            if registry.lookup(*version).is_none() {
                return Err(RootError::Config(format!(
                    "untrusted_schemes lists unknown scheme version {}",
                    version
                )));
            }
        }
        let all_secrets = self
            .signing
            .secrets
            .iter()
            .chain(&self.verification.secrets);
        for secret in all_secrets {
            if secret.trim().is_empty() {
                return Err(RootError::Config("secrets must not be blank".into()));
            }
        }
        if self.signing.event_namespace.contains('.') {
            return Err(RootError::Config(format!(
                "event_namespace must not contain '.', got '{}'",
                self.signing.event_namespace
            )));
        }
        Ok(())
    }

    /// Receiver verifier built from the verification and server sections.
    pub fn verifier(&self) -> Verifier {
        Verifier::new(
            SchemeRegistry::builtin().clone(),
            self.verification.secrets.clone(),
        )
        .with_options(self.verification.options())
        .with_body_limit(self.server.max_body_bytes)
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".hooksig/config.toml")
    }
}
