//! Configuration for the uisp2zabbix bridge.
//!
//! Layered loading (built-in defaults, an optional TOML file, then the
//! process environment), validation, and translation to
//! `uisp2zabbix_core::BridgeConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use uisp2zabbix_core::{
    BridgeConfig, MaintenanceFlags, RetryPolicy, TlsVerification, UispConfig, ZabbixConfig,
    ZabbixNames,
};
use uisp2zabbix_core::config::{
    DEFAULT_HOST_GROUP, DEFAULT_POLL_INTERVAL, DEFAULT_TEMPLATE_GROUP, DEFAULT_TEMPLATE_NAME,
    DEFAULT_TIMEOUT,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{key}' (set {env})")]
    Missing { key: &'static str, env: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to render config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Raw settings ────────────────────────────────────────────────────

/// Settings as they come out of the figment layers. Nothing is checked yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// UISP API base, e.g. `https://uisp.example/nms/api/v2.1`.
    pub uisp_endpoint: Option<String>,
    pub uisp_auth_token: Option<String>,

    /// Zabbix frontend URL.
    pub zabbix_url: Option<String>,
    pub zabbix_uname: Option<String>,
    pub zabbix_pword: Option<String>,
    /// Zabbix trapper, `host` or `host:port`.
    pub zabbix_endpoint: Option<String>,

    /// Seconds to idle between cycles.
    pub sleep_duration: u64,
    /// Network timeout in seconds, for both HTTP and the trapper.
    pub timeout: u64,
    /// Accept self-signed certificates.
    pub insecure: bool,
    /// Custom CA bundle. Wins over `insecure`.
    pub ca_cert: Option<PathBuf>,

    pub template_group: String,
    pub host_group: String,
    pub template_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            uisp_endpoint: None,
            uisp_auth_token: None,
            zabbix_url: None,
            zabbix_uname: None,
            zabbix_pword: None,
            zabbix_endpoint: None,
            sleep_duration: DEFAULT_POLL_INTERVAL.as_secs(),
            timeout: DEFAULT_TIMEOUT.as_secs(),
            insecure: true,
            ca_cert: None,
            template_group: DEFAULT_TEMPLATE_GROUP.into(),
            host_group: DEFAULT_HOST_GROUP.into(),
            template_name: DEFAULT_TEMPLATE_NAME.into(),
        }
    }
}

/// Environment variables read without a prefix.
const RAW_ENV_KEYS: [&str; 7] = [
    "UISP_ENDPOINT",
    "UISP_AUTH_TOKEN",
    "ZABBIX_URL",
    "ZABBIX_UNAME",
    "ZABBIX_PWORD",
    "ZABBIX_ENDPOINT",
    "SLEEP_DURATION",
];

/// Prefix for the bridge's own tuning variables.
const ENV_PREFIX: &str = "UISP2ZABBIX_";

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via platform conventions.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "uisp2zabbix", "uisp2zabbix")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

// ── Loading ─────────────────────────────────────────────────────────

/// Build the layered figment: defaults, TOML file, environment.
///
/// An explicit `path` must exist. The default path is optional.
pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
    let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            if let Some(default) = config_path() {
                figment = figment.merge(Toml::file(default));
            }
        }
    }

    Ok(figment
        .merge(Env::raw().only(&RAW_ENV_KEYS))
        .merge(Env::prefixed(ENV_PREFIX).map(|key| {
            // Keys arrive here in their original case.
            if key.as_str().eq_ignore_ascii_case("template") {
                "template_name".into()
            } else {
                key.as_str().to_owned().into()
            }
        })))
}

/// Load settings from file and environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    Settings::from_figment(&figment(path)?)
}

impl Settings {
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Validate only what talking to UISP needs.
    pub fn uisp(&self) -> Result<UispConfig, ConfigError> {
        Ok(UispConfig {
            url: parse_url(
                "uisp_endpoint",
                required(self.uisp_endpoint.as_deref(), "uisp_endpoint", "UISP_ENDPOINT")?,
            )?,
            token: SecretString::from(
                required(self.uisp_auth_token.as_deref(), "uisp_auth_token", "UISP_AUTH_TOKEN")?
                    .to_owned(),
            ),
        })
    }

    pub fn tls(&self) -> TlsVerification {
        match (&self.ca_cert, self.insecure) {
            (Some(path), _) => TlsVerification::CustomCa(path.clone()),
            (None, true) => TlsVerification::DangerAcceptInvalid,
            (None, false) => TlsVerification::SystemDefaults,
        }
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        positive_secs("timeout", self.timeout)
    }

    /// Validate everything the poll loop needs.
    pub fn validate(&self) -> Result<BridgeSettings, ConfigError> {
        let uisp = self.uisp()?;

        let zabbix = ZabbixConfig {
            url: parse_url(
                "zabbix_url",
                required(self.zabbix_url.as_deref(), "zabbix_url", "ZABBIX_URL")?,
            )?,
            username: required(self.zabbix_uname.as_deref(), "zabbix_uname", "ZABBIX_UNAME")?
                .to_owned(),
            password: SecretString::from(
                required(self.zabbix_pword.as_deref(), "zabbix_pword", "ZABBIX_PWORD")?
                    .to_owned(),
            ),
            sender_endpoint: required(
                self.zabbix_endpoint.as_deref(),
                "zabbix_endpoint",
                "ZABBIX_ENDPOINT",
            )?
            .to_owned(),
        };

        let names = ZabbixNames {
            template_group: non_empty("template_group", &self.template_group)?,
            host_group: non_empty("host_group", &self.host_group)?,
            template: non_empty("template_name", &self.template_name)?,
        };

        Ok(BridgeSettings {
            uisp,
            zabbix,
            tls: self.tls(),
            timeout: self.timeout()?,
            poll_interval: positive_secs("sleep_duration", self.sleep_duration)?,
            names,
        })
    }

    /// The effective settings as TOML, with secrets masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        for secret in [&mut shown.uisp_auth_token, &mut shown.zabbix_pword] {
            if secret.is_some() {
                *secret = Some("********".into());
            }
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

// ── Validated settings ──────────────────────────────────────────────

/// Checked settings: parsed URLs, non-zero durations, secrets wrapped.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub uisp: UispConfig,
    pub zabbix: ZabbixConfig,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub names: ZabbixNames,
}

impl BridgeSettings {
    /// Translate into the runtime config the core crate consumes.
    pub fn into_bridge_config(self, maintenance: MaintenanceFlags) -> BridgeConfig {
        BridgeConfig {
            uisp: self.uisp,
            zabbix: self.zabbix,
            tls: self.tls,
            timeout: self.timeout,
            poll_interval: self.poll_interval,
            retry: RetryPolicy::default(),
            names: self.names,
            maintenance,
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn required<'a>(
    value: Option<&'a str>,
    key: &'static str,
    env: &'static str,
) -> Result<&'a str, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing { key, env })
}

fn non_empty(field: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(value.to_owned())
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{raw}' is not a URL: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
