//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use uisp2zabbix_config::ConfigError;
use uisp2zabbix_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Missing required setting '{key}'")]
    #[diagnostic(
        code(uisp2zabbix::missing_setting),
        help("Export {env}, or set {key} in the config file passed with --config.")
    )]
    MissingSetting { key: String, env: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(uisp2zabbix::config),
        help("Run with --show-config to see the effective settings.")
    )]
    Config { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(uisp2zabbix::connection_failed),
        help(
            "Check that the service is reachable from this host.\n\
             Self-signed certificates need UISP2ZABBIX_INSECURE=true or ca_cert."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(uisp2zabbix::timeout),
        help("Raise UISP2ZABBIX_TIMEOUT or check the service's responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(uisp2zabbix::auth_failed),
        help("Verify UISP_AUTH_TOKEN, ZABBIX_UNAME, and ZABBIX_PWORD.")
    )]
    AuthFailed { message: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(uisp2zabbix::bridge))]
    Bridge { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(uisp2zabbix::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(uisp2zabbix::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingSetting { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } | Self::Timeout => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { key, env } => CliError::MissingSetting {
                key: key.into(),
                env: env.into(),
            },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::Timeout { .. } => CliError::Timeout,
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Config { message } => CliError::Config { message },
            other => CliError::Bridge {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let missing = CliError::from(ConfigError::Missing {
            key: "zabbix_url",
            env: "ZABBIX_URL",
        });
        assert_eq!(missing.exit_code(), exit_code::CONFIG);

        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "Incorrect user name or password".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let conn = CliError::from(CoreError::ConnectionFailed {
            url: "https://uisp.example".into(),
            reason: "refused".into(),
        });
        assert_eq!(conn.exit_code(), exit_code::CONNECTION);

        let delivery = CliError::from(CoreError::Delivery {
            attempts: 2,
            reason: "refused".into(),
        });
        assert_eq!(delivery.exit_code(), exit_code::GENERAL);
    }
}
