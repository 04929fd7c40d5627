// ── Core error types ──
//
// Domain errors from uisp2zabbix-core. Consumers never see HTTP status
// codes or socket errors directly: the `From<uisp2zabbix_api::Error>` impl
// translates transport-layer failures into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Per-link errors ──────────────────────────────────────────────
    #[error("Malformed data link '{link}': {reason}")]
    MalformedLink { link: String, reason: String },

    #[error("Data link name '{name}' is used by more than one link in this cycle")]
    DuplicateLinkName { name: String },

    // ── Collection errors ────────────────────────────────────────────
    #[error("Source returned no {resource}")]
    EmptyCollection { resource: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out ({detail})")]
    Timeout { detail: String },

    // ── Remote API errors (wrapped, not exposed raw) ─────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Zabbix JSON-RPC error code or HTTP status, when one exists.
        code: Option<i64>,
    },

    // ── Delivery errors ──────────────────────────────────────────────
    #[error("Delivery failed after {attempts} attempt(s): {reason}")]
    Delivery { attempts: u32, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<uisp2zabbix_api::Error> for CoreError {
    fn from(err: uisp2zabbix_api::Error) -> Self {
        use uisp2zabbix_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::NotLoggedIn => CoreError::AuthenticationFailed {
                message: "not logged in to the Zabbix API".into(),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        detail: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: e.status().map(|s| i64::from(s.as_u16())),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout {
                detail: format!("no answer within {timeout_secs}s"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Io(e) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: e.to_string(),
            },
            ApiError::Uisp { status, message } => CoreError::Api {
                message: format!("UISP: {message}"),
                code: Some(i64::from(status)),
            },
            ApiError::EmptyResponse { resource } => CoreError::EmptyCollection {
                resource: resource.into(),
            },
            ApiError::ZabbixApi {
                code,
                message,
                data,
            } => CoreError::Api {
                message: format!("Zabbix: {message} {data}").trim_end().to_owned(),
                code: Some(code),
            },
            ApiError::Protocol(msg) => CoreError::Api {
                message: format!("Zabbix sender: {msg}"),
                code: None,
            },
            ApiError::Rejected { response, info } => CoreError::Api {
                message: format!("Zabbix sender: {response} ({info})"),
                code: None,
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
