use thiserror::Error;

/// Top-level error type for the `uisp2zabbix-api` crate.
///
/// Covers every failure mode across the three remote surfaces:
/// the UISP REST API, the Zabbix JSON-RPC API, and the Zabbix trapper
/// protocol. `uisp2zabbix-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the token was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A Zabbix call was attempted before `login()`.
    #[error("Not logged in to the Zabbix API")]
    NotLoggedIn,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake, certificate, or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Socket-level error on the trapper connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── UISP ────────────────────────────────────────────────────────
    /// Non-success HTTP status from the UISP API.
    #[error("UISP API error (HTTP {status}): {message}")]
    Uisp { status: u16, message: String },

    /// UISP answered with an empty collection where data was expected.
    #[error("UISP returned no {resource}")]
    EmptyResponse { resource: &'static str },

    // ── Zabbix ──────────────────────────────────────────────────────
    /// Structured error from the Zabbix JSON-RPC API.
    #[error("Zabbix API error ({code}): {message} {data}")]
    ZabbixApi {
        code: i64,
        message: String,
        data: String,
    },

    /// The trapper endpoint spoke something other than the ZBXD protocol.
    #[error("Zabbix sender protocol error: {0}")]
    Protocol(String),

    /// The trapper endpoint answered but did not accept the batch.
    #[error("Zabbix server rejected batch: {response} ({info})")]
    Rejected { response: String, info: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session or token is no
    /// longer accepted and logging in again might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } | Self::NotLoggedIn => true,
            // -32602 with "Session terminated" / "Not authorised" is how
            // Zabbix reports a dead token.
            Self::ZabbixApi { data, .. } => {
                data.contains("Session terminated")
                    || data.contains("Not authorised")
                    || data.contains("Not authorized")
            }
            _ => false,
        }
    }

    /// Build a `Deserialization` error carrying a short preview of the body.
    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}
