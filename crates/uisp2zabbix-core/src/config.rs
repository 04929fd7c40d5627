// ── Runtime bridge configuration ──
//
// These types describe how to reach UISP and Zabbix and how the poll loop
// behaves. They carry credentials but never touch disk: the binary loads
// settings, validates them, and hands a `BridgeConfig` in.

use std::time::Duration;

use secrecy::SecretString;
use uisp2zabbix_api::{TlsMode, TransportConfig};
use url::Url;

use crate::delivery::RetryPolicy;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TEMPLATE_GROUP: &str = "Templates/UISP2ZABBIX";
pub const DEFAULT_HOST_GROUP: &str = "UISP2ZABBIX";
pub const DEFAULT_TEMPLATE_NAME: &str = "UISP2Zabbix P2P Data Link";

/// TLS verification strategy for both HTTP clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Self-hosted UISP and Zabbix often run self-signed.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// One-shot maintenance switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceFlags {
    /// Rewrite existing template items.
    pub force_update_schema: bool,
    /// Rewrite groups and tags of existing hosts.
    pub force_update_hosts: bool,
}

impl MaintenanceFlags {
    /// Any forced update turns the poll loop into a single cycle.
    pub fn is_one_shot(self) -> bool {
        self.force_update_schema || self.force_update_hosts
    }
}

/// Names of the Zabbix objects the bridge owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZabbixNames {
    pub template_group: String,
    pub host_group: String,
    pub template: String,
}

impl Default for ZabbixNames {
    fn default() -> Self {
        Self {
            template_group: DEFAULT_TEMPLATE_GROUP.into(),
            host_group: DEFAULT_HOST_GROUP.into(),
            template: DEFAULT_TEMPLATE_NAME.into(),
        }
    }
}

/// UISP connection settings. Enough on their own for a dump.
#[derive(Debug, Clone)]
pub struct UispConfig {
    /// API base, e.g. `https://uisp.example/nms/api/v2.1`.
    pub url: Url,
    pub token: SecretString,
}

/// Zabbix connection settings.
#[derive(Debug, Clone)]
pub struct ZabbixConfig {
    /// Frontend URL; `api_jsonrpc.php` is appended when missing.
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Trapper address, `host` or `host:port`.
    pub sender_endpoint: String,
}

/// Everything the bridge needs to run.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub uisp: UispConfig,
    pub zabbix: ZabbixConfig,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    pub names: ZabbixNames,
    pub maintenance: MaintenanceFlags,
}

impl BridgeConfig {
    pub fn transport(&self) -> TransportConfig {
        transport(&self.tls, self.timeout)
    }
}

pub(crate) fn transport(tls: &TlsVerification, timeout: Duration) -> TransportConfig {
    TransportConfig {
        tls: TlsMode::from(tls),
        timeout,
    }
}
