// uisp2zabbix-api: Async clients for the UISP NMS API (source) and Zabbix (destination)
//
// The Zabbix client authenticates with `Authorization: Bearer`, so the
// frontend must be Zabbix 6.4 or newer.

pub mod error;
pub mod transport;
pub mod uisp;
pub mod zabbix;

pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use uisp::{StatisticsInterval, UispClient};
pub use zabbix::{
    DEFAULT_TRAPPER_PORT, GroupKind, HostDefinition, HostTag, ItemDefinition, SendSummary,
    SenderItem, ZabbixClient, ZabbixSender, value_type,
};
