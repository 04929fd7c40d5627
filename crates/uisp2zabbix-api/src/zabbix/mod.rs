// Zabbix destination surface
//
// Two protocols: the JSON-RPC API (inventory: groups, templates, items,
// hosts) and the trapper protocol (metric delivery over raw TCP).

mod client;
mod inventory;
mod models;
mod sender;

pub use client::ZabbixClient;
pub use models::{GroupKind, HostDefinition, HostTag, ItemDefinition, value_type};
pub use sender::{DEFAULT_TRAPPER_PORT, SendSummary, SenderItem, ZabbixSender};
