//! Core of the UISP to Zabbix bridge.
//!
//! Sits between `uisp2zabbix-api` and the binary, and owns everything that
//! is not wire protocol:
//!
//! - **Domain model** ([`model`]): a validated [`Link`] built from one raw
//!   UISP record, with a static [`StatField`] descriptor table.
//!
//! - **Flattener** ([`metrics`]) and **schema descriptor** ([`schema`]):
//!   both walk the same descriptor table, so every emitted key has exactly
//!   one matching template item.
//!
//! - **[`Registrar`]**: idempotent get-or-create for groups, the template,
//!   its items, and one host per link, backed by a process-lifetime
//!   [`RegistryCache`].
//!
//! - **[`Delivery`]**: one batch per cycle with bounded retry.
//!
//! - **[`Bridge`]**: the poll loop tying the above together over the
//!   [`LinkSource`], [`Inventory`], and [`MetricSink`] seams.
//!   [`connect()`] wires it onto the real clients.

pub mod adapters;
pub mod bridge;
pub mod config;
pub mod delivery;
pub mod error;
pub mod metrics;
pub mod model;
pub mod registrar;
pub mod schema;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapters::{ZabbixBridge, connect, dump_links};
pub use bridge::{Bridge, BridgeOptions, CycleReport, LinkFailure};
pub use config::{
    BridgeConfig, MaintenanceFlags, TlsVerification, UispConfig, ZabbixConfig, ZabbixNames,
};
pub use delivery::{Delivery, DeliveryReport, MetricSink, RetryPolicy};
pub use error::CoreError;
pub use metrics::{METRIC_PREFIX, Metric, MetricSample, flatten};
pub use model::{Direction, Link, LinkStatistics, MetricValue, Number, StatField};
pub use registrar::{EntityKind, Inventory, Registrar, RegistryCache};
pub use schema::{SchemaEntry, ValueType, derive_unit, describe_schema};
pub use source::LinkSource;
