// ── Metric flattener ──
//
// Turns a `Link` into an ordered list of `(key, value)` pairs. The order is
// fixed: link-level scalars, then every `from_*` field, then every `to_*`
// field, each in `StatField` declaration order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{EnumCount, IntoEnumIterator};

use crate::model::{Direction, Link, MetricValue, StatField};

/// Namespace shared by every item key the bridge owns.
pub const METRIC_PREFIX: &str = "uisp2zabbix.p2p";

/// Link-level field carrying the aggregate signal.
pub const SIGNAL_FIELD: &str = "signal";

/// Link-level field carrying the operating frequency.
pub const FREQUENCY_FIELD: &str = "frequency";

/// Number of link-level scalars emitted ahead of the per-direction fields.
pub const LINK_LEVEL_FIELDS: usize = 2;

/// Metrics emitted per link.
pub const METRICS_PER_LINK: usize = 2 * StatField::COUNT + LINK_LEVEL_FIELDS;

const HZ_PER_MHZ: i64 = 1_000_000;

/// Key of a per-direction field: `<prefix>.<direction>_<field>`.
pub fn direction_key(prefix: &str, direction: Direction, field: &str) -> String {
    format!("{prefix}.{direction}_{field}")
}

/// Key of a link-level field: `<prefix>.<field>`.
pub fn link_key(prefix: &str, field: &str) -> String {
    format!("{prefix}.{field}")
}

/// One flattened metric. `value` is `None` for a reading UISP left null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub key: String,
    pub value: Option<MetricValue>,
}

/// A metric bound to its host and capture time, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub host: String,
    pub key: String,
    pub value: MetricValue,
    pub timestamp: DateTime<Utc>,
}

/// Flatten a link into exactly [`METRICS_PER_LINK`] metrics.
pub fn flatten(link: &Link) -> Vec<Metric> {
    let mut metrics = Vec::with_capacity(METRICS_PER_LINK);

    metrics.push(Metric {
        key: link_key(METRIC_PREFIX, SIGNAL_FIELD),
        value: Some(MetricValue::Integer(link.signal)),
    });
    metrics.push(Metric {
        key: link_key(METRIC_PREFIX, FREQUENCY_FIELD),
        value: Some(MetricValue::Integer(
            link.frequency_mhz.saturating_mul(HZ_PER_MHZ),
        )),
    });

    for direction in Direction::iter() {
        let stats = link.statistics(direction);
        for field in StatField::iter() {
            metrics.push(Metric {
                key: direction_key(METRIC_PREFIX, direction, field.name()),
                value: stats.value(field),
            });
        }
    }

    metrics
}

/// Flatten a link and stamp every metric with its host and `timestamp`.
/// Null readings have nothing to send and are left out.
pub fn samples(link: &Link, timestamp: DateTime<Utc>) -> Vec<MetricSample> {
    flatten(link)
        .into_iter()
        .filter_map(|m| {
            Some(MetricSample {
                host: link.name.clone(),
                key: m.key,
                value: m.value?,
                timestamp,
            })
        })
        .collect()
}
