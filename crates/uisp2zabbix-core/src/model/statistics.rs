// ── Per-endpoint link statistics ──
//
// `StatField` is the static descriptor table for `LinkStatistics`:
// declaration order is the flattening order and every variant names
// the wire field and its scalar kind.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{EnumCount, EnumIter, IntoStaticStr};

use super::MetricValue;

/// A numeric reading, integral or fractional as it arrived on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl From<Number> for MetricValue {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(v) => Self::Integer(v),
            Number::Float(v) => Self::Float(v),
        }
    }
}

/// Interface statistics reported for one end of a data link.
///
/// Every key must be present, but UISP reports `null` for readings a
/// radio does not have (the second chain of a single-chain radio, for
/// one). Those stay `None` and produce no sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStatistics {
    #[serde(deserialize_with = "nullable")]
    pub rx_rate: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub tx_rate: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub downlink_capacity: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub uplink_capacity: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub downlink_utilization: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub uplink_utilization: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub signal_local: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub signal_remote: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub signal_chain0: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub signal_chain1: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub signal_remote_chain0: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub signal_remote_chain1: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub link_score: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub score: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub score_max: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub air_time_score: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub link_score_hint: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub theoretical_downlink_capacity: Option<Number>,
    #[serde(deserialize_with = "nullable")]
    pub theoretical_uplink_capacity: Option<Number>,
}

// `deserialize_with` keeps a missing key an error while still accepting
// an explicit `null`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Scalar kind of a statistics field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
}

/// One field of [`LinkStatistics`], in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr)]
pub enum StatField {
    #[strum(serialize = "rxRate")]
    RxRate,
    #[strum(serialize = "txRate")]
    TxRate,
    #[strum(serialize = "downlinkCapacity")]
    DownlinkCapacity,
    #[strum(serialize = "uplinkCapacity")]
    UplinkCapacity,
    #[strum(serialize = "downlinkUtilization")]
    DownlinkUtilization,
    #[strum(serialize = "uplinkUtilization")]
    UplinkUtilization,
    #[strum(serialize = "signalLocal")]
    SignalLocal,
    #[strum(serialize = "signalRemote")]
    SignalRemote,
    #[strum(serialize = "signalChain0")]
    SignalChain0,
    #[strum(serialize = "signalChain1")]
    SignalChain1,
    #[strum(serialize = "signalRemoteChain0")]
    SignalRemoteChain0,
    #[strum(serialize = "signalRemoteChain1")]
    SignalRemoteChain1,
    #[strum(serialize = "linkScore")]
    LinkScore,
    #[strum(serialize = "score")]
    Score,
    #[strum(serialize = "scoreMax")]
    ScoreMax,
    #[strum(serialize = "airTimeScore")]
    AirTimeScore,
    #[strum(serialize = "linkScoreHint")]
    LinkScoreHint,
    #[strum(serialize = "theoreticalDownlinkCapacity")]
    TheoreticalDownlinkCapacity,
    #[strum(serialize = "theoreticalUplinkCapacity")]
    TheoreticalUplinkCapacity,
}

impl StatField {
    /// Wire name, e.g. `signalLocal`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::DownlinkUtilization | Self::UplinkUtilization | Self::LinkScore => {
                FieldKind::Float
            }
            Self::LinkScoreHint => FieldKind::Text,
            _ => FieldKind::Integer,
        }
    }
}

impl LinkStatistics {
    /// Read one field as a scalar. `None` when UISP reported `null`.
    pub fn value(&self, field: StatField) -> Option<MetricValue> {
        let number = match field {
            StatField::RxRate => self.rx_rate,
            StatField::TxRate => self.tx_rate,
            StatField::DownlinkCapacity => self.downlink_capacity,
            StatField::UplinkCapacity => self.uplink_capacity,
            StatField::DownlinkUtilization => self.downlink_utilization,
            StatField::UplinkUtilization => self.uplink_utilization,
            StatField::SignalLocal => self.signal_local,
            StatField::SignalRemote => self.signal_remote,
            StatField::SignalChain0 => self.signal_chain0,
            StatField::SignalChain1 => self.signal_chain1,
            StatField::SignalRemoteChain0 => self.signal_remote_chain0,
            StatField::SignalRemoteChain1 => self.signal_remote_chain1,
            StatField::LinkScore => self.link_score,
            StatField::Score => self.score,
            StatField::ScoreMax => self.score_max,
            StatField::AirTimeScore => self.air_time_score,
            StatField::LinkScoreHint => {
                return self.link_score_hint.clone().map(MetricValue::Text);
            }
            StatField::TheoreticalDownlinkCapacity => self.theoretical_downlink_capacity,
            StatField::TheoreticalUplinkCapacity => self.theoretical_uplink_capacity,
        };
        number.map(MetricValue::from)
    }
}
