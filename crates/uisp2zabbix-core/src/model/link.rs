// ── Data link domain type ──

use std::collections::BTreeMap;

use serde::Deserialize;
use strum::{Display, EnumIter};

use super::LinkStatistics;
use crate::error::CoreError;

/// Which end of a link a statistics block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    From,
    To,
}

/// One point-to-point wireless link, validated and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Trimmed SSID. Becomes the Zabbix host name.
    pub name: String,
    /// Link-level signal in dBm.
    pub signal: i64,
    /// Operating frequency in MHz, as UISP reports it.
    pub frequency_mhz: i64,
    pub from: LinkStatistics,
    pub to: LinkStatistics,
    /// Descriptive tags: site names and device models of both ends.
    pub tags: BTreeMap<String, String>,
}

impl Link {
    /// Statistics for one end of the link.
    pub fn statistics(&self, direction: Direction) -> &LinkStatistics {
        match direction {
            Direction::From => &self.from,
            Direction::To => &self.to,
        }
    }

    /// Build a link from one raw UISP data-link record.
    ///
    /// Fails with [`CoreError::MalformedLink`] when a required attribute is
    /// missing or of the wrong type, or the SSID trims to nothing. A `null`
    /// statistic is accepted; the link-level `signal` and `frequency` are not.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, CoreError> {
        let label = record
            .get("ssid")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| "<unnamed>".to_owned(), |s| s.trim().to_owned());

        let raw: RawDataLink =
            RawDataLink::deserialize(record).map_err(|e| CoreError::MalformedLink {
                link: label.clone(),
                reason: e.to_string(),
            })?;

        let name = raw.ssid.trim().to_owned();
        if name.is_empty() {
            return Err(CoreError::MalformedLink {
                link: label,
                reason: "ssid is empty".into(),
            });
        }

        let mut tags = BTreeMap::new();
        for (direction, end) in [(Direction::From, &raw.from), (Direction::To, &raw.to)] {
            if let Some(site) = end.site.as_ref().and_then(|s| s.identification.name.clone()) {
                tags.insert(direction.to_string(), site);
            }
            if let Some(model) = end.device.as_ref().and_then(|d| d.identification.model.clone())
            {
                tags.insert(format!("{direction}_dev"), model);
            }
        }

        Ok(Self {
            name,
            signal: raw.signal,
            frequency_mhz: raw.frequency,
            from: raw.from.interface.statistics,
            to: raw.to.interface.statistics,
            tags,
        })
    }
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawDataLink {
    ssid: String,
    signal: i64,
    frequency: i64,
    from: RawEndpoint,
    to: RawEndpoint,
}

#[derive(Deserialize)]
struct RawEndpoint {
    #[serde(default)]
    site: Option<RawSite>,
    #[serde(default)]
    device: Option<RawDevice>,
    interface: RawInterface,
}

#[derive(Deserialize)]
struct RawSite {
    identification: RawSiteIdentification,
}

#[derive(Deserialize)]
struct RawSiteIdentification {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawDevice {
    identification: RawDeviceIdentification,
}

#[derive(Deserialize)]
struct RawDeviceIdentification {
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct RawInterface {
    statistics: LinkStatistics,
}
