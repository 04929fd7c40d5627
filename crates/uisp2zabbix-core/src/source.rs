// ── Link source ──
//
// Where raw data-link records come from, and which of them are
// point-to-point wireless links.

use std::future::Future;

use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;

/// A collector of raw UISP data-link records.
pub trait LinkSource: Send + Sync {
    /// One snapshot of every data link the source knows about. An empty
    /// snapshot is an error.
    fn list_links(&self) -> impl Future<Output = Result<Vec<Value>, CoreError>> + Send;
}

/// Wireless links are the only records that carry a non-null `ssid`.
pub fn is_wireless_link(record: &Value) -> bool {
    record.get("ssid").is_some_and(|ssid| !ssid.is_null())
}

/// Drop every record that is not a wireless link.
pub fn wireless_links(records: Vec<Value>) -> Vec<Value> {
    records.into_iter().filter(is_wireless_link).collect()
}

/// Collect one snapshot and keep only wireless links.
///
/// A snapshot without any wireless link is reported as
/// [`CoreError::EmptyCollection`].
pub async fn collect_wireless_links<S: LinkSource>(source: &S) -> Result<Vec<Value>, CoreError> {
    let records = source.list_links().await?;
    let total = records.len();
    let links = wireless_links(records);
    debug!(total, wireless = links.len(), "collected data links");

    if links.is_empty() {
        return Err(CoreError::EmptyCollection {
            resource: "wireless data links".into(),
        });
    }
    Ok(links)
}
