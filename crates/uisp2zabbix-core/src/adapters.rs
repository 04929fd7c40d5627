// ── Client adapters ──
//
// Binds the bridge seams (`LinkSource`, `Inventory`, `MetricSink`) to the
// real UISP and Zabbix clients, and wires a ready-to-run bridge from a
// `BridgeConfig`.

use serde_json::Value;
use tracing::{info, warn};
use uisp2zabbix_api::{
    GroupKind, HostDefinition, SenderItem, UispClient, ZabbixClient, ZabbixSender,
};

use crate::bridge::{Bridge, BridgeOptions};
use crate::config::{BridgeConfig, TlsVerification, UispConfig, transport};
use crate::delivery::{Delivery, MetricSink};
use crate::error::CoreError;
use crate::metrics::MetricSample;
use crate::registrar::Inventory;
use crate::schema::SchemaEntry;
use crate::source::{LinkSource, collect_wireless_links};

/// The bridge as it runs in production.
pub type ZabbixBridge = Bridge<UispClient, ZabbixClient, ZabbixSender>;

// ── UISP ─────────────────────────────────────────────────────────────

impl LinkSource for UispClient {
    async fn list_links(&self) -> Result<Vec<Value>, CoreError> {
        Ok(self.list_data_links().await?)
    }
}

// ── Zabbix inventory ─────────────────────────────────────────────────

impl Inventory for ZabbixClient {
    async fn find_group(&self, kind: GroupKind, name: &str) -> Result<Option<String>, CoreError> {
        Ok(ZabbixClient::find_group(self, kind, name).await?)
    }

    async fn create_group(&self, kind: GroupKind, name: &str) -> Result<String, CoreError> {
        Ok(ZabbixClient::create_group(self, kind, name).await?)
    }

    async fn find_template(&self, name: &str) -> Result<Option<String>, CoreError> {
        Ok(ZabbixClient::find_template(self, name).await?)
    }

    async fn create_template(&self, name: &str, group_id: &str) -> Result<String, CoreError> {
        Ok(ZabbixClient::create_template(self, name, group_id).await?)
    }

    async fn find_item(&self, template_id: &str, key: &str) -> Result<Option<String>, CoreError> {
        Ok(ZabbixClient::find_item(self, template_id, key).await?)
    }

    async fn create_item(&self, template_id: &str, entry: &SchemaEntry) -> Result<String, CoreError> {
        Ok(ZabbixClient::create_item(self, template_id, &entry.to_item_definition()).await?)
    }

    async fn update_item(&self, item_id: &str, entry: &SchemaEntry) -> Result<(), CoreError> {
        Ok(ZabbixClient::update_item(self, item_id, &entry.to_item_definition()).await?)
    }

    async fn find_host(&self, name: &str) -> Result<Option<String>, CoreError> {
        Ok(ZabbixClient::find_host(self, name).await?)
    }

    async fn create_host(&self, host: &HostDefinition) -> Result<String, CoreError> {
        Ok(ZabbixClient::create_host(self, host).await?)
    }

    async fn update_host(&self, host_id: &str, host: &HostDefinition) -> Result<(), CoreError> {
        Ok(ZabbixClient::update_host(self, host_id, host).await?)
    }
}

// ── Zabbix sender ────────────────────────────────────────────────────

impl MetricSink for ZabbixSender {
    async fn deliver(&self, samples: &[MetricSample]) -> Result<(), CoreError> {
        let items: Vec<SenderItem> = samples.iter().map(sender_item).collect();
        let summary = self.send(&items).await?;
        info!(
            processed = summary.processed,
            failed = summary.failed,
            total = summary.total,
            "batch accepted by Zabbix"
        );
        Ok(())
    }
}

/// Values travel as strings, stamped with their capture time.
fn sender_item(sample: &MetricSample) -> SenderItem {
    SenderItem {
        host: sample.host.clone(),
        key: sample.key.clone(),
        value: sample.value.to_string(),
        clock: sample.timestamp.timestamp(),
        ns: sample.timestamp.timestamp_subsec_nanos(),
    }
}

// ── Wiring ───────────────────────────────────────────────────────────

/// Build the clients, open the Zabbix session, and assemble the bridge.
///
/// Failing to log in is fatal: the caller should not enter the poll loop.
pub async fn connect(config: &BridgeConfig) -> Result<ZabbixBridge, CoreError> {
    let transport = config.transport();

    let uisp = UispClient::new(&config.uisp.url, &config.uisp.token, &transport)?;
    let zabbix = ZabbixClient::new(&config.zabbix.url, &transport)?;
    zabbix
        .login(&config.zabbix.username, &config.zabbix.password)
        .await?;
    let sender = ZabbixSender::new(&config.zabbix.sender_endpoint, config.timeout);

    info!(
        uisp = %uisp.base_url(),
        zabbix = %zabbix.endpoint(),
        trapper = %sender.address(),
        "bridge connected"
    );

    let options = BridgeOptions {
        names: config.names.clone(),
        poll_interval: config.poll_interval,
        maintenance: config.maintenance,
    };
    Ok(Bridge::new(
        uisp,
        zabbix,
        Delivery::new(sender, config.retry),
        options,
    ))
}

impl ZabbixBridge {
    /// Release the Zabbix session. Errors are logged, not returned.
    pub async fn shutdown(&self) {
        if let Err(e) = self.registrar().inventory().logout().await {
            warn!(error = %e, "Zabbix logout failed");
        }
    }
}

/// One snapshot of wireless data-link records, straight from UISP.
///
/// Needs only the UISP settings; Zabbix is never contacted.
pub async fn dump_links(
    uisp: &UispConfig,
    tls: &TlsVerification,
    timeout: std::time::Duration,
) -> Result<Vec<Value>, CoreError> {
    let client = UispClient::new(&uisp.url, &uisp.token, &transport(tls, timeout))?;
    collect_wireless_links(&client).await
}
