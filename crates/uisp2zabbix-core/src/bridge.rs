// ── Poll loop ──
//
// The bridge alternates between Idle and Cycle-Running. A cycle provisions
// the template (once, or again after a partial failure), collects links,
// registers their hosts, flattens them into one batch, and delivers it.
// Links are processed sequentially and a failing link only drops itself.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uisp2zabbix_api::{GroupKind, HostDefinition, HostTag};

use crate::config::{MaintenanceFlags, ZabbixNames};
use crate::delivery::{Delivery, DeliveryReport, MetricSink};
use crate::error::CoreError;
use crate::metrics::{self, MetricSample};
use crate::model::Link;
use crate::registrar::{Inventory, Registrar};
use crate::schema::{SchemaEntry, describe_schema};
use crate::source::{LinkSource, collect_wireless_links};

/// Poll-loop behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    pub names: ZabbixNames,
    pub poll_interval: Duration,
    pub maintenance: MaintenanceFlags,
}

/// A link that was excluded from a cycle's batch.
#[derive(Debug)]
pub struct LinkFailure {
    pub link: String,
    pub error: CoreError,
}

/// What one cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Host names of links that made it into the batch, in batch order.
    pub processed: Vec<String>,
    pub skipped: Vec<LinkFailure>,
    pub delivery: Option<DeliveryReport>,
}

impl CycleReport {
    pub fn samples(&self) -> usize {
        self.delivery.map_or(0, |d| d.samples)
    }
}

/// Ids of the provisioned template and host group.
#[derive(Debug, Clone)]
struct SchemaState {
    template_id: String,
    host_group_id: String,
    items_ready: bool,
}

/// UISP to Zabbix bridge over a source, an inventory, and a metric sink.
pub struct Bridge<S, I, M> {
    source: S,
    registrar: Registrar<I>,
    delivery: Delivery<M>,
    options: BridgeOptions,
    schema: Vec<SchemaEntry>,
    state: Option<SchemaState>,
}

impl<S, I, M> Bridge<S, I, M>
where
    S: LinkSource,
    I: Inventory,
    M: MetricSink,
{
    pub fn new(source: S, inventory: I, delivery: Delivery<M>, options: BridgeOptions) -> Self {
        Self {
            source,
            registrar: Registrar::new(inventory),
            delivery,
            options,
            schema: describe_schema(),
            state: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn registrar(&self) -> &Registrar<I> {
        &self.registrar
    }

    pub fn delivery(&self) -> &Delivery<M> {
        &self.delivery
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Run until cancelled, or for exactly one cycle in maintenance mode.
    ///
    /// The first cycle starts immediately. Cancellation ends the loop
    /// whether it is idle or in the middle of a cycle; an abandoned cycle
    /// delivers nothing. In loop mode a failed cycle is logged and the loop
    /// carries on; in maintenance mode it is returned.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), CoreError> {
        let one_shot = self.options.maintenance.is_one_shot();

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!("stop requested, abandoning the running cycle");
                    return Ok(());
                }
                outcome = self.run_cycle() => outcome,
            };

            match outcome {
                Ok(report) => info!(
                    links = report.processed.len(),
                    skipped = report.skipped.len(),
                    samples = report.samples(),
                    "cycle complete"
                ),
                Err(e) if one_shot => return Err(e),
                Err(e) => error!(error = %e, "cycle failed"),
            }

            if one_shot {
                info!("maintenance cycle finished");
                return Ok(());
            }

            debug!(interval = ?self.options.poll_interval, "idle");
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("stop requested, leaving poll loop");
                    return Ok(());
                }
                () = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }
    }

    /// One full cycle: provision, collect, register, flatten, deliver.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CoreError> {
        let schema = self.provision_schema().await?;
        let records = collect_wireless_links(&self.source).await?;

        let mut report = CycleReport::default();
        let mut seen = HashSet::new();
        let mut batch = Vec::new();

        for record in &records {
            match self.process_link(record, &schema, &mut seen).await {
                Ok((host, samples)) => {
                    report.processed.push(host);
                    batch.extend(samples);
                }
                Err(error) => {
                    let link = record_label(record);
                    warn!(link = %link, error = %error, "skipping link");
                    report.skipped.push(LinkFailure { link, error });
                }
            }
        }

        report.delivery = Some(self.delivery.deliver(&batch).await?);
        Ok(report)
    }

    /// Make sure the groups, the template, and its items exist.
    ///
    /// Items are provisioned when the template was just created, when a
    /// schema update is forced, or when an earlier attempt stopped midway.
    async fn provision_schema(&mut self) -> Result<SchemaState, CoreError> {
        if let Some(state) = self.state.as_ref().filter(|s| s.items_ready) {
            return Ok(state.clone());
        }

        let names = &self.options.names;
        let force = self.options.maintenance.force_update_schema;

        let template_group_id = self
            .registrar
            .resolve_group(GroupKind::TemplateGroup, &names.template_group)
            .await?;
        let host_group_id = self
            .registrar
            .resolve_group(GroupKind::HostGroup, &names.host_group)
            .await?;
        let (template_id, created) = self
            .registrar
            .resolve_template(&names.template, &template_group_id)
            .await?;

        let retrying = self.state.is_some();
        let mut state = SchemaState {
            template_id: template_id.clone(),
            host_group_id,
            items_ready: false,
        };
        self.state = Some(state.clone());

        if created || force || retrying {
            for entry in &self.schema {
                self.registrar.resolve_item(&template_id, entry, force).await?;
            }
            info!(
                template = %names.template,
                items = self.schema.len(),
                forced = force,
                "template items provisioned"
            );
        }

        state.items_ready = true;
        self.state = Some(state.clone());
        Ok(state)
    }

    async fn process_link(
        &self,
        record: &Value,
        schema: &SchemaState,
        seen: &mut HashSet<String>,
    ) -> Result<(String, Vec<MetricSample>), CoreError> {
        let link = Link::from_record(record)?;

        if !seen.insert(link.name.clone()) {
            return Err(CoreError::DuplicateLinkName { name: link.name });
        }

        let host = HostDefinition {
            host: link.name.clone(),
            group_id: schema.host_group_id.clone(),
            template_id: schema.template_id.clone(),
            tags: link
                .tags
                .iter()
                .map(|(tag, value)| HostTag {
                    tag: tag.clone(),
                    value: value.clone(),
                })
                .collect(),
        };
        self.registrar
            .resolve_host(&host, self.options.maintenance.force_update_hosts)
            .await?;

        let samples = metrics::samples(&link, Utc::now());
        debug!(host = %link.name, samples = samples.len(), "link flattened");
        Ok((link.name, samples))
    }
}

/// Best-effort name for a record that may not have made it into a `Link`.
fn record_label(record: &Value) -> String {
    record
        .get("ssid")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| "<unnamed>".to_owned(), str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::delivery::RetryPolicy;
    use crate::metrics::METRICS_PER_LINK;
    use crate::test_support::{FakeInventory, FakeSink, FakeSource, link_json};

    type TestBridge = Bridge<FakeSource, FakeInventory, FakeSink>;

    fn options(maintenance: MaintenanceFlags) -> BridgeOptions {
        BridgeOptions {
            names: ZabbixNames::default(),
            poll_interval: Duration::from_secs(10),
            maintenance,
        }
    }

    fn bridge(records: Vec<Value>, sink: FakeSink, maintenance: MaintenanceFlags) -> TestBridge {
        Bridge::new(
            FakeSource::with(records),
            FakeInventory::default(),
            Delivery::new(sink, RetryPolicy::default()),
            options(maintenance),
        )
    }

    #[tokio::test]
    async fn cycle_delivers_one_batch() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55), link_json("Tower-B↔Tower-C", -61)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );

        let report = bridge.run_cycle().await.unwrap();

        assert_eq!(report.processed, vec!["Tower-A↔Tower-B", "Tower-B↔Tower-C"]);
        assert_eq!(report.samples(), 2 * METRICS_PER_LINK);
        let batches = bridge.delivery().sink().batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].host, "Tower-A↔Tower-B");
        assert_eq!(batches[0][METRICS_PER_LINK].host, "Tower-B↔Tower-C");
    }

    #[tokio::test]
    async fn link_with_null_reading_is_still_delivered() {
        let mut record = link_json("Tower-A↔Tower-B", -55);
        record["from"]["interface"]["statistics"]["signalChain1"] = Value::Null;
        let mut bridge = bridge(vec![record], FakeSink::default(), MaintenanceFlags::default());

        let report = bridge.run_cycle().await.unwrap();

        assert_eq!(report.processed, vec!["Tower-A↔Tower-B"]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.samples(), METRICS_PER_LINK - 1);
    }

    #[tokio::test]
    async fn new_template_gets_every_item() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );

        bridge.run_cycle().await.unwrap();

        let inv = bridge.registrar().inventory();
        assert_eq!(inv.count("template.create"), 1);
        assert_eq!(inv.count("item.create"), METRICS_PER_LINK);
    }

    #[tokio::test]
    async fn second_cycle_reuses_cached_host() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );

        bridge.run_cycle().await.unwrap();
        let calls_after_first = bridge.registrar().inventory().total_calls();
        bridge.run_cycle().await.unwrap();

        let inv = bridge.registrar().inventory();
        assert_eq!(inv.count("host.get"), 1);
        assert_eq!(inv.count("host.create"), 1);
        assert_eq!(inv.total_calls(), calls_after_first);
        assert_eq!(bridge.delivery().sink().batches().len(), 2);
    }

    #[tokio::test]
    async fn malformed_link_is_isolated() {
        let mut broken = link_json("Broken", -70);
        broken["from"]["interface"]["statistics"]["rxRate"] = Value::Null;

        let mut bridge = bridge(
            vec![broken, link_json("Tower-A↔Tower-B", -55)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );

        let report = bridge.run_cycle().await.unwrap();

        assert_eq!(report.processed, vec!["Tower-A↔Tower-B"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].link, "Broken");
        assert_eq!(report.samples(), METRICS_PER_LINK);
    }

    #[tokio::test]
    async fn registration_failure_is_isolated() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );
        bridge.registrar().inventory().fail_on("host.create");

        let report = bridge.run_cycle().await.unwrap();

        assert!(report.processed.is_empty());
        assert_eq!(report.skipped.len(), 1);
        // Nothing to send, so the sink is never called.
        assert_eq!(bridge.delivery().sink().attempts(), 0);
    }

    #[tokio::test]
    async fn colliding_names_keep_the_first_link() {
        let mut bridge = bridge(
            vec![link_json("Backhaul", -50), link_json("  Backhaul ", -80)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );

        let report = bridge.run_cycle().await.unwrap();

        assert_eq!(report.processed, vec!["Backhaul"]);
        assert!(matches!(
            report.skipped[0].error,
            CoreError::DuplicateLinkName { .. }
        ));
        let batch = &bridge.delivery().sink().batches()[0];
        let signal = batch
            .iter()
            .find(|s| s.key == "uisp2zabbix.p2p.from_signalLocal")
            .unwrap();
        assert_eq!(signal.value.to_string(), "-50");
    }

    #[tokio::test]
    async fn empty_collection_fails_the_cycle() {
        let mut bridge = bridge(Vec::new(), FakeSink::default(), MaintenanceFlags::default());

        let err = bridge.run_cycle().await.unwrap_err();

        assert!(matches!(err, CoreError::EmptyCollection { .. }));
        assert_eq!(bridge.delivery().sink().attempts(), 0);
    }

    #[tokio::test]
    async fn item_provisioning_resumes_after_partial_failure() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::default(),
            MaintenanceFlags::default(),
        );
        bridge.registrar().inventory().fail_on("item.create");

        assert!(bridge.run_cycle().await.is_err());
        assert_eq!(bridge.delivery().sink().attempts(), 0);

        bridge.registrar().inventory().recover("item.create");
        bridge.run_cycle().await.unwrap();

        let inv = bridge.registrar().inventory();
        assert_eq!(inv.count("template.create"), 1);
        // One refused attempt plus a full set on the retry.
        assert_eq!(inv.count("item.create"), METRICS_PER_LINK + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_exhaustion_fails_the_cycle() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::failing(u32::MAX),
            MaintenanceFlags::default(),
        );

        let err = bridge.run_cycle().await.unwrap_err();

        assert!(matches!(err, CoreError::Delivery { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn maintenance_mode_runs_one_cycle() {
        let inventory = FakeInventory::default();
        inventory.seed_host("Tower-A↔Tower-B", "h1");
        let mut bridge = Bridge::new(
            FakeSource::with(vec![link_json("Tower-A↔Tower-B", -55)]),
            inventory,
            Delivery::new(FakeSink::default(), RetryPolicy::default()),
            options(MaintenanceFlags {
                force_update_schema: true,
                force_update_hosts: true,
            }),
        );

        bridge.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(bridge.source().polls.load(Ordering::SeqCst), 1);
        let inv = bridge.registrar().inventory();
        assert_eq!(inv.count("host.update"), 1);
        assert_eq!(inv.count("host.create"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_failed_cycles_until_cancelled() {
        let mut bridge = bridge(Vec::new(), FakeSink::default(), MaintenanceFlags::default());
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            stopper.cancel();
        });

        bridge.run(&cancel).await.unwrap();

        // Cycles at t=0, 10 and 20 before the stop at t=25.
        assert_eq!(bridge.source().polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_a_running_cycle() {
        // The first delivery fails, so the cycle sits in the 3 s retry delay.
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::failing(u32::MAX),
            MaintenanceFlags::default(),
        );
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.cancel();
        });

        let started = tokio::time::Instant::now();
        bridge.run(&cancel).await.unwrap();

        assert_eq!(bridge.delivery().sink().attempts(), 1);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_a_maintenance_cycle() {
        let mut bridge = bridge(
            vec![link_json("Tower-A↔Tower-B", -55)],
            FakeSink::failing(u32::MAX),
            MaintenanceFlags {
                force_update_schema: true,
                force_update_hosts: false,
            },
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        bridge.run(&cancel).await.unwrap();

        assert_eq!(bridge.source().polls.load(Ordering::SeqCst), 0);
    }
}
