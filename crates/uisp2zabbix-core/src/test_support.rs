// Canned UISP records and in-memory fakes shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::{Value, json};
use uisp2zabbix_api::{GroupKind, HostDefinition};

use crate::delivery::MetricSink;
use crate::error::CoreError;
use crate::metrics::MetricSample;
use crate::registrar::Inventory;
use crate::schema::SchemaEntry;
use crate::source::LinkSource;

pub(crate) fn statistics_json(signal_local: i64) -> Value {
    json!({
        "rxRate": 120_000_000,
        "txRate": 95_000_000,
        "downlinkCapacity": 800_000_000,
        "uplinkCapacity": 790_000_000,
        "downlinkUtilization": 0.15,
        "uplinkUtilization": 0.12,
        "signalLocal": signal_local,
        "signalRemote": -57,
        "signalChain0": -56,
        "signalChain1": -58,
        "signalRemoteChain0": -57,
        "signalRemoteChain1": -59,
        "linkScore": 0.92,
        "score": 92,
        "scoreMax": 100,
        "airTimeScore": 88,
        "linkScoreHint": "good",
        "theoreticalDownlinkCapacity": 1_000_000_000,
        "theoreticalUplinkCapacity": 1_000_000_000,
        "lastSeen": "2026-01-01T00:00:00Z"
    })
}

pub(crate) fn link_json(ssid: &str, signal_local: i64) -> Value {
    json!({
        "id": "0f1e2d3c",
        "ssid": ssid,
        "signal": -56,
        "frequency": 5800,
        "from": {
            "site": { "identification": { "name": "Tower-A" } },
            "device": { "identification": { "model": "AF60-LR", "name": "a-radio" } },
            "interface": { "statistics": statistics_json(signal_local) }
        },
        "to": {
            "site": { "identification": { "name": "Tower-B" } },
            "device": { "identification": { "model": "AF60-LR", "name": "b-radio" } },
            "interface": { "statistics": statistics_json(-57) }
        }
    })
}

// ── In-memory inventory ──────────────────────────────────────────────


/// Records every call by JSON-RPC method name and hands out sequential ids.
#[derive(Default)]
pub(crate) struct FakeInventory {
    calls: Mutex<HashMap<&'static str, usize>>,
    objects: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<&'static str>>,
    next_id: AtomicU32,
}

impl FakeInventory {
    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn seed_host(&self, name: &str, id: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("host:{name}"), id.to_owned());
    }

    pub(crate) fn seed_item(&self, template_id: &str, key: &str, id: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("item:{template_id}/{key}"), id.to_owned());
    }

    pub(crate) fn fail_on(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub(crate) fn recover(&self, method: &'static str) {
        self.failing.lock().unwrap().remove(method);
    }

    fn record(&self, method: &'static str) -> Result<(), CoreError> {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
        if self.failing.lock().unwrap().contains(method) {
            return Err(CoreError::Api {
                message: format!("{method} refused"),
                code: Some(-32500),
            });
        }
        Ok(())
    }

    fn lookup(&self, slot: String) -> Option<String> {
        self.objects.lock().unwrap().get(&slot).cloned()
    }

    fn allocate(&self, slot: String) -> String {
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        self.objects.lock().unwrap().insert(slot, id.clone());
        id
    }
}

fn group_slot(kind: GroupKind, name: &str) -> String {
    format!("{kind:?}:{name}")
}

impl Inventory for FakeInventory {
    async fn find_group(&self, kind: GroupKind, name: &str) -> Result<Option<String>, CoreError> {
        self.record("group.get")?;
        Ok(self.lookup(group_slot(kind, name)))
    }

    async fn create_group(&self, kind: GroupKind, name: &str) -> Result<String, CoreError> {
        self.record("group.create")?;
        Ok(self.allocate(group_slot(kind, name)))
    }

    async fn find_template(&self, name: &str) -> Result<Option<String>, CoreError> {
        self.record("template.get")?;
        Ok(self.lookup(format!("template:{name}")))
    }

    async fn create_template(&self, name: &str, _group_id: &str) -> Result<String, CoreError> {
        self.record("template.create")?;
        Ok(self.allocate(format!("template:{name}")))
    }

    async fn find_item(&self, template_id: &str, key: &str) -> Result<Option<String>, CoreError> {
        self.record("item.get")?;
        Ok(self.lookup(format!("item:{template_id}/{key}")))
    }

    async fn create_item(&self, template_id: &str, entry: &SchemaEntry) -> Result<String, CoreError> {
        self.record("item.create")?;
        Ok(self.allocate(format!("item:{template_id}/{}", entry.key)))
    }

    async fn update_item(&self, _item_id: &str, _entry: &SchemaEntry) -> Result<(), CoreError> {
        self.record("item.update")
    }

    async fn find_host(&self, name: &str) -> Result<Option<String>, CoreError> {
        self.record("host.get")?;
        Ok(self.lookup(format!("host:{name}")))
    }

    async fn create_host(&self, host: &HostDefinition) -> Result<String, CoreError> {
        self.record("host.create")?;
        Ok(self.allocate(format!("host:{}", host.host)))
    }

    async fn update_host(&self, _host_id: &str, _host: &HostDefinition) -> Result<(), CoreError> {
        self.record("host.update")
    }
}

// ── Scripted source and sink ─────────────────────────────────────────

/// Returns the same records every cycle, or an empty-collection error when
/// there are none.
#[derive(Default)]
pub(crate) struct FakeSource {
    pub(crate) records: Mutex<Vec<Value>>,
    pub(crate) polls: AtomicU32,
}

impl FakeSource {
    pub(crate) fn with(records: Vec<Value>) -> Self {
        Self {
            records: Mutex::new(records),
            polls: AtomicU32::new(0),
        }
    }
}

impl LinkSource for FakeSource {
    async fn list_links(&self) -> Result<Vec<Value>, CoreError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap().clone();
        if records.is_empty() {
            return Err(CoreError::EmptyCollection {
                resource: "data links".into(),
            });
        }
        Ok(records)
    }
}

/// Fails the first `failures` deliveries, then accepts everything.
#[derive(Default)]
pub(crate) struct FakeSink {
    pub(crate) failures: AtomicU32,
    pub(crate) attempts: AtomicU32,
    pub(crate) delivered: Mutex<Vec<Vec<MetricSample>>>,
}

impl FakeSink {
    pub(crate) fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn batches(&self) -> Vec<Vec<MetricSample>> {
        self.delivered.lock().unwrap().clone()
    }
}

impl MetricSink for FakeSink {
    async fn deliver(&self, samples: &[MetricSample]) -> Result<(), CoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CoreError::ConnectionFailed {
                url: "zabbix:10051".into(),
                reason: "connection refused".into(),
            });
        }
        self.delivered.lock().unwrap().push(samples.to_vec());
        Ok(())
    }
}
