// ── Entity registrar ──
//
// Idempotent get-or-create for the Zabbix objects the bridge depends on.
// Every resolution goes cache -> remote lookup -> remote create -> cache.
// The cache lives for the whole process and is never invalidated.

use std::future::Future;

use dashmap::DashMap;
use strum::Display;
use tracing::{debug, info};
use uisp2zabbix_api::{GroupKind, HostDefinition};

use crate::error::CoreError;
use crate::schema::SchemaEntry;

/// Remote inventory the registrar provisions against.
///
/// Implemented for [`uisp2zabbix_api::ZabbixClient`] in
/// [`crate::adapters`]; tests substitute an in-memory fake.
pub trait Inventory: Send + Sync {
    fn find_group(
        &self,
        kind: GroupKind,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn create_group(
        &self,
        kind: GroupKind,
        name: &str,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn find_template(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn create_template(
        &self,
        name: &str,
        group_id: &str,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn find_item(
        &self,
        template_id: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn create_item(
        &self,
        template_id: &str,
        entry: &SchemaEntry,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn update_item(
        &self,
        item_id: &str,
        entry: &SchemaEntry,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn find_host(&self, name: &str)
    -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn create_host(
        &self,
        host: &HostDefinition,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Push groups and tags to an existing host. Never touches templates.
    fn update_host(
        &self,
        host_id: &str,
        host: &HostDefinition,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

// ── Registry cache ───────────────────────────────────────────────────

/// Kind of remote object held in the registry cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    TemplateGroup,
    HostGroup,
    Template,
    Item,
    Host,
}

impl From<GroupKind> for EntityKind {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::TemplateGroup => Self::TemplateGroup,
            GroupKind::HostGroup => Self::HostGroup,
        }
    }
}

/// Process-lifetime map from `(kind, name)` to remote id.
///
/// Items are scoped by template: their cache name is `<template_id>/<key>`.
#[derive(Debug, Default)]
pub struct RegistryCache {
    entries: DashMap<(EntityKind, String), String>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EntityKind, name: &str) -> Option<String> {
        self.entries
            .get(&(kind, name.to_owned()))
            .map(|id| id.value().clone())
    }

    pub fn insert(&self, kind: EntityKind, name: &str, id: &str) {
        self.entries.insert((kind, name.to_owned()), id.to_owned());
    }

}

// ── Registrar ────────────────────────────────────────────────────────

/// Resolves groups, templates, items, and hosts to remote ids.
pub struct Registrar<I> {
    inventory: I,
    cache: RegistryCache,
}

impl<I: Inventory> Registrar<I> {
    pub fn new(inventory: I) -> Self {
        Self {
            inventory,
            cache: RegistryCache::new(),
        }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn cache(&self) -> &RegistryCache {
        &self.cache
    }

    /// Resolve a template group or host group by name.
    pub async fn resolve_group(&self, kind: GroupKind, name: &str) -> Result<String, CoreError> {
        let entity = EntityKind::from(kind);
        if let Some(id) = self.cache.get(entity, name) {
            return Ok(id);
        }

        let id = match self.inventory.find_group(kind, name).await? {
            Some(id) => id,
            None => {
                let id = self.inventory.create_group(kind, name).await?;
                info!(kind = %entity, name, id = %id, "created group");
                id
            }
        };

        self.cache.insert(entity, name, &id);
        Ok(id)
    }

    /// Resolve the bridge template. The flag is `true` when this call
    /// created it.
    pub async fn resolve_template(
        &self,
        name: &str,
        group_id: &str,
    ) -> Result<(String, bool), CoreError> {
        if let Some(id) = self.cache.get(EntityKind::Template, name) {
            return Ok((id, false));
        }

        let (id, created) = match self.inventory.find_template(name).await? {
            Some(id) => (id, false),
            None => {
                let id = self.inventory.create_template(name, group_id).await?;
                info!(template = name, id = %id, "created template");
                (id, true)
            }
        };

        self.cache.insert(EntityKind::Template, name, &id);
        Ok((id, created))
    }

    /// Resolve one template item. An existing item is only rewritten when
    /// `force_update` is set.
    pub async fn resolve_item(
        &self,
        template_id: &str,
        entry: &SchemaEntry,
        force_update: bool,
    ) -> Result<String, CoreError> {
        let scoped = format!("{template_id}/{}", entry.key);
        if let Some(id) = self.cache.get(EntityKind::Item, &scoped) {
            return Ok(id);
        }

        let id = match self.inventory.find_item(template_id, &entry.key).await? {
            Some(id) if force_update => {
                self.inventory.update_item(&id, entry).await?;
                debug!(key = %entry.key, id = %id, "updated item");
                id
            }
            Some(id) => id,
            None => {
                let id = self.inventory.create_item(template_id, entry).await?;
                debug!(key = %entry.key, id = %id, "created item");
                id
            }
        };

        self.cache.insert(EntityKind::Item, &scoped, &id);
        Ok(id)
    }

    /// Resolve a host by name.
    ///
    /// Only a newly created host gets the template binding. With
    /// `force_update`, a pre-existing host has its groups and tags rewritten
    /// the first time it is resolved in this process.
    pub async fn resolve_host(
        &self,
        host: &HostDefinition,
        force_update: bool,
    ) -> Result<String, CoreError> {
        if let Some(id) = self.cache.get(EntityKind::Host, &host.host) {
            return Ok(id);
        }

        let id = match self.inventory.find_host(&host.host).await? {
            Some(id) if force_update => {
                self.inventory.update_host(&id, host).await?;
                info!(host = %host.host, id = %id, "updated host");
                id
            }
            Some(id) => id,
            None => {
                let id = self.inventory.create_host(host).await?;
                info!(host = %host.host, id = %id, "created host");
                id
            }
        };

        self.cache.insert(EntityKind::Host, &host.host, &id);
        Ok(id)
    }
}
