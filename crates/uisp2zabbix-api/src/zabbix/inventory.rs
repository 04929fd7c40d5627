// Zabbix inventory endpoints
//
// Lookup-by-name and create/update for the four object kinds the bridge
// provisions. Lookups return `None` on a miss; creates return the new id.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::zabbix::client::ZabbixClient;
use crate::zabbix::models::{
    GroupIds, GroupKind, GroupRow, HostDefinition, HostIds, HostRow, ITEM_TYPE_TRAPPER,
    ItemDefinition, ItemIds, ItemRow, TemplateIds, TemplateRow,
};

/// Take the first id out of a `*ids` create response.
fn first_id(ids: Vec<String>, method: &str) -> Result<String, Error> {
    ids.into_iter().next().ok_or_else(|| Error::Deserialization {
        message: format!("{method}: response contained no ids"),
        body: String::new(),
    })
}

impl ZabbixClient {
    // ── Groups ───────────────────────────────────────────────────────

    /// Find a template group or host group by exact name.
    ///
    /// `templategroup.get` / `hostgroup.get` with `{filter: {name: [...]}}`
    pub async fn find_group(&self, kind: GroupKind, name: &str) -> Result<Option<String>, Error> {
        debug!(?kind, name, "looking up group");
        let method = format!("{}.get", kind.api_object());
        let rows: Vec<GroupRow> = self
            .call(
                &method,
                &json!({
                    "output": ["groupid"],
                    "filter": { "name": [name] },
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.groupid))
    }

    /// Create a template group or host group.
    ///
    /// `templategroup.create` / `hostgroup.create` with `{name}`
    pub async fn create_group(&self, kind: GroupKind, name: &str) -> Result<String, Error> {
        debug!(?kind, name, "creating group");
        let method = format!("{}.create", kind.api_object());
        let created: GroupIds = self.call(&method, &json!({ "name": name })).await?;
        first_id(created.groupids, &method)
    }

    // ── Templates ────────────────────────────────────────────────────

    /// Find a template by its technical name.
    ///
    /// `template.get` with `{filter: {host: [...]}}`
    pub async fn find_template(&self, name: &str) -> Result<Option<String>, Error> {
        debug!(name, "looking up template");
        let rows: Vec<TemplateRow> = self
            .call(
                "template.get",
                &json!({
                    "output": ["templateid"],
                    "filter": { "host": [name] },
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.templateid))
    }

    /// Create a template inside a template group.
    ///
    /// `template.create` with `{host, groups: [{groupid}]}`
    pub async fn create_template(&self, name: &str, group_id: &str) -> Result<String, Error> {
        debug!(name, group_id, "creating template");
        let created: TemplateIds = self
            .call(
                "template.create",
                &json!({
                    "host": name,
                    "groups": [{ "groupid": group_id }],
                }),
            )
            .await?;
        first_id(created.templateids, "template.create")
    }

    // ── Items ────────────────────────────────────────────────────────

    /// Find an item on a template by key.
    ///
    /// `item.get` with `{templateids: [...], filter: {key_: [...]}}`
    pub async fn find_item(&self, template_id: &str, key: &str) -> Result<Option<String>, Error> {
        debug!(template_id, key, "looking up item");
        let rows: Vec<ItemRow> = self
            .call(
                "item.get",
                &json!({
                    "output": ["itemid"],
                    "templateids": [template_id],
                    "filter": { "key_": [key] },
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.itemid))
    }

    /// Create a trapper item on a template.
    ///
    /// `item.create` with `{name, key_, type: 2, value_type, hostid, units}`
    pub async fn create_item(
        &self,
        template_id: &str,
        item: &ItemDefinition,
    ) -> Result<String, Error> {
        debug!(template_id, key = %item.key, "creating item");
        let created: ItemIds = self
            .call(
                "item.create",
                &json!({
                    "name": item.name,
                    "key_": item.key,
                    "type": ITEM_TYPE_TRAPPER,
                    "value_type": item.value_type,
                    "hostid": template_id,
                    "units": item.units,
                }),
            )
            .await?;
        first_id(created.itemids, "item.create")
    }

    /// Push name, value type, and units onto an existing item.
    ///
    /// `item.update` with `{itemid, name, value_type, units}`
    pub async fn update_item(&self, item_id: &str, item: &ItemDefinition) -> Result<(), Error> {
        debug!(item_id, key = %item.key, "updating item");
        let _: ItemIds = self
            .call(
                "item.update",
                &json!({
                    "itemid": item_id,
                    "name": item.name,
                    "value_type": item.value_type,
                    "units": item.units,
                }),
            )
            .await?;
        Ok(())
    }

    // ── Hosts ────────────────────────────────────────────────────────

    /// Find a host by its technical name.
    ///
    /// `host.get` with `{filter: {host: [...]}}`
    pub async fn find_host(&self, name: &str) -> Result<Option<String>, Error> {
        debug!(name, "looking up host");
        let rows: Vec<HostRow> = self
            .call(
                "host.get",
                &json!({
                    "output": ["hostid"],
                    "filter": { "host": [name] },
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.hostid))
    }

    /// Create a host in a host group, linked to a template.
    ///
    /// `host.create` with `{host, groups, templates, tags}`
    pub async fn create_host(&self, host: &HostDefinition) -> Result<String, Error> {
        debug!(host = %host.host, "creating host");
        let created: HostIds = self
            .call(
                "host.create",
                &json!({
                    "host": host.host,
                    "groups": [{ "groupid": host.group_id }],
                    "templates": [{ "templateid": host.template_id }],
                    "tags": host.tags,
                }),
            )
            .await?;
        first_id(created.hostids, "host.create")
    }

    /// Replace the groups and tags of an existing host.
    ///
    /// `host.update` with `{hostid, groups, tags}`. Template links are not
    /// touched.
    pub async fn update_host(&self, host_id: &str, host: &HostDefinition) -> Result<(), Error> {
        debug!(host_id, host = %host.host, "updating host");
        let _: HostIds = self
            .call(
                "host.update",
                &json!({
                    "hostid": host_id,
                    "groups": [{ "groupid": host.group_id }],
                    "tags": host.tags,
                }),
            )
            .await?;
        Ok(())
    }
}
