// Zabbix API request/response shapes
//
// Zabbix returns every identifier as a JSON string, so ids stay `String`
// end to end.

use serde::{Deserialize, Serialize};

/// Zabbix item `value_type` codes.
pub mod value_type {
    pub const NUMERIC_FLOAT: u8 = 0;
    pub const CHARACTER: u8 = 1;
    pub const LOG: u8 = 2;
    pub const NUMERIC_UNSIGNED: u8 = 3;
    pub const TEXT: u8 = 4;
}

/// Zabbix item `type` for trapper items (values pushed by a sender).
pub(crate) const ITEM_TYPE_TRAPPER: u8 = 2;

/// The two kinds of group the bridge provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    TemplateGroup,
    HostGroup,
}

impl GroupKind {
    /// JSON-RPC object name (`templategroup.get`, `hostgroup.create`, ...).
    pub(crate) fn api_object(self) -> &'static str {
        match self {
            Self::TemplateGroup => "templategroup",
            Self::HostGroup => "hostgroup",
        }
    }
}

/// Definition of a trapper item attached to a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDefinition {
    pub name: String,
    pub key: String,
    pub value_type: u8,
    pub units: String,
}

/// A `{tag, value}` pair on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTag {
    pub tag: String,
    pub value: String,
}

/// Definition of a host to create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDefinition {
    pub host: String,
    pub group_id: String,
    pub template_id: String,
    pub tags: Vec<HostTag>,
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct GroupRow {
    pub groupid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupIds {
    pub groupids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateRow {
    pub templateid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateIds {
    pub templateids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemRow {
    pub itemid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemIds {
    pub itemids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostRow {
    pub hostid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostIds {
    pub hostids: Vec<String>,
}
