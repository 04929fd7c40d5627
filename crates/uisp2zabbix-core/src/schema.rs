// ── Schema descriptor ──
//
// Derives one Zabbix item definition per flattened metric from the same
// static field table the flattener walks, so keys always line up.

use strum::{Display, IntoEnumIterator};
use uisp2zabbix_api::{ItemDefinition, value_type};

use crate::metrics::{
    FREQUENCY_FIELD, METRIC_PREFIX, METRICS_PER_LINK, SIGNAL_FIELD, direction_key, link_key,
};
use crate::model::{Direction, FieldKind, StatField};

/// Zabbix item value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ValueType {
    NumericFloat,
    Character,
    Log,
    NumericUnsigned,
    Text,
}

impl ValueType {
    /// Numeric code Zabbix expects in `value_type`.
    pub fn code(self) -> u8 {
        match self {
            Self::NumericFloat => value_type::NUMERIC_FLOAT,
            Self::Character => value_type::CHARACTER,
            Self::Log => value_type::LOG,
            Self::NumericUnsigned => value_type::NUMERIC_UNSIGNED,
            Self::Text => value_type::TEXT,
        }
    }

    /// Signals are negative, so integers go to numeric-float too.
    pub fn classify(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer | FieldKind::Float => Self::NumericFloat,
            FieldKind::Text => Self::Text,
        }
    }
}

/// Definition of one item on the bridge template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub key: String,
    pub name: String,
    pub value_type: ValueType,
    pub unit: &'static str,
}

impl SchemaEntry {
    pub fn to_item_definition(&self) -> ItemDefinition {
        ItemDefinition {
            name: self.name.clone(),
            key: self.key.clone(),
            value_type: self.value_type.code(),
            units: self.unit.to_owned(),
        }
    }
}

/// Unit for a field name. Case-sensitive, first match wins.
pub fn derive_unit(field: &str) -> &'static str {
    if field.contains("signal") {
        "dB"
    } else if field.contains("Rate") || field.contains("Capacity") {
        "bps"
    } else {
        ""
    }
}

/// Every item the template carries, in flattening order.
pub fn describe_schema() -> Vec<SchemaEntry> {
    let mut entries = Vec::with_capacity(METRICS_PER_LINK);

    entries.push(SchemaEntry {
        key: link_key(METRIC_PREFIX, SIGNAL_FIELD),
        name: SIGNAL_FIELD.to_owned(),
        value_type: ValueType::NumericFloat,
        unit: "dB",
    });
    entries.push(SchemaEntry {
        key: link_key(METRIC_PREFIX, FREQUENCY_FIELD),
        name: FREQUENCY_FIELD.to_owned(),
        value_type: ValueType::NumericUnsigned,
        unit: "Hz",
    });

    for direction in Direction::iter() {
        for field in StatField::iter() {
            let value_type = ValueType::classify(field.kind());
            let unit = match value_type {
                ValueType::Text => "",
                _ => derive_unit(field.name()),
            };
            entries.push(SchemaEntry {
                key: direction_key(METRIC_PREFIX, direction, field.name()),
                name: format!("{direction}_{}", field.name()),
                value_type,
                unit,
            });
        }
    }

    entries
}
