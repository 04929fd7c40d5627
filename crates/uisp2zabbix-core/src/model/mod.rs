// ── Domain model ──
//
// A point-to-point wireless link as UISP reports it, and the scalar
// values extracted from it.

pub mod link;
pub mod statistics;

use std::fmt;

use serde::Serialize;

pub use link::{Direction, Link};
pub use statistics::{FieldKind, LinkStatistics, Number, StatField};

/// A single scalar observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}
