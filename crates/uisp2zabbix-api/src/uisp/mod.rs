// UISP NMS API surface
//
// Only the read-only endpoints the bridge polls: data links, devices,
// and per-device statistics history.

mod client;

pub use client::{StatisticsInterval, UispClient};
