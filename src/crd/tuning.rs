//! # Output Tuning
//!
//! Delivery guarantees and batching knobs applied per output. The generator
//! maps these onto the native buffering/retry directives of each collector
//! dialect.

use serde::{Deserialize, Serialize};

/// Delivery guarantee for an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum DeliveryMode {
    /// Buffer to disk and retry until acknowledged.
    AtLeastOnce,
    /// Keep records in memory and shed on overflow.
    AtMostOnce,
}

/// Payload compression codec. Mapped to the dialect-native codec name;
/// not every output kind supports every codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gzip,
    Snappy,
    Zlib,
    Zstd,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Snappy => "snappy",
            Compression::Zlib => "zlib",
            Compression::Zstd => "zstd",
        }
    }
}

/// TuningSpec tunes delivery, compression, and retry behavior of one output.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TuningSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryMode>,

    /// Compression codec; absent means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,

    /// Minimum wait between delivery retries, e.g. `1s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_retry_duration: Option<String>,

    /// Maximum wait between delivery retries, e.g. `60s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retry_duration: Option<String>,

    /// Maximum size of a single write to the output, e.g. `8m`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_write: Option<String>,
}
