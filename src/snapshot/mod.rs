//! Telemetry snapshot document.
//!
//! A snapshot is a flat JSON object whose scalar values are all strings.
//! Role dependent keys (`replication_state`, `db_replication_id`,
//! `shard_svr`, `config_svr`) are omitted entirely when the role does not
//! apply; consumers check for key existence, so a `false` flag is never
//! written.

mod builder;
pub use builder::*;


use serde::Deserialize;
use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "db_instance_id")]
    pub instance_id: String,

    #[serde(rename = "db_internal_id")]
    pub internal_id: String,

    /// `mongod`, `mongod-pro`, `mongos` or `mongos-pro`
    pub source: String,

    pub storage_engine: String,

    #[serde(default)]
    pub pro_features: Vec<String>,

    pub pillar_version: String,

    #[serde(rename = "uptime", with = "string_u64")]
    pub uptime_seconds: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_replication_id: Option<String>,

    #[serde(default, skip_serializing_if = "is_false", with = "string_flag")]
    pub shard_svr: bool,

    #[serde(default, skip_serializing_if = "is_false", with = "string_flag")]
    pub config_svr: bool,

    /// Capture time, unix milliseconds
    #[serde(rename = "collected_at", with = "string_u64")]
    pub captured_at_ms: u64,
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOr<T> {
    Str(String),
    Raw(T),
}

mod string_u64 {
    use serde::de::Error;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    use super::StringOr;

    pub fn serialize<S: Serializer>(
        v: &u64,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match StringOr::<u64>::deserialize(d)? {
            StringOr::Str(s) => s.parse().map_err(D::Error::custom),
            StringOr::Raw(v) => Ok(v),
        }
    }
}

mod string_flag {
    use serde::de::Error;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    use super::StringOr;

    pub fn serialize<S: Serializer>(
        v: &bool,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *v { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match StringOr::<bool>::deserialize(d)? {
            StringOr::Str(s) => s.parse().map_err(D::Error::custom),
            StringOr::Raw(v) => Ok(v),
        }
    }
}
