//! Route records as returned by the structured data endpoint

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use super::Coordinate;

/// Stable route identifier.
///
/// The data endpoint renders ids as JSON numbers while search results carry
/// them as path segments, so both forms deserialize into the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for RouteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RouteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RouteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// One route as delivered by the catalog service.
///
/// Service-supplied fields (name, grade, ...) are carried through untouched
/// in `fields`. Enrichment adds `fa` and `gps`; both stay absent when the
/// route's detail page could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: RouteId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<Coordinate>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RouteRecord {
    pub fn new(id: impl Into<RouteId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            fa: None,
            gps: None,
            fields: Map::new(),
        }
    }

    /// Attach a service-supplied field (builder style)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub const fn is_enriched(&self) -> bool {
        self.fa.is_some() && self.gps.is_some()
    }
}

impl From<String> for RouteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Body of a `getRoutes` response: the `routes` array plus whatever else the
/// service reports (e.g. `success`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutesResponse {
    #[serde(default)]
    pub routes: Vec<RouteRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
