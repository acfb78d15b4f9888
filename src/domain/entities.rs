//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::DomainError;

/// Parameter keys every blocker carries in `blocker_parameter`.
///
/// Create writes exactly these rows; validation requires all of them.
pub const PARAMETER_KEYS: [&str; 3] = ["nextHop", "host", "port"];

/// Status written for newly created blockers.
pub const DEFAULT_STATUS: i64 = 0;

/// A traffic-control entity with a capacity and routing parameters.
///
/// Serializes as one flat mapping: `id`, `type`, `capacity` and one entry
/// per parameter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub id: i64,
    #[serde(rename = "type")]
    pub blocker_type: String,
    pub capacity: i64,
    #[serde(flatten, deserialize_with = "scalar_map")]
    pub parameters: BTreeMap<String, String>,
}

impl Blocker {
    pub fn new(id: i64, blocker_type: impl Into<String>, capacity: i64) -> Self {
        Self {
            id,
            blocker_type: blocker_type.into(),
            capacity,
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Check that every key in [`PARAMETER_KEYS`] is present.
    pub fn validate(&self) -> Result<(), DomainError> {
        for key in PARAMETER_KEYS {
            if !self.parameters.contains_key(key) {
                return Err(DomainError::MissingParameter {
                    id: self.id,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parameter keys outside [`PARAMETER_KEYS`]; these are not persisted.
    pub fn unknown_parameters(&self) -> Vec<&str> {
        self.parameters
            .keys()
            .map(String::as_str)
            .filter(|k| !PARAMETER_KEYS.contains(k))
            .collect()
    }
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blocker {} (type={}, capacity={})",
            self.id, self.blocker_type, self.capacity
        )
    }
}

/// Scalar accepted as a parameter value in input documents.
///
/// `port: 8080` and `port: "8080"` both end up as the string `"8080"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}
