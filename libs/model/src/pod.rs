//! Pod naming: `{type}-{ordinal}` parsing and formatting.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A parsed pod name.
///
/// Pod names are `{type}-{ordinal}` where ordinals are dense and
/// zero-based per type (e.g. `proxylite-0`, `world-2`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PodName {
    pod_type: String,
    ordinal: u32,
}

impl PodName {
    /// Creates a pod name from a type and ordinal.
    pub fn new(pod_type: impl Into<String>, ordinal: u32) -> Self {
        Self {
            pod_type: pod_type.into(),
            ordinal,
        }
    }

    /// Parses a `{type}-{ordinal}` string.
    ///
    /// The ordinal is the final `-`-separated segment; the type is
    /// everything before it, so type names may themselves contain `-`.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let Some((pod_type, ordinal_str)) = s.rsplit_once('-') else {
            return Err(ModelError::MalformedPodName(s.to_string()));
        };

        if pod_type.is_empty() {
            return Err(ModelError::MalformedPodName(s.to_string()));
        }

        // Reject non-canonical spellings like "proxylite-00" or "proxylite-+1".
        let ordinal: u32 = ordinal_str
            .parse()
            .map_err(|_| ModelError::MalformedPodName(s.to_string()))?;
        if ordinal.to_string() != ordinal_str {
            return Err(ModelError::MalformedPodName(s.to_string()));
        }

        Ok(Self {
            pod_type: pod_type.to_string(),
            ordinal,
        })
    }

    /// The pod type (e.g. `proxylite`).
    pub fn pod_type(&self) -> &str {
        &self.pod_type
    }

    /// The zero-based ordinal within the type.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl std::fmt::Display for PodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.pod_type, self.ordinal)
    }
}

impl std::str::FromStr for PodName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PodName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PodName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
