//! Subject roles and version selectors for schema registry lookups.
//!
//! A Kafka record carries two independently-schematized chunks, its key and its
//! value. The registry stores each under its own subject, `{topic}-{role}`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which part of a Kafka record a schema applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRole {
    /// Record key
    Key,
    /// Record value
    Value,
}

impl SchemaRole {
    /// Registry subject name for this role of `topic`
    pub fn subject(&self, topic: &str) -> String {
        format!("{}-{}", topic, self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaRole::Key => "key",
            SchemaRole::Value => "value",
        }
    }
}

impl std::fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "key" => Ok(SchemaRole::Key),
            "value" => Ok(SchemaRole::Value),
            _ => Err(format!("Unknown schema role: {}", s)),
        }
    }
}

/// Which schema versions of a subject to load
///
/// Serialized as `"latest"`, `"all"` or a plain version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// Only the newest version known to the registry
    #[default]
    Latest,
    /// Every version the registry lists for the subject
    All,
    /// One explicit version
    Version(u32),
}

impl VersionSelector {
    /// Path segment used in `/subjects/{subject}/versions/{segment}`
    ///
    /// `All` has no single segment; callers list the versions first.
    pub(crate) fn path_segment(&self) -> Option<String> {
        match self {
            VersionSelector::Latest => Some("latest".to_string()),
            VersionSelector::Version(v) => Some(v.to_string()),
            VersionSelector::All => None,
        }
    }
}

impl std::fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::All => write!(f, "all"),
            VersionSelector::Version(v) => write!(f, "{}", v),
        }
    }
}

impl std::str::FromStr for VersionSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(VersionSelector::Latest),
            "all" => Ok(VersionSelector::All),
            other => match other.parse::<u32>() {
                Ok(0) => Err("Schema versions start at 1".to_string()),
                Ok(v) => Ok(VersionSelector::Version(v)),
                Err(_) => Err(format!("Unknown schema version selector: {}", s)),
            },
        }
    }
}

impl From<u32> for VersionSelector {
    fn from(version: u32) -> Self {
        VersionSelector::Version(version)
    }
}

impl Serialize for VersionSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VersionSelector::Version(v) => serializer.serialize_u32(*v),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for VersionSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u32),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(0) => Err(serde::de::Error::custom("Schema versions start at 1")),
            Repr::Number(v) => Ok(VersionSelector::Version(v)),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
