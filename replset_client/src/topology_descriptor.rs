use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::SchemaError;

/// Declarative description of a replica-set cluster: which members it has
/// and which acknowledgment policy writes get by default.
///
/// A descriptor is constructed once from external input, validated with
/// [`TopologyDescriptor::validate`](crate::TopologyDescriptor::validate),
/// submitted, and discarded. Nothing mutates it after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    pub identifier: String,
    pub version: u64,
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ReplicaSettings>,
}

impl TopologyDescriptor {
    /// Parses a descriptor from its JSON document form.
    ///
    /// A document that does not match the descriptor shape (missing field,
    /// wrong type) fails with [`SchemaError::Malformed`]. Shape is all this
    /// checks; the schema invariants are checked separately by
    /// [`validate`](Self::validate).
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let descriptor = serde_json::from_str::<TopologyDescriptor>(raw)?;
        Ok(descriptor)
    }
}

/// A single replica-set member: a stable numeric id plus the `host:port`
/// address the other members reach it at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u32,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSettings {
    #[serde(
        rename = "defaultWriteConcern",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_write_concern: Option<WriteConcern>,
}

/// Acknowledgment policy for writes: how many members must confirm, and how
/// long to wait for them.
///
/// `wtimeout_ms` is signed on purpose. The wire value is carried through to
/// the validator so a negative timeout is reported as a schema violation
/// rather than rejected during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteConcern {
    pub w: AckLevel,
    #[serde(rename = "wtimeout")]
    pub wtimeout_ms: i64,
}

/// How many replica-set members must acknowledge a write: a literal node
/// count (`2`) or the `"majority"` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckLevel {
    Majority,
    Nodes(u32),
}

impl Serialize for AckLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AckLevel::Majority => serializer.serialize_str("majority"),
            AckLevel::Nodes(count) => serializer.serialize_u32(*count),
        }
    }
}

impl<'de> Deserialize<'de> for AckLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AckLevelVisitor;

        impl<'de> de::Visitor<'de> for AckLevelVisitor {
            type Value = AckLevel;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a node count or the string \"majority\"")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match value {
                    "majority" => Ok(AckLevel::Majority),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let count = u32::try_from(value)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))?;
                Ok(AckLevel::Nodes(count))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let count = u32::try_from(value)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))?;
                Ok(AckLevel::Nodes(count))
            }
        }

        deserializer.deserialize_any(AckLevelVisitor)
    }
}
