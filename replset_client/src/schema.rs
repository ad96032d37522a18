use std::collections::HashSet;

use tracing::instrument;

use crate::{Member, TopologyDescriptor};

/// A schema invariant the descriptor violates, named precisely enough for
/// the caller to fix the input and resubmit from scratch.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("document does not match the topology descriptor shape: {0}")]
    Malformed(String),
    #[error("identifier must not be empty")]
    EmptyIdentifier,
    #[error("version must be at least 1")]
    InvalidVersion,
    #[error("members must contain at least one member")]
    NoMembers,
    #[error("member id {id} appears more than once")]
    DuplicateMemberId { id: u32 },
    #[error("member {member_id} host `{host}` is not a valid host:port address")]
    MalformedHost { member_id: u32, host: String },
    #[error("default write concern timeout must not be negative, got {wtimeout_ms}ms")]
    NegativeTimeout { wtimeout_ms: i64 },
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::Malformed(e.to_string())
    }
}

impl TopologyDescriptor {
    /// Checks the descriptor against the schema invariants and reports the
    /// first one violated, in document order.
    ///
    /// Pure and idempotent; validating the same descriptor twice yields the
    /// same result.
    #[instrument(level = "debug", name = "Validate Topology Descriptor", skip(self), fields(identifier = %self.identifier))]
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.identifier.is_empty() {
            tracing::error!("Descriptor has an empty identifier");
            return Err(SchemaError::EmptyIdentifier);
        }

        if self.version < 1 {
            tracing::error!("Descriptor version is {}", self.version);
            return Err(SchemaError::InvalidVersion);
        }

        if self.members.is_empty() {
            tracing::error!("Descriptor has no members");
            return Err(SchemaError::NoMembers);
        }

        let mut seen_ids = HashSet::new();
        for member in &self.members {
            if !seen_ids.insert(member.id) {
                tracing::error!("Member id {} appears more than once", member.id);
                return Err(SchemaError::DuplicateMemberId { id: member.id });
            }
            validate_host(member)?;
        }

        if let Some(write_concern) = self
            .settings
            .as_ref()
            .and_then(|s| s.default_write_concern.as_ref())
        {
            if write_concern.wtimeout_ms < 0 {
                tracing::error!(
                    "Default write concern timeout is negative: {}ms",
                    write_concern.wtimeout_ms
                );
                return Err(SchemaError::NegativeTimeout {
                    wtimeout_ms: write_concern.wtimeout_ms,
                });
            }
        }

        Ok(())
    }
}

/// Ensures a member's address is a syntactically valid `host:port` pair:
/// non-empty host, port in 1..=65535.
fn validate_host(member: &Member) -> Result<(), SchemaError> {
    let malformed = || SchemaError::MalformedHost {
        member_id: member.id,
        host: member.host.clone(),
    };

    let (host, port) = member.host.rsplit_once(':').ok_or_else(malformed)?;

    if host.is_empty() {
        return Err(malformed());
    }

    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use crate::{AckLevel, Member, ReplicaSettings, SchemaError, TopologyDescriptor, WriteConcern};

    use super::validate_host;

    fn three_member_descriptor() -> TopologyDescriptor {
        TopologyDescriptor {
            identifier: "rs-shard-03".to_string(),
            version: 1,
            members: vec![
                Member {
                    id: 0,
                    host: "shard03-a:27017".to_string(),
                },
                Member {
                    id: 1,
                    host: "shard03-b:27017".to_string(),
                },
                Member {
                    id: 2,
                    host: "shard03-c:27017".to_string(),
                },
            ],
            settings: Some(ReplicaSettings {
                default_write_concern: Some(WriteConcern {
                    w: AckLevel::Majority,
                    wtimeout_ms: 5000,
                }),
            }),
        }
    }

    #[test]
    fn validate_succeeds_for_three_unique_members_at_version_one() {
        // Arrange
        let descriptor = three_member_descriptor();

        // Act
        let result = descriptor.validate();

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn validate_is_idempotent() {
        let descriptor = three_member_descriptor();

        assert_eq!(descriptor.validate(), descriptor.validate());
    }

    #[test]
    fn validate_fails_for_an_empty_identifier() {
        let mut descriptor = three_member_descriptor();
        descriptor.identifier.clear();

        assert_eq!(descriptor.validate(), Err(SchemaError::EmptyIdentifier));
    }

    #[test]
    fn validate_fails_for_version_zero() {
        let mut descriptor = three_member_descriptor();
        descriptor.version = 0;

        assert_eq!(descriptor.validate(), Err(SchemaError::InvalidVersion));
    }

    #[test]
    fn validate_fails_for_an_empty_members_list() {
        let mut descriptor = three_member_descriptor();
        descriptor.members.clear();

        assert_eq!(descriptor.validate(), Err(SchemaError::NoMembers));
    }

    #[test]
    fn validate_fails_for_duplicate_member_ids() {
        let mut descriptor = three_member_descriptor();
        descriptor.members[2].id = 0;

        assert_eq!(
            descriptor.validate(),
            Err(SchemaError::DuplicateMemberId { id: 0 })
        );
    }

    #[test]
    fn validate_fails_for_a_negative_write_concern_timeout() {
        let mut descriptor = three_member_descriptor();
        descriptor
            .settings
            .as_mut()
            .unwrap()
            .default_write_concern
            .as_mut()
            .unwrap()
            .wtimeout_ms = -1;

        assert_eq!(
            descriptor.validate(),
            Err(SchemaError::NegativeTimeout { wtimeout_ms: -1 })
        );
    }

    #[test]
    fn validate_reports_the_first_violation_in_document_order() {
        // Both the duplicate id and the negative timeout are present; the
        // duplicate comes first in the document.
        let mut descriptor = three_member_descriptor();
        descriptor.members[1].id = 0;
        descriptor
            .settings
            .as_mut()
            .unwrap()
            .default_write_concern
            .as_mut()
            .unwrap()
            .wtimeout_ms = -1;

        assert_eq!(
            descriptor.validate(),
            Err(SchemaError::DuplicateMemberId { id: 0 })
        );
    }

    #[test]
    fn validate_host_accepts_a_hostname_with_port() {
        let member = Member {
            id: 0,
            host: "shard03-a:27017".to_string(),
        };

        assert!(validate_host(&member).is_ok());
    }

    #[test]
    fn validate_host_rejects_a_missing_port() {
        let member = Member {
            id: 0,
            host: "shard03-a".to_string(),
        };

        assert!(matches!(
            validate_host(&member),
            Err(SchemaError::MalformedHost { member_id: 0, .. })
        ));
    }

    #[test]
    fn validate_host_rejects_an_empty_host_part() {
        let member = Member {
            id: 1,
            host: ":27017".to_string(),
        };

        assert!(matches!(
            validate_host(&member),
            Err(SchemaError::MalformedHost { member_id: 1, .. })
        ));
    }

    #[test]
    fn validate_host_rejects_port_zero_and_overflow() {
        for host in ["shard03-a:0", "shard03-a:70000", "shard03-a:port"] {
            let member = Member {
                id: 0,
                host: host.to_string(),
            };

            assert!(validate_host(&member).is_err(), "accepted `{}`", host);
        }
    }
}
