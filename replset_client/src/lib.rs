/*!
replset_client is a small client library for bringing up a replicated
data-store cluster from a declarative topology description.

A [`TopologyDescriptor`] is parsed from external input (JSON), checked
against the schema invariants with [`TopologyDescriptor::validate`], and
handed to a [`ManagementClient`] which submits it to the cluster-management
endpoint exactly once. Cluster initiation is not idempotent, so the client
never retries on its own; on failure the caller inspects the
[`SubmissionError`] and decides what to do next.

# Example
// ```rust
// use replset_client::{ManagementClientBuilder, TopologyDescriptor};

// let descriptor = TopologyDescriptor::from_json(raw)?;
// descriptor.validate()?;

// let client = ManagementClientBuilder::new()
//     .set_url("http://localhost:8080")
//     .build()?;

// let ack = client.submit_topology(&descriptor).await?;
// ```

The descriptor is discarded after submission; nothing in this crate mutates
it once it has been validated.
*/

mod management_client;
mod schema;
mod submission_ack;
mod topology_descriptor;

pub mod cluster_command;

pub use management_client::*;
pub use schema::SchemaError;
pub use submission_ack::SubmissionAck;
pub use topology_descriptor::*;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
