use std::{collections::HashMap, net::SocketAddr, time::Duration};

use reqwest::Identity;
use tracing::{instrument, Span};
use url::Url;
use uuid::Uuid;

use crate::{
    cluster_command::{ClusterCommand, ClusterCommandVariant},
    DnsOverrides, SubmissionAck, SubmissionError, TopologyDescriptor,
};

/**
A client for one cluster-management endpoint.

The client holds no mutable state and spawns no background work. One call
to [`submit_topology`](ManagementClient::submit_topology) performs exactly
one HTTP exchange; if the caller abandons the pending future, nothing is
cleaned up on the endpoint's side and
[`verify_status`](ManagementClient::verify_status) should be used to find
out what actually happened.
*/
#[derive(Debug)]
pub struct ManagementClient {
    client_identity: Option<Identity>,
    dns_overrides: Option<DnsOverrides>,
    endpoint_url: Url,
    proxy_address: Option<String>,
    request_timeout: Option<Duration>,
}

impl ManagementClient {
    // This is pub(crate) so only the builder can crank it out
    pub(crate) fn new(
        endpoint_url: Url,
        client_identity: Option<Identity>,
        dns_overrides: Option<DnsOverrides>,
        proxy_address: Option<String>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            client_identity,
            dns_overrides,
            endpoint_url,
            proxy_address,
            request_timeout,
        }
    }

    /// Submits a topology descriptor to the management endpoint, at most
    /// once.
    ///
    /// The descriptor is re-validated first; nothing leaves the process
    /// unvalidated. Exactly one request is sent and on failure the error
    /// says why (`Unreachable`, `Timeout`, `Rejected`) — the client never
    /// retries, because initiating a replica set twice can corrupt its
    /// topology state.
    #[instrument(
        level = "debug",
        name = "Submit Topology",
        skip(self, descriptor),
        fields(identifier = %descriptor.identifier, correlation_id)
    )]
    pub async fn submit_topology(
        &self,
        descriptor: &TopologyDescriptor,
    ) -> Result<SubmissionAck, SubmissionError> {
        Span::current().record("correlation_id", Uuid::new_v4().to_string());

        descriptor.validate()?;

        let command = ClusterCommand {
            base_server_url: self.endpoint_url.clone(),
            command: ClusterCommandVariant::InitiateReplicaSet {
                descriptor: descriptor.clone(),
            },
        };

        let response = self.send_command_request_to_endpoint(command).await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            tracing::error!(
                "Endpoint rejected the topology with status {}: {}",
                status,
                &reason
            );
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        let ack = response.json::<SubmissionAck>().await.map_err(|e| {
            anyhow::anyhow!(
                "Unable to deserialize the acknowledgment record. Caused by: {}",
                e
            )
        })?;

        tracing::info!(
            "Topology `{}` version {} acknowledged.",
            &ack.identifier,
            ack.version
        );
        Ok(ack)
    }

    /// Fetches the replica set's current status from the endpoint.
    ///
    /// Meant for callers who abandoned a pending submission and need to
    /// verify the actual cluster state before doing anything else.
    #[instrument(
        level = "debug",
        name = "Verify Replica Set Status",
        skip(self),
        fields(correlation_id)
    )]
    pub async fn verify_status(
        &self,
        identifier: &str,
    ) -> Result<serde_json::Value, SubmissionError> {
        Span::current().record("correlation_id", Uuid::new_v4().to_string());

        let command = ClusterCommand {
            base_server_url: self.endpoint_url.clone(),
            command: ClusterCommandVariant::GetReplicaSetStatus {
                identifier: identifier.to_string(),
            },
        };

        let response = self.send_command_request_to_endpoint(command).await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        let state = response.json::<serde_json::Value>().await.map_err(|e| {
            anyhow::anyhow!("Unable to deserialize the status record. Caused by: {}", e)
        })?;
        Ok(state)
    }

    #[instrument(level = "debug", skip(self, command))]
    async fn send_command_request_to_endpoint(
        &self,
        command: ClusterCommand,
    ) -> Result<reqwest::Response, SubmissionError> {
        let mut client = reqwest::Client::builder();

        if let Some(identity) = self.client_identity.clone() {
            client = client.identity(identity).use_rustls_tls();
        }

        // Convert Option<HashMap<String, IpAddr>> into HashMap<String, SocketAddr>
        let overrides = self
            .dns_overrides
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, SocketAddr::new(v, 0)))
            .collect::<HashMap<String, SocketAddr>>();

        for (domain, address) in overrides {
            tracing::trace!(
                "Adding `{}->{}` to dns overrides for this request.",
                domain,
                address
            );
            client = client.resolve(domain.as_str(), address);
        }

        if let Some(proxy) = &self.proxy_address {
            tracing::trace!("Proxy set to `{}`", proxy);
            client = client.proxy(reqwest::Proxy::http(proxy).map_err(anyhow::Error::from)?);
        } else {
            tracing::trace!("No proxy defined. Using system settings.");
        }

        if let Some(timeout) = self.request_timeout {
            client = client.timeout(timeout);
        }

        let client = client.build().map_err(anyhow::Error::from)?;

        let request = command.get_http_request(&client)?;
        tracing::trace!("Request Headers: {:#?}", &request.headers());

        let response = client
            .execute(request)
            .await
            .map_err(classify_transport_error)?;

        Ok(response)
    }
}

/// Maps a transport-level failure onto the submission taxonomy.
/// A timeout can also register as a connect error, so it is checked first.
fn classify_transport_error(e: reqwest::Error) -> SubmissionError {
    if e.is_timeout() {
        tracing::error!("Submission timed out. Caused by: {}", e);
        return SubmissionError::Timeout;
    }
    if e.is_connect() {
        tracing::error!("Endpoint unreachable. Caused by: {}", e);
        return SubmissionError::Unreachable {
            reason: e.to_string(),
        };
    }
    SubmissionError::UnexpectedError(anyhow::anyhow!(
        "Unable to send command to endpoint. Caused by: {}",
        e
    ))
}
