//! The cluster commands are the only way requests to the management
//! endpoint get built.
///
/// Each command knows its REST path, HTTP method and payload; the
/// [`ManagementClient`](crate::ManagementClient) supplies the client and
/// executes the built request.
use reqwest::Method;
use url::Url;

use crate::TopologyDescriptor;

#[derive(Debug)]
pub struct ClusterCommand {
    pub base_server_url: Url,
    pub command: ClusterCommandVariant,
}

impl ClusterCommand {
    /// Returns a [`reqwest::Request`] for the specific [`ClusterCommandVariant`].
    pub fn get_http_request(&self, client: &reqwest::Client) -> anyhow::Result<reqwest::Request> {
        let request_config = RequestConfig {
            client: client.clone(),
            base_url: self.base_server_url.to_owned(),
        };

        // Handle specific command options
        let request = match &self.command {
            ClusterCommandVariant::InitiateReplicaSet { descriptor } => {
                create_initiate_replica_set_request(request_config, descriptor)?
            }
            ClusterCommandVariant::GetReplicaSetStatus { identifier } => {
                create_get_replica_set_status_request(request_config, identifier)?
            }
        };

        Ok(request)
    }
}

fn create_initiate_replica_set_request(
    config: RequestConfig,
    descriptor: &TopologyDescriptor,
) -> anyhow::Result<reqwest::Request> {
    let request = config
        .client
        .request(
            Method::POST,
            config.base_url.join("admin/replica-sets/initiate")?,
        )
        .json(descriptor)
        .build()?;
    Ok(request)
}

fn create_get_replica_set_status_request(
    config: RequestConfig,
    identifier: &str,
) -> anyhow::Result<reqwest::Request> {
    let url = config
        .base_url
        .join("admin/replica-sets/")?
        .join(format!("{}/", identifier).as_str())?
        .join("status")?;

    let request = config.client.request(Method::GET, url).build()?;

    Ok(request)
}

/// Represents all operations that can be sent to the management endpoint.
/// Contained inside a [`ClusterCommand`]. Holds all data relevant
/// to the specific command to be sent.
#[derive(Debug)]
pub enum ClusterCommandVariant {
    InitiateReplicaSet { descriptor: TopologyDescriptor },
    GetReplicaSetStatus { identifier: String },
}

#[derive(Debug)]
pub struct RequestConfig {
    client: reqwest::Client,
    base_url: Url,
}

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::{Member, TopologyDescriptor};

    use super::{ClusterCommand, ClusterCommandVariant};

    #[test]
    fn initiate_command_posts_the_descriptor_as_json() {
        // Arrange
        let descriptor = TopologyDescriptor {
            identifier: "rs-test".to_string(),
            version: 1,
            members: vec![Member {
                id: 0,
                host: "localhost:27017".to_string(),
            }],
            settings: None,
        };
        let command = ClusterCommand {
            base_server_url: Url::parse("http://localhost:8080").unwrap(),
            command: ClusterCommandVariant::InitiateReplicaSet { descriptor },
        };

        // Act
        let request = command
            .get_http_request(&reqwest::Client::new())
            .unwrap();

        // Assert
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/admin/replica-sets/initiate"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let value = serde_json::from_slice::<serde_json::Value>(body).unwrap();
        assert_eq!(value["identifier"], "rs-test");
    }

    #[test]
    fn status_command_targets_the_replica_set_by_identifier() {
        let command = ClusterCommand {
            base_server_url: Url::parse("http://localhost:8080").unwrap(),
            command: ClusterCommandVariant::GetReplicaSetStatus {
                identifier: "rs-shard-03".to_string(),
            },
        };

        let request = command
            .get_http_request(&reqwest::Client::new())
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/admin/replica-sets/rs-shard-03/status"
        );
    }
}
