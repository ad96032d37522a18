use std::{collections::HashMap, fs::File, io::Read, net::IpAddr, time::Duration};

use tracing::instrument;
use url::Url;

use crate::{ManagementClient, SubmissionError};

/// Maps hostnames to fixed addresses for this client's requests. Member
/// hosts are usually compose or k8s service names, so the management
/// endpoint itself often needs the same treatment from outside the network.
pub type DnsOverrides = HashMap<String, IpAddr>;

#[derive(Debug, Default)]
pub struct ManagementClientBuilder {
    client_certificate_path: Option<String>,
    dns_overrides: Option<DnsOverrides>,
    endpoint_url: Option<String>,
    proxy_address: Option<String>,
    request_timeout: Option<Duration>,
}

impl ManagementClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dns_overrides(mut self, overrides: DnsOverrides) -> Self {
        tracing::trace!("Adding to dns_overrides: {:?}", &overrides);
        self.dns_overrides = Some(overrides);
        self
    }

    pub fn set_client_certificate(mut self, certificate_path: &str) -> Self {
        self.client_certificate_path = Some(certificate_path.to_string());
        self
    }

    pub fn set_proxy_address(mut self, proxy_address: &str) -> Self {
        self.proxy_address = Some(proxy_address.to_string());
        self
    }

    pub fn set_url(mut self, url: &str) -> Self {
        self.endpoint_url = Some(url.to_string());
        self
    }

    /// Sets a request-level timeout for the single submission call. Without
    /// one the call blocks until the endpoint answers or the connection
    /// drops; callers may also wrap the future in their own timeout.
    pub fn set_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds a [`ManagementClient`] for the configured endpoint.
    ///
    /// The builder can act as a template: each call validates the current
    /// configuration and returns a fresh client.
    #[instrument(level = "debug", name = "Build ManagementClientBuilder", skip(self))]
    pub fn build(&self) -> Result<ManagementClient, SubmissionError> {
        // Ensure an endpoint URL was supplied
        let raw_url = match &self.endpoint_url {
            Some(url) => url,
            None => {
                tracing::error!(
                    "No management endpoint URL was supplied and a client can't exist without one"
                );
                return Err(SubmissionError::MissingUrlError);
            }
        };

        let endpoint_url = validate_url(raw_url, self.client_certificate_path.is_some())?;

        let identity = match &self.client_certificate_path {
            Some(certpath) => {
                // Open and validate certificate, and create an identity from it
                let mut buf = Vec::new();
                File::open(certpath)
                    .map_err(|e| {
                        let err =
                            anyhow::anyhow!("Failed to open certificate file. Caused by: {}", e);
                        tracing::error!("{}", &err);
                        err
                    })?
                    .read_to_end(&mut buf)
                    .map_err(|e| {
                        let err =
                            anyhow::anyhow!("File was opened but unable to read. Caused by: {}", e);
                        tracing::error!("{}", err);
                        err
                    })?;
                let id = reqwest::Identity::from_pem(&buf).map_err(|e| {
                    let err = anyhow::anyhow!("Invalid pem file. Caused by: {}", e);
                    tracing::error!("{}", err);
                    err
                })?;
                Some(id)
            }
            None => None,
        };

        let client = ManagementClient::new(
            endpoint_url,
            identity,
            self.dns_overrides.clone(),
            self.proxy_address.clone(),
            self.request_timeout,
        );

        tracing::trace!("Built management client: {:?}", &client);

        Ok(client)
    }
}

/// Converts the provided URL string to a [`Url`], ensuring it is a valid
/// format and uses the scheme the configuration requires: https when a
/// client certificate is set, http otherwise.
#[instrument(level = "debug", name = "Validate URL")]
fn validate_url(url: &str, require_https: bool) -> Result<Url, SubmissionError> {
    let clean_url = Url::parse(url)
        .map_err(|e| anyhow::anyhow!("Unable to parse endpoint url `{}`. Caused by: {}", url, e))?;

    let desired_scheme = if require_https { "https" } else { "http" };

    if clean_url.scheme() != desired_scheme {
        return Err(SubmissionError::UnexpectedError(anyhow::anyhow!(
            "Url does not have correct scheme: {}",
            clean_url
        )));
    }

    Ok(clean_url)
}
