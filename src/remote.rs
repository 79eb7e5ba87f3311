//! Blocking HTTP transport for the Visual Genome API.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::collect::Transport;
use crate::error::VgError;

/// Sends GET requests relative to a base URL.
///
/// Non-2xx responses are not treated as failures here: the API answers
/// missing resources with a JSON body (`{"detail": "Not found."}`) that the
/// client turns into [`Lookup::NotFound`](crate::model::Lookup).
#[derive(Debug)]
pub struct HttpTransport {
    base: Url,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, VgError> {
        let base = Url::parse(base_url)
            .map_err(|source| VgError::InvalidArgument(format!("base URL '{base_url}': {source}")))?;

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        let agent: ureq::Agent = config.into();

        Ok(Self { base, agent })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, request: &str) -> Result<Url, VgError> {
        self.base.join(request).map_err(|source| VgError::Http {
            request: request.to_string(),
            message: format!("invalid request URL: {source}"),
        })
    }
}

impl Transport for HttpTransport {
    fn get_json(&mut self, request: &str) -> Result<Value, VgError> {
        let url = self.resolve(request)?;
        tracing::debug!(url = %url, "GET");

        let http_error = |message: String| VgError::Http {
            request: request.to_string(),
            message,
        };

        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|source| http_error(source.to_string()))?;

        let status = response.status();
        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|source| http_error(format!("status {status}: {source}")))
    }
}
