//! HTTP implementation of the write transport

use std::time::Duration;

use url::Url;

use chargepanel_core::prelude::*;

use crate::transport::{Transport, WriteFailure, WriteResult};

/// Writes device resources with JSON PUT requests
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    /// `None` waits for the transport to report success or failure
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a transport for the device at `base`
    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base, timeout))
    }

    /// Create a transport sharing an existing client (e.g. with the push feed)
    pub fn with_client(client: reqwest::Client, base: Url, timeout: Option<Duration>) -> Self {
        Self {
            client,
            base: directory_url(base),
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a resource path against the device URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| Error::invalid_url(format!("{}{}", self.base, path)))
    }
}

impl Transport for HttpTransport {
    async fn put(&self, path: &str, payload: serde_json::Value) -> WriteResult {
        let url = self
            .endpoint(path)
            .map_err(|e| WriteFailure::network(e.to_string()))?;

        debug!("PUT {}", url);

        let mut request = self.client.put(url.clone()).json(&payload);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            warn!("PUT {} failed: {}", url, e);
            WriteFailure::network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!("PUT {} rejected with {}: {}", url, status, body);
        Err(WriteFailure::from_status(
            status.as_u16(),
            status.canonical_reason().unwrap_or("error"),
            body,
        ))
    }
}

/// Make `url` usable as a base for relative joins
///
/// `Url::join` replaces the last path segment unless the path ends in `/`,
/// so `http://host/panel` must become `http://host/panel/`.
pub(crate) fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::with_client(reqwest::Client::new(), Url::parse(base).unwrap(), None)
    }

    #[test]
    fn test_endpoint_from_bare_host() {
        let transport = transport("http://192.168.0.10");
        assert_eq!(
            transport.endpoint("charge_manager/config_update").unwrap().as_str(),
            "http://192.168.0.10/charge_manager/config_update"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let transport = transport("http://proxy.local/warp");
        assert_eq!(
            transport.endpoint("/reboot").unwrap().as_str(),
            "http://proxy.local/warp/reboot"
        );
    }

    #[test]
    fn test_directory_url_is_idempotent() {
        let url = directory_url(Url::parse("http://host/a/").unwrap());
        assert_eq!(url.as_str(), "http://host/a/");
    }
}
