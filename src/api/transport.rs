//! Network transport for dataset queries
//!
//! A transport performs exactly one round trip per `send` call and never
//! caches. Non-success responses, network failures and payloads without a
//! `result` field all surface as `DcorError::RemoteAccess`.

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tracing::debug;

use super::{take_result, Endpoint, Query};
use crate::config::ClientConfig;
use crate::error::{DcorError, Result};

/// Single-request access to one dataset endpoint
pub trait Transport: Send + Sync {
    /// Issue one query and return the payload at the `result` key
    fn send(&self, query: &Query) -> Result<Value>;

    /// Endpoint all queries are sent to
    fn endpoint(&self) -> &Endpoint;
}

/// Blocking HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Endpoint,
    credential: String,
}

impl HttpTransport {
    /// Create a transport for `endpoint` using the client settings
    pub fn new(endpoint: Endpoint, config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DcorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            credential: config.api_key.clone(),
        })
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl Transport for HttpTransport {
    fn send(&self, query: &Query) -> Result<Value> {
        let request = self
            .client
            .get(self.endpoint.url().clone())
            .query(&query.params())
            .header(AUTHORIZATION, self.credential.as_str())
            .build()
            .map_err(|e| DcorError::remote(query.target(&self.endpoint), e.to_string()))?;
        let target = request.url().to_string();

        debug!(query = %query.kind, target = %target, "Sending query");

        let response = self
            .client
            .execute(request)
            .map_err(|e| DcorError::remote(&target, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DcorError::remote(&target, status.to_string()));
        }

        let body: Value = response
            .json()
            .map_err(|e| DcorError::remote(&target, format!("invalid JSON response: {}", e)))?;

        take_result(body)
            .ok_or_else(|| DcorError::remote(&target, "malformed response: missing 'result'"))
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::QueryKind;

    #[test]
    fn test_credential_defaults_to_empty() {
        let endpoint = Endpoint::resolve("abc123", true, "example.org").unwrap();
        let transport = HttpTransport::new(endpoint, &ClientConfig::default()).unwrap();
        assert_eq!(transport.credential(), "");
    }

    #[test]
    fn test_credential_from_config() {
        let endpoint = Endpoint::resolve("abc123", true, "example.org").unwrap();
        let config = ClientConfig {
            api_key: "secret".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(endpoint.clone(), &config).unwrap();
        assert_eq!(transport.credential(), "secret");
        assert_eq!(transport.endpoint(), &endpoint);
    }

    #[test]
    fn test_unreachable_host_is_remote_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let host = format!("127.0.0.1:{}", port);
        let endpoint = Endpoint::resolve("abc123", false, &host).unwrap();
        let transport = HttpTransport::new(endpoint, &ClientConfig::local_preset(host)).unwrap();
        let err = transport.send(&Query::new(QueryKind::Size)).unwrap_err();
        assert!(matches!(err, DcorError::RemoteAccess { .. }));
    }
}
