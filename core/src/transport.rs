//! Blocking `Transport` backed by `ureq`.

use std::time::Duration;

use ureq::Agent;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

/// Executes requests with a shared `ureq::Agent`.
///
/// 4xx/5xx responses come back as data (`http_status_as_error(false)`) so
/// status interpretation stays in `GatewayClient`.
pub struct UreqTransport {
    agent: Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    /// Agent with the whole-request timeout taken from `timeout_secs`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = request;

        let result = match method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&path);
                for (key, value) in &headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&path);
                for (key, value) in &headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
