use std::net::SocketAddr;
use std::time::Duration;

use common_config::{env_override, ServiceConfig};
use deliveroo_setup::DEFAULT_ENDPOINT;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SetupSvcConfig {
    pub bind_address: String,
    pub port: u16,
    /// Order-history endpoint used to check tokens.
    pub api_endpoint: String,
    /// Timeout applied to the shared HTTP client. Unset keeps the client default.
    pub request_timeout_secs: Option<u64>,
    /// Open flows older than this are dropped.
    pub flow_ttl_secs: u64,
}

impl Default for SetupSvcConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8010,
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            flow_ttl_secs: 1800,
        }
    }
}

impl SetupSvcConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.port).parse()
    }

    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    pub fn flow_ttl(&self) -> Duration {
        Duration::from_secs(self.flow_ttl_secs)
    }
}

impl ServiceConfig for SetupSvcConfig {
    const PREFIX: &'static str = "SETUP_SVC_";

    fn apply_environment_overrides(&mut self, prefix: &str) {
        if let Some(bind_address) = env_override(&format!("{prefix}BIND_ADDRESS")) {
            self.bind_address = bind_address;
        }
        if let Some(port) = env_override(&format!("{prefix}PORT")) {
            self.port = port;
        }
        if let Some(endpoint) = env_override(&format!("{prefix}API_ENDPOINT")) {
            self.api_endpoint = endpoint;
        }
        if let Some(secs) = env_override(&format!("{prefix}REQUEST_TIMEOUT_SECS")) {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(secs) = env_override(&format!("{prefix}FLOW_TTL_SECS")) {
            self.flow_ttl_secs = secs;
        }
    }
}
