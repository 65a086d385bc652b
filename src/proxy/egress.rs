//! Outbound connection policy.
//!
//! Destination requests go out either directly or through one configured
//! forward proxy. The clients are built once at startup and shared by every
//! exchange. A proxy URL that cannot be used is kept as `Misconfigured` so
//! the gateway still starts and each affected request fails on its own.

use std::time::Duration;

use reqwest::{redirect, Client, Proxy};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

#[derive(Debug, Clone)]
pub enum Egress {
    /// Connect straight to the destination, ignoring proxy environment variables.
    Direct(Client),
    /// Tunnel every destination connection through `proxy`.
    Upstream { client: Client, proxy: Url },
    /// The configured proxy URL was rejected.
    Misconfigured(String),
}

impl Egress {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let Some(raw) = config.proxy_url.as_deref().filter(|s| !s.trim().is_empty()) else {
            let client = builder(config).no_proxy().build()?;
            return Ok(Egress::Direct(client));
        };

        let proxy = match parse_proxy(raw) {
            Ok(proxy) => proxy,
            Err(reason) => {
                tracing::error!(proxy_url = %raw, error = %reason, "Failed to parse proxy URL");
                return Ok(Egress::Misconfigured(reason));
            }
        };

        match Proxy::all(proxy.as_str()) {
            Ok(p) => {
                let client = builder(config).proxy(p).build()?;
                tracing::info!(proxy = %proxy, "Routing destination traffic through upstream proxy");
                Ok(Egress::Upstream { client, proxy })
            }
            Err(e) => {
                tracing::error!(proxy_url = %raw, error = %e, "Failed to parse proxy URL");
                Ok(Egress::Misconfigured(e.to_string()))
            }
        }
    }

    /// Client for one exchange, or the reason the proxy setting is unusable.
    pub fn client(&self) -> Result<&Client, GatewayError> {
        match self {
            Egress::Direct(client) | Egress::Upstream { client, .. } => Ok(client),
            Egress::Misconfigured(reason) => Err(GatewayError::UpstreamProxy(reason.clone())),
        }
    }
}

fn builder(config: &UpstreamConfig) -> reqwest::ClientBuilder {
    // The client sees the destination's redirects; the gateway never follows them.
    let mut builder = Client::builder().redirect(redirect::Policy::none());
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    builder
}

fn parse_proxy(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.host_str().is_none() {
        return Err(format!("proxy URL has no host: {}", raw));
    }
    Ok(url)
}
