//! Command-line overrides applied on top of the file configuration.

use std::path::PathBuf;

use crate::config::schema::GatewayConfig;

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub secret: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub dump_body: Option<bool>,
    pub upstream_proxy: Option<String>,
}

impl CliOverrides {
    pub fn apply(self, config: &mut GatewayConfig) {
        if let Some(addr) = self.bind_address {
            config.listener.bind_address = addr;
        }
        if let Some(secret) = self.secret {
            config.auth.secret = Some(secret);
        }
        if let Some(path) = self.log_file {
            config.observability.log_file = Some(path);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(body) = self.dump_body {
            config.dump.body = body;
        }
        if let Some(proxy) = self.upstream_proxy {
            config.upstream.proxy_url = Some(proxy);
        }
    }
}
