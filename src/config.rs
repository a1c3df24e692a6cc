use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

/// How the call router reaches the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Invoke the in-process registry.
    Direct,
    /// POST envelopes to a remote dispatcher.
    Http,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub call_mode: CallMode,
    pub rpc_endpoint: String,
    pub rpc_timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("RPC_CALL_MODE must be one of: direct, http")]
    InvalidCallMode,
    #[error("RPC_ENDPOINT must be an http(s) URL")]
    InvalidEndpoint,
    #[error("RPC_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = non_empty("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let call_mode = match non_empty("RPC_CALL_MODE")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("direct") => CallMode::Direct,
            Some("http") => CallMode::Http,
            _ => return Err(ConfigError::InvalidCallMode),
        };

        let rpc_endpoint = non_empty("RPC_ENDPOINT")
            .unwrap_or_else(|| format!("http://{bind_addr}:{bind_port}/rpc"));
        if !(rpc_endpoint.starts_with("http://") || rpc_endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint);
        }

        let rpc_timeout = non_empty("RPC_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?;

        let config = Self {
            bind_addr,
            bind_port,
            call_mode,
            rpc_endpoint,
            rpc_timeout,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
