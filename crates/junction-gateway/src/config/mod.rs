//! Configuration for the gateway process.
//!
//! Loaded from a YAML file, with CLI/env overrides applied in `main`.
//! Rule sets are configured separately (pushed via the admin API or loaded
//! from the optional `rules_file` at startup).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gateway listener (the interception surface).
    #[serde(default)]
    pub listen: ListenConfig,
    /// Admin listener (rule-set replacement, traces, health).
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
    /// Optional rule-set document (YAML or JSON) loaded at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
    /// How many trace records the in-memory sink retains.
    #[serde(default = "default_trace_buffer")]
    pub trace_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_addr")]
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_addr")]
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Bound on one outbound call, connect to last body byte.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPoolConfig {
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default listen addr")
}

fn default_admin_addr() -> SocketAddr {
    "127.0.0.1:9090".parse().expect("valid default admin addr")
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_trace_buffer() -> usize {
    500
}

fn default_max_idle() -> usize {
    100
}

fn default_idle_timeout() -> u64 {
    90
}

fn default_keepalive_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            addr: default_listen_addr(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            addr: default_admin_addr(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_max_idle(),
            idle_timeout_secs: default_idle_timeout(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            admin: AdminConfig::default(),
            upstream: UpstreamConfig::default(),
            connection_pool: ConnectionPoolConfig::default(),
            rules_file: None,
            trace_buffer: default_trace_buffer(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upstream.timeout_secs == 0 {
            anyhow::bail!("upstream.timeout_secs must be greater than zero");
        }
        if self.listen.addr == self.admin.addr {
            anyhow::bail!(
                "listen.addr and admin.addr must differ (both set to {})",
                self.listen.addr
            );
        }
        Ok(())
    }
}
