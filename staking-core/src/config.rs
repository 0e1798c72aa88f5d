use crate::dto::ChainFamily;
use crate::error::Result;
use crate::monitor::MonitorConfig;
use crate::network::{default_networks, ApiEndpoints, NetworkDescriptor};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "App.toml";

#[derive(Clone, Debug, Deserialize)]
pub struct StakingConfig {
    pub rust_log: String,
    pub core_log: String,
    pub transaction_service_url: String,
    pub transaction_service_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub monitor_initial_delay_secs: Option<u64>,
    pub monitor_poll_interval_secs: Option<u64>,
    pub monitor_max_poll_interval_secs: Option<u64>,
    pub monitor_backoff_multiplier: Option<f64>,
    pub monitor_max_attempts: Option<u32>,
    pub monitor_deadline_secs: Option<u64>,
    #[serde(default)]
    pub networks: Vec<NetworkDescriptor>,
    #[serde(default)]
    pub endpoints: HashMap<ChainFamily, ApiEndpoints>,
}

impl StakingConfig {
    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("STAKING_"))
    }

    pub fn load(path: &str) -> Result<StakingConfig> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let defaults = MonitorConfig::default();
        let secs = |value: Option<u64>, default: Duration| match value {
            Some(v) => Duration::from_secs(v),
            None => default,
        };
        MonitorConfig {
            initial_delay: secs(self.monitor_initial_delay_secs, defaults.initial_delay),
            poll_interval: secs(self.monitor_poll_interval_secs, defaults.poll_interval),
            max_poll_interval: secs(
                self.monitor_max_poll_interval_secs,
                defaults.max_poll_interval,
            ),
            backoff_multiplier: self
                .monitor_backoff_multiplier
                .unwrap_or(defaults.backoff_multiplier),
            max_attempts: self.monitor_max_attempts.unwrap_or(defaults.max_attempts),
            deadline: secs(self.monitor_deadline_secs, defaults.deadline),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(match self.request_timeout_secs {
            Some(v) => v,
            None => 30,
        })
    }

    /// Configured networks, or the built-in table when none are listed.
    pub fn network_table(&self) -> Vec<NetworkDescriptor> {
        if self.networks.is_empty() {
            default_networks()
        } else {
            self.networks.clone()
        }
    }
}
