use crate::infrastructure::connection::ConnectionSettings;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_DATA_URL: &str = "ws://localhost:8080/getData";
pub const DEFAULT_FILTERS_URL: &str = "ws://localhost:8080/getFilters";

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub feeds: FeedsConfig,
    pub connection: ConnectionConfig,
    pub presentation: PresentationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    pub data_url: String,
    pub filters_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    pub reconnect_interval_ms: u64,
    pub channel_buffer: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PresentationConfig {
    pub format: ViewFormat,
}

/// How each view update is written to stdout
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewFormat {
    Text,
    /// One JSON object per line
    Json,
}

impl DashboardConfig {
    pub fn data_settings(&self) -> ConnectionSettings {
        self.settings_for(&self.feeds.data_url)
    }

    pub fn filter_settings(&self) -> ConnectionSettings {
        self.settings_for(&self.feeds.filters_url)
    }

    fn settings_for(&self, url: &str) -> ConnectionSettings {
        ConnectionSettings::new(url)
            .with_reconnect_interval(Duration::from_millis(self.connection.reconnect_interval_ms))
            .with_channel_buffer(self.connection.channel_buffer)
    }
}

fn with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("feeds.data_url", DEFAULT_DATA_URL)?
        .set_default("feeds.filters_url", DEFAULT_FILTERS_URL)?
        .set_default("connection.reconnect_interval_ms", 5000_i64)?
        .set_default("connection.channel_buffer", 100_i64)?
        .set_default("presentation.format", "text")?)
}

/// Defaults, then `config/dashboard.*` if present, then `DASHBOARD__*` variables
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = with_defaults()?
        .add_source(File::with_name("config/dashboard").required(false))
        .add_source(Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
