use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub api: ApiConfig,
    pub panel: PanelConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiConfig {
    /// Base URL of the up-down service, without a trailing slash.
    pub base_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PanelConfig {
    pub per_page: u32,
    pub poll_interval_ms: u64,
    pub refresh_delay_ms: u64,
}

impl PanelConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let base_url = env::var("PANEL_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        // The server caps per_page at 100 and ignores anything above it.
        let per_page: u32 = env::var("PANEL_PER_PAGE")
            .unwrap_or_else(|_| "20".to_string())
            .parse()?;
        let per_page = per_page.clamp(1, 100);

        let poll_interval_ms = env::var("PANEL_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()?;
        let refresh_delay_ms = env::var("PANEL_REFRESH_DELAY_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()?;

        Ok(Self {
            api: ApiConfig { base_url },
            panel: PanelConfig {
                per_page,
                poll_interval_ms,
                refresh_delay_ms,
            },
        })
    }
}
