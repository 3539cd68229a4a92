use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use feed_engine::HarvestSettings;
use serde::{Deserialize, Serialize};
use url::Url;

/// Harvest options from a RON file or the command line. Unset fields keep
/// the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RunOptions {
    /// Record cap; 0 or unset harvests until the feed stalls.
    pub limit: Option<usize>,
    pub tick_ms: Option<u64>,
    pub stall_ticks: Option<u32>,
    /// Base for relative post links. An empty string drops them instead.
    pub base_url: Option<String>,
}

impl RunOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Fields set in `overrides` win.
    pub fn merged_with(self, overrides: RunOptions) -> Self {
        Self {
            limit: overrides.limit.or(self.limit),
            tick_ms: overrides.tick_ms.or(self.tick_ms),
            stall_ticks: overrides.stall_ticks.or(self.stall_ticks),
            base_url: overrides.base_url.or(self.base_url),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(0)
    }

    pub fn harvest_settings(&self) -> Result<HarvestSettings> {
        let mut settings = HarvestSettings::default();
        if let Some(ms) = self.tick_ms {
            settings.tick_interval = Duration::from_millis(ms);
        }
        if let Some(ticks) = self.stall_ticks {
            settings.stall_threshold = ticks;
        }
        if let Some(raw) = &self.base_url {
            settings.base_url = if raw.trim().is_empty() {
                None
            } else {
                Some(Url::parse(raw).with_context(|| format!("invalid base url `{raw}`"))?)
            };
        }
        Ok(settings)
    }
}
