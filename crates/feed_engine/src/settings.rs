use std::time::Duration;

use feed_core::DEFAULT_STALL_THRESHOLD;
use url::Url;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(2_500);
pub const DEFAULT_BASE_URL: &str = "https://weibo.com/";

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Period of the scroll-to-bottom trigger; leaves room for network-driven loads.
    pub tick_interval: Duration,
    /// Consecutive ticks without extent growth before the session ends.
    pub stall_threshold: u32,
    /// Base for relative post links. `None` drops relative links.
    pub base_url: Option<Url>,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
            base_url: Url::parse(DEFAULT_BASE_URL).ok(),
        }
    }
}
