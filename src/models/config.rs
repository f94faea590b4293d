//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Category;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Cycle cadence, freshness window, and HTTP client behavior
    #[serde(default)]
    pub sync: SyncConfig,

    /// Upstream catalog endpoints
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Loanable-copy filter rules
    #[serde(default)]
    pub copies: CopyFilterConfig,

    /// Branches eligible for availability alerts
    #[serde(default = "defaults::locations")]
    pub locations: Vec<Location>,

    /// Outbound alert delivery settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Calendar expressions for the two scheduled cycles
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply environment-variable overrides on top of the loaded file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.notifier.webhook_url = Some(url);
        }
        if let Some(secs) = get("NOTIFY_COOLDOWN_SECS").and_then(|v| v.parse().ok()) {
            self.sync.notify_cooldown_secs = secs;
        }
        if let Some(cron) = get("AVAILABLE_NOW_CRON") {
            self.schedule.available_now = cron;
        }
        if let Some(cron) = get("ON_ORDER_CRON") {
            self.schedule.on_order = cron;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.sync.user_agent.trim().is_empty() {
            return Err(AppError::config("sync.user_agent is empty"));
        }
        if self.sync.timeout_secs == 0 {
            return Err(AppError::config("sync.timeout_secs must be > 0"));
        }
        if self.sync.freshness_window_secs == 0 {
            return Err(AppError::config("sync.freshness_window_secs must be > 0"));
        }
        for search_url in [
            &self.upstream.available_now_url,
            &self.upstream.on_order_url,
        ] {
            if let Err(e) = url::Url::parse(search_url) {
                return Err(AppError::config(format!(
                    "invalid upstream search URL '{search_url}': {e}"
                )));
            }
        }
        if !self.upstream.record_url_template.contains("{id}")
            || !self.upstream.availability_url_template.contains("{id}")
        {
            return Err(AppError::config(
                "upstream URL templates must contain an {id} placeholder",
            ));
        }
        if self.locations.is_empty() {
            return Err(AppError::config("No locations defined"));
        }
        if self.schedule.available_now.trim().is_empty()
            || self.schedule.on_order.trim().is_empty()
        {
            return Err(AppError::config("schedule expressions must not be empty"));
        }
        Ok(())
    }

    /// Look up a branch by its upstream display name.
    pub fn find_location(&self, branch_name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == branch_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            upstream: UpstreamConfig::default(),
            copies: CopyFilterConfig::default(),
            locations: defaults::locations(),
            notifier: NotifierConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
        }
    }
}

/// Cycle cadence, freshness window, and HTTP client behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum age before an unseen item is purged, in seconds
    #[serde(default = "defaults::freshness_window")]
    pub freshness_window_secs: u64,

    /// Minimum interval between repeat alerts for the same item/branch pair,
    /// in seconds
    #[serde(default = "defaults::notify_cooldown")]
    pub notify_cooldown_secs: u64,
}

impl SyncConfig {
    pub fn freshness_window(&self) -> TimeDelta {
        TimeDelta::seconds(self.freshness_window_secs as i64)
    }

    pub fn notify_cooldown(&self) -> TimeDelta {
        TimeDelta::seconds(self.notify_cooldown_secs as i64)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            freshness_window_secs: defaults::freshness_window(),
            notify_cooldown_secs: defaults::notify_cooldown(),
        }
    }
}

/// Upstream catalog endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Search URL for the available-now listing
    #[serde(default = "defaults::available_now_url")]
    pub available_now_url: String,

    /// Search URL for the on-order listing
    #[serde(default = "defaults::on_order_url")]
    pub on_order_url: String,

    /// CSS selector for the embedded JSON payload in the search page
    #[serde(default = "defaults::script_selector")]
    pub script_selector: String,

    /// Record page URL template; `{id}` is replaced with the item id
    #[serde(default = "defaults::record_url_template")]
    pub record_url_template: String,

    /// Availability endpoint URL template; `{id}` is replaced with the item id
    #[serde(default = "defaults::availability_url_template")]
    pub availability_url_template: String,
}

impl UpstreamConfig {
    /// The search URL for one category.
    pub fn search_url(&self, category: Category) -> &str {
        match category {
            Category::AvailableNow => &self.available_now_url,
            Category::OnOrder => &self.on_order_url,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            available_now_url: defaults::available_now_url(),
            on_order_url: defaults::on_order_url(),
            script_selector: defaults::script_selector(),
            record_url_template: defaults::record_url_template(),
            availability_url_template: defaults::availability_url_template(),
        }
    }
}

/// Rules deciding whether a physical copy counts as loanable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFilterConfig {
    /// Availability status a copy must report
    #[serde(default = "defaults::available_status")]
    pub available_status: String,

    /// Collection-name suffix identifying circulating (walk-in) copies
    #[serde(default = "defaults::circulating_suffix")]
    pub circulating_suffix: String,

    /// Call-number prefixes to exclude (formats the user cannot play)
    #[serde(default = "defaults::excluded_call_prefixes")]
    pub excluded_call_prefixes: Vec<String>,
}

impl Default for CopyFilterConfig {
    fn default() -> Self {
        Self {
            available_status: defaults::available_status(),
            circulating_suffix: defaults::circulating_suffix(),
            excluded_call_prefixes: defaults::excluded_call_prefixes(),
        }
    }
}

/// A branch eligible for availability alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// Upstream branch code
    pub code: u32,

    /// Branch display name, as reported by the availability endpoint
    pub name: String,
}

/// Outbound alert delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifierConfig {
    /// Webhook URL to POST alert messages to; alerts are skipped when unset
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Calendar expressions for the two scheduled cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Cron expression for available-now cycles
    #[serde(default = "defaults::available_now_cron")]
    pub available_now: String,

    /// Cron expression for on-order cycles
    #[serde(default = "defaults::on_order_cron")]
    pub on_order: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            available_now: defaults::available_now_cron(),
            on_order: defaults::on_order_cron(),
        }
    }
}

mod defaults {
    use super::Location;

    // Server defaults
    pub fn port() -> u16 {
        8008
    }

    // Sync defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; shelfwatch/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn freshness_window() -> u64 {
        7 * 24 * 60 * 60
    }
    pub fn notify_cooldown() -> u64 {
        24 * 60 * 60
    }

    // Upstream defaults (WCCLS BiblioCommons)
    pub fn available_now_url() -> String {
        "https://wccls.bibliocommons.com/v2/search?custom_edit=false&query=collection%3A%22Best%20Sellers%22%20formatcode%3A(BLURAY%20)&searchType=bl&suppress=true&locked=true&f_STATUS=9%7C39%7C29%7C31&f_NEWLY_ACQUIRED=PAST_180_DAYS".into()
    }
    pub fn on_order_url() -> String {
        "https://wccls.bibliocommons.com/v2/search?query=nw%3A%5B0%20TO%20180%5D&searchType=bl&sort=NEWLY_ACQUIRED&suppress=true&title_key=all_newly_acquired&f_FORMAT=BLURAY&f_ON_ORDER=true&f_NEWLY_ACQUIRED=PAST_7_DAYS".into()
    }
    pub fn script_selector() -> String {
        r#"script[type="application/json"][data-iso-key="_0"]"#.into()
    }
    pub fn record_url_template() -> String {
        "https://wccls.bibliocommons.com/v2/record/{id}".into()
    }
    pub fn availability_url_template() -> String {
        "https://gateway.bibliocommons.com/v2/libraries/wccls/bibs/{id}/availability?locale=en-US"
            .into()
    }

    // Copy filter defaults
    pub fn available_status() -> String {
        "AVAILABLE".into()
    }
    pub fn circulating_suffix() -> String {
        "Not Holdable".into()
    }
    pub fn excluded_call_prefixes() -> Vec<String> {
        vec!["4K".into()]
    }

    // Location defaults
    pub fn locations() -> Vec<Location> {
        vec![
            Location {
                code: 9,
                name: "Beaverton City Library".to_string(),
            },
            Location {
                code: 29,
                name: "Tigard Public Library".to_string(),
            },
            Location {
                code: 31,
                name: "Tualatin Public Library".to_string(),
            },
            Location {
                code: 39,
                name: "Beaverton Murray Scholls".to_string(),
            },
        ]
    }

    // Schedule defaults: every 15 minutes from 10:00 to 18:00 for
    // available-now, noon and 18:00 for on-order (seconds field first).
    pub fn available_now_cron() -> String {
        "0 0,15,30,45 10-18 * * *".into()
    }
    pub fn on_order_cron() -> String {
        "0 0 12,18 * * *".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.sync.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_search_url() {
        let mut config = Config::default();
        config.upstream.on_order_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.upstream.availability_url_template = "https://example.com/availability".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_locations() {
        let mut config = Config::default();
        config.locations.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_locations_include_tigard() {
        let config = Config::default();
        let tigard = config.find_location("Tigard Public Library").unwrap();
        assert_eq!(tigard.code, 29);
        assert!(config.find_location("Nowhere Branch").is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "PORT" => Some("9090".to_string()),
            "WEBHOOK_URL" => Some("https://hooks.example.com/x".to_string()),
            "NOTIFY_COOLDOWN_SECS" => Some("3600".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://hooks.example.com/x")
        );
        assert_eq!(config.sync.notify_cooldown_secs, 3600);
        // Untouched knobs keep their defaults.
        assert_eq!(config.schedule.on_order, "0 0 12,18 * * *");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [sync]
            notify_cooldown_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.sync.notify_cooldown_secs, 60);
        assert_eq!(config.sync.timeout_secs, 30);
        assert_eq!(config.locations.len(), 4);
        assert!(config.upstream.script_selector.contains("data-iso-key"));
    }
}
