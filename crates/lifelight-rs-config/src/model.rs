//! Configuration schema for LifeLight.

use crate::ConfigError;
use directories::UserDirs;
use lifelight_rs_protocol::ReminderTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory under the home directory holding LifeLight state and config.
pub(crate) const DEFAULT_DATA_DIR: &str = ".lifelight";
/// Default journal filename for the record store.
const DEFAULT_STORE_FILE: &str = "store.jsonl";

/// Root config for LifeLight.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LifeLightConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl LifeLightConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> LifeLightConfigBuilder {
        LifeLightConfigBuilder::new()
    }
}

/// Builder for assembling a `LifeLightConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct LifeLightConfigBuilder {
    config: LifeLightConfig,
}

impl LifeLightConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: LifeLightConfig::default(),
        }
    }

    /// Replace the record store configuration.
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Replace the reminder scheduler configuration.
    pub fn scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.config.scheduler = scheduler;
        self
    }

    /// Replace the analytics configuration.
    pub fn analytics(mut self, analytics: AnalyticsConfig) -> Self {
        self.config.analytics = analytics;
        self
    }

    /// Replace the notification bus configuration.
    pub fn notifications(mut self, notifications: NotificationsConfig) -> Self {
        self.config.notifications = notifications;
        self
    }

    /// Finalize and return the built `LifeLightConfig`.
    pub fn build(self) -> LifeLightConfig {
        self.config
    }
}

/// Record store persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Journal path; defaults to `~/.lifelight/store.jsonl`.
    #[serde(default)]
    pub path: Option<String>,
    /// Rewrite the journal as a snapshot right after opening.
    #[serde(default)]
    pub compact_on_open: bool,
}

impl StoreConfig {
    /// Resolve the journal location, falling back to the home directory.
    pub fn resolved_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.path {
            return Ok(PathBuf::from(path));
        }
        UserDirs::new()
            .map(|dirs| {
                dirs.home_dir()
                    .join(DEFAULT_DATA_DIR)
                    .join(DEFAULT_STORE_FILE)
            })
            .ok_or(ConfigError::UnresolvedPath("store path"))
    }
}

/// Reminder scheduler timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Tolerance after a reminder's time during which it may still fire.
    #[serde(default = "default_due_window_secs")]
    pub due_window_secs: u64,
    /// Optional daily health check-in prompt time.
    #[serde(default)]
    pub health_check_in: Option<ReminderTime>,
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn due_window(&self) -> Duration {
        Duration::from_secs(self.due_window_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: default_tick_interval_secs(),
            due_window_secs: default_due_window_secs(),
            health_check_in: None,
        }
    }
}

/// Windows used by derived statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Window for summary statistics, in calendar days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Window for adherence-based badges, in calendar days.
    #[serde(default = "default_adherence_window_days")]
    pub adherence_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            adherence_window_days: default_adherence_window_days(),
        }
    }
}

/// Notification bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Number of undelivered notifications buffered per subscriber.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            buffer: default_buffer(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_due_window_secs() -> u64 {
    300
}

fn default_window_days() -> u32 {
    30
}

fn default_adherence_window_days() -> u32 {
    7
}

fn default_buffer() -> usize {
    64
}
