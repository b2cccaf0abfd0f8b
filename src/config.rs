//! Shell timing and fallback configuration
//!
//! Loaded from `config.toml` in the user's config directory; every field has
//! a default so a missing or partial file is fine.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub fallbacks: FallbackConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    #[serde(default = "default_debounce_window_ms")]
    pub window_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default = "default_intent_window_secs")]
    pub window_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_hard_timeout_secs")]
    pub hard_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    #[serde(default = "default_fast_interval_ms")]
    pub fast_interval_ms: u64,
    #[serde(default = "default_fast_ticks")]
    pub fast_ticks: u32,
    #[serde(default = "default_slow_interval_ms")]
    pub slow_interval_ms: u64,
}

/// Degradation paths used when a sub-application lacks a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Use the frame's stored `view` when the app exposes no live view
    #[serde(default = "default_true")]
    pub stored_view_root_check: bool,
    /// Reset the shell's frame when the app has no return-to-root handler
    #[serde(default = "default_true")]
    pub generic_root_reset: bool,
}

fn default_debounce_window_ms() -> u64 {
    300
}

fn default_intent_window_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_poll_attempts() -> u32 {
    10
}

fn default_hard_timeout_secs() -> u64 {
    15
}

fn default_fast_interval_ms() -> u64 {
    500
}

fn default_fast_ticks() -> u32 {
    10
}

fn default_slow_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_ms: default_debounce_window_ms(),
        }
    }
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            window_secs: default_intent_window_secs(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            hard_timeout_secs: default_hard_timeout_secs(),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            fast_interval_ms: default_fast_interval_ms(),
            fast_ticks: default_fast_ticks(),
            slow_interval_ms: default_slow_interval_ms(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            stored_view_root_check: true,
            generic_root_reset: true,
        }
    }
}

impl DebounceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl IntentConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl LoaderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn hard_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }

    /// Total time the readiness poll may take on its own
    pub fn polling_budget(&self) -> Duration {
        self.poll_interval() * self.max_poll_attempts
    }
}

impl ReconcilerConfig {
    pub fn fast_interval(&self) -> Duration {
        Duration::from_millis(self.fast_interval_ms)
    }

    pub fn slow_interval(&self) -> Duration {
        Duration::from_millis(self.slow_interval_ms)
    }

    /// Delay before tick number `tick` (zero-based) of a fresh loop
    pub fn interval_for_tick(&self, tick: u32) -> Duration {
        if tick < self.fast_ticks {
            self.fast_interval()
        } else {
            self.slow_interval()
        }
    }
}

impl ShellConfig {
    pub fn builder() -> ShellConfigBuilder {
        ShellConfigBuilder::new()
    }

    /// Short windows everywhere; for demos and snappy hosts
    pub fn responsive() -> Self {
        Self {
            debounce: DebounceConfig { window_ms: 250 },
            intent: IntentConfig::default(),
            loader: LoaderConfig {
                poll_interval_ms: 250,
                max_poll_attempts: 20,
                hard_timeout_secs: 15,
            },
            reconciler: ReconcilerConfig {
                fast_interval_ms: 250,
                fast_ticks: 20,
                slow_interval_ms: 500,
            },
            fallbacks: FallbackConfig::default(),
        }
    }

    /// Lower polling cost for slow or battery-bound hosts
    pub fn relaxed() -> Self {
        Self {
            debounce: DebounceConfig { window_ms: 500 },
            intent: IntentConfig::default(),
            loader: LoaderConfig {
                poll_interval_ms: 500,
                max_poll_attempts: 5,
                hard_timeout_secs: 12,
            },
            reconciler: ReconcilerConfig {
                fast_interval_ms: 1000,
                fast_ticks: 5,
                slow_interval_ms: 2000,
            },
            fallbacks: FallbackConfig::default(),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("phone-shell")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".phone-shell")
        };
        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, or defaults if the file is absent
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        debug!("Loading shell config from: {:?}", path);

        if !path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
                info!("Created config directory: {:?}", dir);
            }
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        info!("Config saved to {:?}", path);
        Ok(())
    }
}

#[derive(Debug)]
pub struct ShellConfigBuilder {
    config: ShellConfig,
}

impl ShellConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ShellConfig::default(),
        }
    }

    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.config.debounce.window_ms = window.as_millis() as u64;
        self
    }

    pub fn intent_window(mut self, window: Duration) -> Self {
        self.config.intent.window_secs = window.as_secs();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.loader.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.config.loader.max_poll_attempts = attempts;
        self
    }

    pub fn hard_timeout(mut self, timeout: Duration) -> Self {
        self.config.loader.hard_timeout_secs = timeout.as_secs();
        self
    }

    pub fn reconcile_intervals(mut self, fast: Duration, fast_ticks: u32, slow: Duration) -> Self {
        self.config.reconciler = ReconcilerConfig {
            fast_interval_ms: fast.as_millis() as u64,
            fast_ticks,
            slow_interval_ms: slow.as_millis() as u64,
        };
        self
    }

    pub fn stored_view_root_check(mut self, enabled: bool) -> Self {
        self.config.fallbacks.stored_view_root_check = enabled;
        self
    }

    pub fn generic_root_reset(mut self, enabled: bool) -> Self {
        self.config.fallbacks.generic_root_reset = enabled;
        self
    }

    pub fn build(self) -> ShellConfig {
        self.config
    }
}

impl Default for ShellConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShellConfig::default();

        assert_eq!(config.debounce.window(), Duration::from_millis(300));
        assert_eq!(config.intent.window(), Duration::from_secs(30));
        assert_eq!(config.loader.polling_budget(), Duration::from_secs(5));
        assert_eq!(config.loader.hard_timeout(), Duration::from_secs(15));
        assert!(config.fallbacks.stored_view_root_check);
        assert!(config.fallbacks.generic_root_reset);
    }

    #[test]
    fn test_hard_timeout_outlasts_polling_budget() {
        for config in [ShellConfig::default(), ShellConfig::responsive(), ShellConfig::relaxed()] {
            assert!(config.loader.hard_timeout() > config.loader.polling_budget());
        }
    }

    #[test]
    fn test_interval_relaxes_after_fast_ticks() {
        let reconciler = ReconcilerConfig::default();
        assert_eq!(reconciler.interval_for_tick(0), Duration::from_millis(500));
        assert_eq!(reconciler.interval_for_tick(9), Duration::from_millis(500));
        assert_eq!(reconciler.interval_for_tick(10), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ShellConfig::from_toml(
            r#"
            [loader]
            max_poll_attempts = 4

            [fallbacks]
            generic_root_reset = false
            "#,
        )
        .unwrap();

        assert_eq!(config.loader.max_poll_attempts, 4);
        assert_eq!(config.loader.poll_interval_ms, 500);
        assert!(!config.fallbacks.generic_root_reset);
        assert!(config.fallbacks.stored_view_root_check);
        assert_eq!(config.debounce.window_ms, 300);
    }

    #[test]
    fn test_builder_pattern() {
        let config = ShellConfig::builder()
            .debounce_window(Duration::from_millis(400))
            .max_poll_attempts(3)
            .stored_view_root_check(false)
            .build();

        assert_eq!(config.debounce.window_ms, 400);
        assert_eq!(config.loader.max_poll_attempts, 3);
        assert!(!config.fallbacks.stored_view_root_check);
    }

    #[test]
    fn test_toml_round_trip_preserves_values() {
        let config = ShellConfig::relaxed();
        let text = config.to_toml().unwrap();
        assert_eq!(ShellConfig::from_toml(&text).unwrap(), config);
    }
}
