//! Runner configuration
//!
//! Defaults target the public computer database. A YAML file can override
//! them, and `CDB_E2E_*` environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightConfig;
use crate::target::TargetUrl;

pub const ENV_TARGET_URL: &str = "CDB_E2E_TARGET_URL";
pub const ENV_BROWSER: &str = "CDB_E2E_BROWSER";
pub const ENV_HEADLESS: &str = "CDB_E2E_HEADLESS";
pub const ENV_TIMEOUT_MS: &str = "CDB_E2E_TIMEOUT_MS";
pub const ENV_CONCURRENCY: &str = "CDB_E2E_CONCURRENCY";
pub const ENV_OUTPUT_DIR: &str = "CDB_E2E_OUTPUT_DIR";

/// Configuration for the scenario runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Application under test
    pub target: TargetUrl,

    /// Browser engine settings
    pub playwright: PlaywrightConfig,

    /// Scenarios in flight at once
    pub concurrency: usize,

    /// Extra scenario directory (None = built-in scenarios only)
    pub scenarios_dir: Option<PathBuf>,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Probe the target before running (None = skip the probe)
    pub probe_timeout_ms: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target: TargetUrl::default(),
            playwright: PlaywrightConfig::default(),
            concurrency: 1,
            scenarios_dir: None,
            output_dir: PathBuf::from("test-results"),
            probe_timeout_ms: Some(15_000),
        }
    }
}

impl RunnerConfig {
    /// Load from a YAML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `CDB_E2E_*` variables from the process environment
    pub fn with_env(self) -> E2eResult<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from<F>(mut self, lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_TARGET_URL) {
            self.target = TargetUrl::new(url)?;
        }
        if let Some(browser) = lookup(ENV_BROWSER) {
            self.playwright.browser = browser.parse()?;
        }
        if let Some(headless) = lookup(ENV_HEADLESS) {
            self.playwright.headless = parse_bool(ENV_HEADLESS, &headless)?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            self.playwright.default_timeout_ms = parse_number(ENV_TIMEOUT_MS, &timeout)?;
        }
        if let Some(concurrency) = lookup(ENV_CONCURRENCY) {
            self.concurrency = parse_number(ENV_CONCURRENCY, &concurrency)?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.concurrency == 0 {
            return Err(E2eError::Config("concurrency must be at least 1".into()));
        }
        if self.playwright.default_timeout_ms == 0 {
            return Err(E2eError::Config("default_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_bool(key: &str, value: &str) -> E2eResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::Config(format!("{}: not a boolean: {}", key, other))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> E2eResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| E2eError::Config(format!("{}: not a number: {}", key, value)))
}
