//! Spawner configuration.
//!
//! A [`SpawnerConfig`] can come from defaults, a YAML file, or environment
//! variables. The spawner forwards the child-relevant settings to every
//! child through the same environment variables, so a child reads its
//! configuration with [`SpawnerConfig::from_env`].

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Log filter for child processes.
pub const ENV_LOG: &str = "HSU_MPT_LOG";

/// How long a child started with `--debug-on-start` waits for a debugger.
pub const ENV_DEBUGGER_TIMEOUT: &str = "HSU_MPT_DEBUGGER_TIMEOUT";

/// Capture child stdout/stderr through pipes (`true`/`false`).
pub const ENV_CAPTURE_OUTPUT: &str = "HSU_MPT_CAPTURE_OUTPUT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Tracing filter installed in children, e.g. `info` or `hsu_process=debug`.
    #[serde(default = "default_log_level")]
    pub child_log_level: String,

    #[serde(
        default = "default_debugger_wait_timeout",
        with = "duration_serde"
    )]
    pub debugger_wait_timeout: Duration,

    #[serde(default)]
    pub capture_output: bool,

    /// Extra environment passed to every child.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            child_log_level: default_log_level(),
            debugger_wait_timeout: default_debugger_wait_timeout(),
            capture_output: false,
            environment: BTreeMap::new(),
        }
    }
}

impl SpawnerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: SpawnerConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the `HSU_MPT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG) {
            self.child_log_level = level;
        }

        if let Some(timeout) = lookup(ENV_DEBUGGER_TIMEOUT) {
            self.debugger_wait_timeout = parse_duration(&timeout)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("Invalid {}", ENV_DEBUGGER_TIMEOUT))?;
        }

        if let Some(capture) = lookup(ENV_CAPTURE_OUTPUT) {
            self.capture_output = match capture.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(anyhow!(
                        "Invalid {}: {}, must be true or false",
                        ENV_CAPTURE_OUTPUT,
                        other
                    ))
                }
            };
        }

        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.child_log_level)
            .with_context(|| format!("Invalid child log level: {}", self.child_log_level))?;

        for key in self.environment.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(anyhow!("Invalid environment variable name: {:?}", key));
            }
        }

        Ok(())
    }

    /// Variables that carry this configuration into a child process.
    ///
    /// The reserved `HSU_MPT_*` entries come first so that explicit
    /// `environment` entries can override them.
    pub fn child_environment(&self) -> Vec<(String, String)> {
        let mut env = vec![
            (ENV_LOG.to_string(), self.child_log_level.clone()),
            (
                ENV_DEBUGGER_TIMEOUT.to_string(),
                format_duration(self.debugger_wait_timeout),
            ),
        ];
        env.extend(
            self.environment
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        env
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_debugger_wait_timeout() -> Duration {
    Duration::from_secs(60)
}

/// Formats whole seconds as `"Ns"` and anything finer as `"Nms"`.
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Parses `"250ms"`, `"30s"`, `"2m"`, `"1h"` or a bare number of seconds.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("Invalid duration: {}", s);

    // Check for "ms" BEFORE "s" since "ms" ends with 's'
    let (number, scale_millis) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        (s, 1_000)
    };

    let value: u64 = number.trim().parse().map_err(|_| invalid())?;
    value
        .checked_mul(scale_millis)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
