//! Controller configuration
//!
//! Loaded from YAML or assembled with [`ControllerConfig::builder`].
//!
//! ```yaml
//! checkpoint_interval_ms: 25
//! halt_on_completion: true
//! allow_paused_export: false
//! report_extension: csv
//! max_steps: 500
//! heartbeat_interval_ms: 500
//! ```

use crate::result::{GenError, GenResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default extension appended to report paths without one
pub const DEFAULT_REPORT_EXTENSION: &str = "csv";

/// Default liveness probe interval while paused
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 500;

/// Settings that shape how the controller drives a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Pause between generation steps, in milliseconds
    pub checkpoint_interval_ms: u64,
    /// Halt the run (`Stopped`) once no targeted goal is left
    pub halt_on_completion: bool,
    /// Permit exports while the run is paused
    pub allow_paused_export: bool,
    /// Extension appended to report paths lacking one
    pub report_extension: String,
    /// Stop generating after this many steps in a session
    pub max_steps: Option<u64>,
    /// How often a paused worker probes the engine, in milliseconds
    pub heartbeat_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval_ms: 0,
            halt_on_completion: true,
            allow_paused_export: false,
            report_extension: DEFAULT_REPORT_EXTENSION.to_string(),
            max_steps: None,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    /// Create a builder for controller config
    #[must_use]
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> GenResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: &Path) -> GenResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check value constraints
    pub fn validate(&self) -> GenResult<()> {
        let ext = self.report_extension.as_str();
        if ext.is_empty() {
            return Err(GenError::config("report_extension must not be empty"));
        }
        if ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(GenError::config(format!(
                "report_extension '{ext}' must be a bare extension like 'csv'"
            )));
        }
        if self.max_steps == Some(0) {
            return Err(GenError::config("max_steps must be at least 1"));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(GenError::config("heartbeat_interval_ms must be at least 1"));
        }
        Ok(())
    }

    /// Checkpoint interval as a duration
    #[must_use]
    pub const fn checkpoint_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_interval_ms)
    }

    /// Heartbeat interval as a duration
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

/// Builder for [`ControllerConfig`]
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Pause between steps
    #[must_use]
    pub fn checkpoint_interval_ms(mut self, ms: u64) -> Self {
        self.config.checkpoint_interval_ms = ms;
        self
    }

    /// Halt automatically when nothing is left to target
    #[must_use]
    pub fn halt_on_completion(mut self, enabled: bool) -> Self {
        self.config.halt_on_completion = enabled;
        self
    }

    /// Permit exports while paused
    #[must_use]
    pub fn allow_paused_export(mut self, enabled: bool) -> Self {
        self.config.allow_paused_export = enabled;
        self
    }

    /// Default report extension
    #[must_use]
    pub fn report_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.report_extension = ext.into();
        self
    }

    /// Step budget for the session
    #[must_use]
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.config.max_steps = Some(steps);
        self
    }

    /// Liveness probe interval while paused
    #[must_use]
    pub fn heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.config.heartbeat_interval_ms = ms;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> GenResult<ControllerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert!(config.halt_on_completion);
        assert!(!config.allow_paused_export);
        assert_eq!(config.report_extension, "csv");
        assert_eq!(config.checkpoint_interval(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_fills_missing_fields_with_defaults() {
        let config = ControllerConfig::from_yaml_str("allow_paused_export: true\nmax_steps: 3\n")
            .unwrap();
        assert!(config.allow_paused_export);
        assert_eq!(config.max_steps, Some(3));
        assert_eq!(config.report_extension, "csv");
    }

    #[test]
    fn test_yaml_rejects_dotted_extension() {
        let err = ControllerConfig::from_yaml_str("report_extension: .tsv\n").unwrap_err();
        assert!(matches!(err, GenError::Config { .. }));
    }

    #[test]
    fn test_builder_rejects_zero_step_budget() {
        assert!(ControllerConfig::builder().max_steps(0).build().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goalgen.yaml");
        std::fs::write(&path, "checkpoint_interval_ms: 40\nhalt_on_completion: false\n").unwrap();

        let config = ControllerConfig::load(&path).unwrap();

        assert_eq!(config.checkpoint_interval(), Duration::from_millis(40));
        assert!(!config.halt_on_completion);
    }
}
