//! Kernel configuration
//!
//! Options are plain data with serde derives so an embedding application can
//! keep them in its own TOML configuration. Every field has a default, so an
//! empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading kernel options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read kernel options: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse kernel options: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize options
    #[error("Failed to serialize kernel options: {0}")]
    SerializeError(String),

    /// Options parsed but hold an unusable value
    #[error("Invalid kernel option {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// What dispatch does when a listener returns an error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerErrorPolicy {
    /// Run the remaining listeners, then report the first error
    #[default]
    FinishDispatch,
    /// Stop dispatching the notification at the first error
    FailFast,
}

/// Kernel options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelOptions {
    /// Nested dispatch depth after which notifications are refused
    pub max_notification_depth: usize,

    /// Listener failure policy
    pub listener_errors: ListenerErrorPolicy,

    /// Reject containment assignments that would create a cycle
    pub check_containment_cycles: bool,

    /// Register the built-in data types and root class at creation
    pub bootstrap_builtins: bool,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            max_notification_depth: 64,
            listener_errors: ListenerErrorPolicy::FinishDispatch,
            check_containment_cycles: true,
            bootstrap_builtins: true,
        }
    }
}

impl KernelOptions {
    /// Parse options from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse options from TOML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let options: KernelOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Render options as TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_notification_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_notification_depth",
                reason: "must allow at least one level of dispatch".to_string(),
            });
        }
        Ok(())
    }

    /// Set the nested dispatch limit
    pub fn with_max_notification_depth(mut self, depth: usize) -> Self {
        self.max_notification_depth = depth;
        self
    }

    /// Set the listener failure policy
    pub fn with_listener_errors(mut self, policy: ListenerErrorPolicy) -> Self {
        self.listener_errors = policy;
        self
    }

    /// Skip registration of the built-in package
    pub fn without_builtins(mut self) -> Self {
        self.bootstrap_builtins = false;
        self
    }
}
