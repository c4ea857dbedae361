//! Notifier configuration.

use serde::{Deserialize, Serialize};
use timeline_core::Result;

/// Behaviour switches for a [`TopicRegistry`](crate::TopicRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Catch listener panics and report them as failures.
    ///
    /// When disabled a panicking listener unwinds through `publish` and the
    /// remaining listeners of that publish do not run.
    pub isolate_panics: bool,

    /// Emit a `warn` event for every failed listener.
    pub log_failures: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            isolate_panics: true,
            log_failures: true,
        }
    }
}

impl NotifierConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set panic isolation.
    pub fn with_isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }

    /// Set failure logging.
    pub fn with_log_failures(mut self, log: bool) -> Self {
        self.log_failures = log;
        self
    }
}
