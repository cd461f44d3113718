// solbridge-embed - Engine configuration
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Limits and naming for the hosted JavaScript engine.

use serde::Deserialize;

/// Default name the loaded script is reported under.
pub const DEFAULT_SCRIPT_NAME: &str = "soljson.js";

/// Configuration applied when a compiler script is loaded.
///
/// Every limit is optional; `None` keeps the engine's own default.
/// The struct deserializes from the host application's config, e.g.
///
/// ```toml
/// [solc]
/// script_name = "soljson-v0.8.9.js"
/// memory_limit = 1073741824
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub script_name: String,
    /// Heap limit in bytes.
    pub memory_limit: Option<usize>,
    /// Stack limit in bytes. Must stay below the native stack of the
    /// threads that call into the compiler.
    pub max_stack_size: Option<usize>,
    /// Allocation volume in bytes between garbage collections.
    pub gc_threshold: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            memory_limit: None,
            max_stack_size: None,
            gc_threshold: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = name.into();
        self
    }

    #[must_use]
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    #[must_use]
    pub fn max_stack_size(mut self, bytes: usize) -> Self {
        self.max_stack_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn gc_threshold(mut self, bytes: usize) -> Self {
        self.gc_threshold = Some(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_engine_limits_alone() {
        let config = EngineConfig::default();
        assert_eq!(config.script_name, "soljson.js");
        assert_eq!(config.memory_limit, None);
        assert_eq!(config.max_stack_size, None);
        assert_eq!(config.gc_threshold, None);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "memory_limit": 1048576 }"#).unwrap();
        assert_eq!(config.memory_limit, Some(1_048_576));
        assert_eq!(config.script_name, DEFAULT_SCRIPT_NAME);
    }

    #[test]
    fn builder_sets_limits() {
        let config = EngineConfig::new()
            .script_name("soljson-v0.8.9.js")
            .max_stack_size(512 * 1024)
            .gc_threshold(4096);
        assert_eq!(config.script_name, "soljson-v0.8.9.js");
        assert_eq!(config.max_stack_size, Some(512 * 1024));
        assert_eq!(config.gc_threshold, Some(4096));
    }
}
