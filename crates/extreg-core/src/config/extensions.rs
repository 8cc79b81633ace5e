//! Module search path and per-module settings configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Policy used by the resolver to order modules that become resolvable at
/// the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Catalog insertion order.
    #[default]
    Registration,
    /// Module name, independent of registration order.
    Name,
}

/// Where to find native modules and how to configure them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Base directory for relative entries in `extensions`.
    ///
    /// When empty, relative entries in `extensions` are skipped.
    #[serde(default)]
    pub extension_dir: String,
    /// Module files, absolute or relative to `extension_dir`.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Base directory for relative entries in `dynamic_extensions`.
    #[serde(default = "default_dynamic_extension_path")]
    pub dynamic_extension_path: String,
    /// Module files, absolute or relative to `dynamic_extension_path`.
    #[serde(default)]
    pub dynamic_extensions: Vec<String>,
    /// Ordering policy among simultaneously resolvable modules.
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Per-module settings, keyed by module name.
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            extension_dir: String::new(),
            extensions: Vec::new(),
            dynamic_extension_path: default_dynamic_extension_path(),
            dynamic_extensions: Vec::new(),
            tie_break: TieBreak::default(),
            settings: HashMap::new(),
        }
    }
}

impl ExtensionConfig {
    /// Returns the settings for `module`, or an empty object.
    ///
    /// Keys match module names case-insensitively; an exact-case key wins.
    pub fn settings_for(&self, module: &str) -> serde_json::Value {
        let key = module.to_lowercase();
        self.settings
            .get(module)
            .or_else(|| {
                self.settings
                    .iter()
                    .find(|(name, _)| name.to_lowercase() == key)
                    .map(|(_, value)| value)
            })
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
    }
}

fn default_dynamic_extension_path() -> String {
    ".".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_for_matches_any_case() {
        let mut config = ExtensionConfig::default();
        config
            .settings
            .insert("curl".to_string(), serde_json::json!({ "timeout": 5 }));

        assert_eq!(config.settings_for("Curl")["timeout"], 5);
        assert_eq!(config.settings_for("CURL")["timeout"], 5);
        assert_eq!(config.settings_for("zip"), serde_json::json!({}));
    }

    #[test]
    fn test_settings_for_prefers_exact_key() {
        let mut config = ExtensionConfig::default();
        config
            .settings
            .insert("pdo".to_string(), serde_json::json!({ "from": "lower" }));
        config
            .settings
            .insert("PDO".to_string(), serde_json::json!({ "from": "upper" }));

        assert_eq!(config.settings_for("PDO")["from"], "upper");
    }
}
