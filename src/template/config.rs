//! Configuration for template matching.

use serde::{Deserialize, Serialize};

/// Template matcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Whether the literal parts of a template must match the utterance's case.
    pub case_sensitive: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_case_sensitive() {
        assert!(TemplateConfig::default().case_sensitive);

        let config: TemplateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TemplateConfig::default());
    }
}
