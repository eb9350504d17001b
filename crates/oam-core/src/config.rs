use serde::Deserialize;

use crate::error::ConfigError;
use crate::merge::MergeStrategy;

/// Top-level project configuration loaded from `.oam.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OamConfig {
    /// Dot-delimited namespace the generated code lives in, e.g. `My.App`.
    pub namespace: Option<String>,
    pub merge: MergeConfig,
    pub validation: ValidationConfig,
    pub resolve: ResolveOptions,
    /// Identifiers treated as reserved on top of the built-in set.
    pub reserved_names: Vec<String>,
}

impl OamConfig {
    /// Parse a config from YAML text. Missing keys take their defaults.
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        let config: OamConfig = serde_yaml_ng::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if let Some(ref ns) = self.namespace {
            let valid = ns.split('.').all(|seg| {
                !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_')
            });
            if !valid {
                return Err(ConfigError::InvalidNamespace(ns.clone()));
            }
        }
        Ok(())
    }
}

/// How part documents are combined with the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub strategy: MergeStrategy,
}

/// Which validation rules run and how names are checked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run the opt-in stylistic rules in addition to the standard ones.
    pub strict_mode: bool,
    /// Check deprecated operations too.
    pub include_deprecated: bool,
    pub naming: NamingPolicies,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_deprecated: true,
            naming: NamingPolicies::default(),
        }
    }
}

impl ValidationConfig {
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ValidationMode {
        if self.strict_mode {
            ValidationMode::Strict
        } else {
            ValidationMode::Standard
        }
    }
}

/// Standard runs the core rule set; Strict adds the stylistic rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Standard,
    Strict,
}

/// Casing policy per kind of name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NamingPolicies {
    pub operation_id: CasingPolicy,
    pub schema: CasingPolicy,
    pub property: CasingPolicy,
    pub parameter: CasingPolicy,
    pub enum_value: CasingPolicy,
}

impl Default for NamingPolicies {
    fn default() -> Self {
        Self {
            operation_id: CasingPolicy::CamelCase,
            schema: CasingPolicy::PascalCase,
            property: CasingPolicy::CamelCase,
            parameter: CasingPolicy::CamelCase,
            enum_value: CasingPolicy::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasingPolicy {
    CamelCase,
    PascalCase,
    SnakeCase,
    KebabCase,
    ScreamingSnakeCase,
    /// No check.
    Any,
}

impl CasingPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            CasingPolicy::CamelCase => "camelCase",
            CasingPolicy::PascalCase => "PascalCase",
            CasingPolicy::SnakeCase => "snake_case",
            CasingPolicy::KebabCase => "kebab-case",
            CasingPolicy::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
            CasingPolicy::Any => "any",
        }
    }
}

/// Schema resolution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Emit an Info diagnostic when a format hint is not recognized.
    pub report_unknown_formats: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            report_unknown_formats: true,
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oam.yaml";

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oam configuration
# namespace: My.App        # target namespace used to qualify conflicting schema names

merge:
  strategy: error_on_duplicate  # error_on_duplicate | merge_if_identical | append_unique | first_wins | last_wins

validation:
  strict_mode: false
  include_deprecated: true
  naming:
    operation_id: camel_case    # camel_case | pascal_case | snake_case | kebab_case | screaming_snake_case | any
    schema: pascal_case
    property: camel_case
    parameter: camel_case
    enum_value: any

resolve:
  report_unknown_formats: true

reserved_names: []
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OamConfig::default();
        assert_eq!(config.namespace, None);
        assert_eq!(config.merge.strategy, MergeStrategy::ErrorOnDuplicate);
        assert!(!config.validation.strict_mode);
        assert!(config.validation.include_deprecated);
        assert_eq!(config.validation.mode(), ValidationMode::Standard);
        assert_eq!(config.validation.naming.operation_id, CasingPolicy::CamelCase);
        assert!(config.resolve.report_unknown_formats);
        assert!(config.reserved_names.is_empty());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
namespace: My.App
merge:
  strategy: last_wins
validation:
  strict_mode: true
  include_deprecated: false
  naming:
    operation_id: snake_case
    enum_value: screaming_snake_case
resolve:
  report_unknown_formats: false
reserved_names: [Widget]
"#;
        let config = OamConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.namespace.as_deref(), Some("My.App"));
        assert_eq!(config.merge.strategy, MergeStrategy::LastWins);
        assert_eq!(config.validation.mode(), ValidationMode::Strict);
        assert!(!config.validation.include_deprecated);
        assert_eq!(config.validation.naming.operation_id, CasingPolicy::SnakeCase);
        // Unset policies keep their defaults
        assert_eq!(config.validation.naming.schema, CasingPolicy::PascalCase);
        assert_eq!(
            config.validation.naming.enum_value,
            CasingPolicy::ScreamingSnakeCase
        );
        assert!(!config.resolve.report_unknown_formats);
        assert_eq!(config.reserved_names, vec!["Widget".to_string()]);
    }

    #[test]
    fn test_default_content_parses() {
        let config = OamConfig::from_yaml(default_config_content()).unwrap();
        assert_eq!(config, OamConfig::default());
    }

    #[test]
    fn test_rejects_bad_namespace() {
        let err = OamConfig::from_yaml("namespace: My..App\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNamespace(_)));
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(OamConfig::from_yaml("merge:\n  strategy: newest\n").is_err());
    }
}
