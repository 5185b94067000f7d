//! Gate configuration as read from a JSON file by the CLI.
//!
//! ```json
//! {
//!   "project_threshold": 50,
//!   "class_threshold": 60,
//!   "class_overrides": [
//!     { "pattern": "com/example/CachedRepository", "percent": 100 },
//!     { "pattern": ".*Generated.*", "percent": 0, "regex": true }
//!   ],
//!   "package_overrides": { "com/example/": 70, "com/": 30 },
//!   "fail_no_coverage_data": true,
//!   "report_url": "https://ci.example.com/jacoco/"
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::changes::{default_extensions, ClassNameMapper, DEFAULT_DELIMITER};
use crate::error::Result;
use crate::evaluate::NoDataPolicy;
use crate::threshold::{validate_percent, ClassPattern, Thresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassOverrideEntry {
    pub pattern: String,
    pub percent: f64,
    /// Force regex mode; an invalid pattern is then an error instead of
    /// falling back to an exact match.
    #[serde(default)]
    pub regex: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub project_threshold: f64,
    /// Global class default, used when no override matches.
    pub class_threshold: f64,
    /// Checked in order; the first match wins.
    pub class_overrides: Vec<ClassOverrideEntry>,
    pub package_overrides: BTreeMap<String, f64>,
    pub fail_no_coverage_data: bool,
    pub report_url: Option<String>,
    pub file_extensions: Vec<String>,
    pub source_delimiter: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            project_threshold: 0.0,
            class_threshold: 0.0,
            class_overrides: Vec::new(),
            package_overrides: BTreeMap::new(),
            fail_no_coverage_data: true,
            report_url: None,
            file_extensions: default_extensions(),
            source_delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl GateConfig {
    /// Compile the override tables into validated [`Thresholds`].
    pub fn thresholds(&self) -> Result<Thresholds> {
        let mut thresholds = Thresholds::new(self.class_threshold)?;
        for entry in &self.class_overrides {
            let pattern = if entry.regex {
                ClassPattern::regex(&entry.pattern)?
            } else {
                ClassPattern::from_key(&entry.pattern)
            };
            thresholds.class_overrides.push(pattern, entry.percent)?;
        }
        for (prefix, percent) in &self.package_overrides {
            thresholds
                .package_overrides
                .insert(prefix.clone(), *percent)?;
        }
        Ok(thresholds)
    }

    pub fn project_threshold(&self) -> Result<f64> {
        validate_percent(self.project_threshold, "project")
    }

    pub fn no_data_policy(&self) -> NoDataPolicy {
        NoDataPolicy::from_fail_flag(self.fail_no_coverage_data)
    }

    pub fn class_name_mapper(&self) -> Result<ClassNameMapper> {
        ClassNameMapper::new(self.file_extensions.clone(), &self.source_delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;
    use crate::threshold::ThresholdSource;

    #[test]
    fn test_defaults() {
        let config: GateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GateConfig::default());
        assert_eq!(config.no_data_policy(), NoDataPolicy::Fail);
        assert_eq!(config.file_extensions, [".kt", ".java"]);
    }

    #[test]
    fn test_full_config() {
        let config: GateConfig = serde_json::from_str(
            r#"{
                "project_threshold": 50,
                "class_threshold": 60,
                "class_overrides": [
                    { "pattern": ".*Repository", "percent": 40, "regex": true },
                    { "pattern": "com/example/CachedRepository", "percent": 100 }
                ],
                "package_overrides": { "com/example/": 70, "com/": 30 },
                "fail_no_coverage_data": false,
                "report_url": "http://test.com/"
            }"#,
        )
        .unwrap();

        assert_eq!(config.project_threshold().unwrap(), 50.0);
        assert_eq!(config.no_data_policy(), NoDataPolicy::Warn);

        let thresholds = config.thresholds().unwrap();
        let resolved = thresholds.resolve("com/example/CachedRepository");
        assert_eq!(resolved.percent, 40.0);
        assert_eq!(
            resolved.source,
            ThresholdSource::Class(".*Repository".to_string())
        );
        assert_eq!(thresholds.required("com/example/Service"), 70.0);
        assert_eq!(thresholds.required("com/other/Service"), 30.0);
        assert_eq!(thresholds.required("org/Service"), 60.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = GateConfig {
            class_overrides: vec![ClassOverrideEntry {
                pattern: "(".to_string(),
                percent: 10.0,
                regex: true,
            }],
            ..GateConfig::default()
        };
        assert!(matches!(
            config.thresholds(),
            Err(GateError::InvalidPattern { .. })
        ));

        let config = GateConfig {
            project_threshold: 150.0,
            ..GateConfig::default()
        };
        assert!(matches!(config.project_threshold(), Err(GateError::Config(_))));

        assert!(serde_json::from_str::<GateConfig>(r#"{"minimum": 1}"#).is_err());
    }
}
