//! Resolution of the required coverage percentage for a class.
//!
//! Precedence, first hit wins:
//!   1. class overrides, in insertion order (exact name or regex),
//!   2. package overrides, longest matching `/`-terminated prefix,
//!   3. the global default.

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use crate::error::{GateError, Result};

/// Key of a class override.
#[derive(Debug, Clone)]
pub enum ClassPattern {
    /// Matches a class name verbatim.
    Exact(String),
    /// Matches a class name verbatim or anywhere as a regular expression.
    Regex(Regex),
}

impl ClassPattern {
    pub fn exact(name: impl Into<String>) -> Self {
        ClassPattern::Exact(name.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(ClassPattern::Regex)
            .map_err(|source| GateError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Interpret a configuration key: regex when it compiles, exact name
    /// otherwise. A plain class path such as `com/example/Foo` compiles too
    /// and still matches itself verbatim.
    pub fn from_key(key: &str) -> Self {
        match Regex::new(key) {
            Ok(re) => ClassPattern::Regex(re),
            Err(_) => ClassPattern::Exact(key.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClassPattern::Exact(s) => s,
            ClassPattern::Regex(re) => re.as_str(),
        }
    }

    #[must_use]
    pub fn matches(&self, class_name: &str) -> bool {
        match self {
            ClassPattern::Exact(s) => s == class_name,
            ClassPattern::Regex(re) => re.as_str() == class_name || re.is_match(class_name),
        }
    }
}

/// Ordered class-level overrides. Order is the tie-break when several
/// patterns match the same class.
#[derive(Debug, Clone, Default)]
pub struct ClassOverrides {
    entries: Vec<(ClassPattern, f64)>,
}

impl ClassOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: ClassPattern, percent: f64) -> Result<()> {
        let percent = validate_percent(percent, pattern.as_str())?;
        self.entries.push((pattern, percent));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All overrides matching `class_name`, in insertion order.
    pub fn matching<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = (&'a ClassPattern, f64)> + 'a {
        self.entries
            .iter()
            .filter(move |(pattern, _)| pattern.matches(class_name))
            .map(|(pattern, percent)| (pattern, *percent))
    }
}

/// Package-level overrides keyed by `/`-terminated prefix, e.g. `com/example/`.
#[derive(Debug, Clone, Default)]
pub struct PackageOverrides {
    prefixes: HashMap<String, f64>,
}

impl PackageOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prefix: impl Into<String>, percent: f64) -> Result<()> {
        let prefix = prefix.into();
        let percent = validate_percent(percent, &prefix)?;
        self.prefixes.insert(prefix, percent);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Longest configured prefix of `class_name`.
    ///
    /// Candidates are produced by dropping one trailing path segment at a
    /// time: `com/example/Foo` tries `com/example/`, then `com/`, then the
    /// empty prefix.
    pub fn longest_match<'a>(&self, class_name: &'a str) -> Option<(&'a str, f64)> {
        class_name
            .rmatch_indices('/')
            .map(|(i, _)| &class_name[..=i])
            .chain(std::iter::once(""))
            .find_map(|prefix| self.prefixes.get(prefix).map(|p| (prefix, *p)))
    }
}

/// Which rule supplied a required percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum ThresholdSource {
    Class(String),
    Package(String),
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub percent: f64,
    pub source: ThresholdSource,
}

/// Full threshold configuration for class evaluation.
#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    pub class_overrides: ClassOverrides,
    pub package_overrides: PackageOverrides,
    pub default: f64,
}

impl Thresholds {
    pub fn new(default: f64) -> Result<Self> {
        Ok(Self {
            default: validate_percent(default, "class default")?,
            ..Self::default()
        })
    }

    /// Required percentage for `class_name`, with its source.
    pub fn resolve(&self, class_name: &str) -> Resolved {
        let mut matches = self.class_overrides.matching(class_name);
        if let Some((pattern, percent)) = matches.next() {
            let extra: Vec<&str> = matches.map(|(p, _)| p.as_str()).collect();
            if !extra.is_empty() {
                tracing::warn!(
                    class = class_name,
                    chosen = pattern.as_str(),
                    ignored = ?extra,
                    "several class overrides match; using the first"
                );
            }
            return Resolved {
                percent,
                source: ThresholdSource::Class(pattern.as_str().to_string()),
            };
        }

        if let Some((prefix, percent)) = self.package_overrides.longest_match(class_name) {
            return Resolved {
                percent,
                source: ThresholdSource::Package(prefix.to_string()),
            };
        }

        Resolved {
            percent: self.default,
            source: ThresholdSource::Default,
        }
    }

    #[must_use]
    pub fn required(&self, class_name: &str) -> f64 {
        self.resolve(class_name).percent
    }
}

/// Reject percentages outside `0..=100` (and NaN).
pub fn validate_percent(percent: f64, what: &str) -> Result<f64> {
    if (0.0..=100.0).contains(&percent) {
        Ok(percent)
    } else {
        Err(GateError::Config(format!(
            "threshold for '{what}' must be between 0 and 100, got {percent}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages(entries: &[(&str, f64)]) -> PackageOverrides {
        let mut overrides = PackageOverrides::new();
        for (prefix, percent) in entries {
            overrides.insert(*prefix, *percent).unwrap();
        }
        overrides
    }

    #[test]
    fn test_longest_prefix_wins() {
        let thresholds = Thresholds {
            package_overrides: packages(&[("com/", 30.0), ("com/example/", 70.0)]),
            ..Thresholds::default()
        };
        assert_eq!(thresholds.required("com/example/Foo"), 70.0);

        // Insertion order must not matter.
        let thresholds = Thresholds {
            package_overrides: packages(&[("com/example/", 70.0), ("com/", 90.0)]),
            ..Thresholds::default()
        };
        assert_eq!(thresholds.required("com/example/Foo"), 70.0);
        assert_eq!(thresholds.required("com/other/Bar"), 90.0);
    }

    #[test]
    fn test_package_prefix_must_end_on_segment() {
        let overrides = packages(&[("com/exam", 10.0), ("com/example", 20.0)]);
        assert_eq!(overrides.longest_match("com/example/Foo"), None);
    }

    #[test]
    fn test_empty_prefix_is_last_candidate() {
        let overrides = packages(&[("", 15.0)]);
        assert_eq!(overrides.longest_match("com/example/Foo"), Some(("", 15.0)));
        assert_eq!(overrides.longest_match("Foo"), Some(("", 15.0)));
    }

    #[test]
    fn test_class_override_beats_package_override() {
        let mut thresholds = Thresholds::new(10.0).unwrap();
        thresholds.package_overrides = packages(&[("com/example/", 90.0), ("com/", 85.0)]);
        thresholds
            .class_overrides
            .push(ClassPattern::from_key("com/example/CachedRepository"), 80.0)
            .unwrap();

        let resolved = thresholds.resolve("com/example/CachedRepository");
        assert_eq!(resolved.percent, 80.0);
        assert_eq!(
            resolved.source,
            ThresholdSource::Class("com/example/CachedRepository".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_default() {
        let mut thresholds = Thresholds::new(42.5).unwrap();
        thresholds.package_overrides = packages(&[("org/", 90.0)]);

        let resolved = thresholds.resolve("com/example/Foo");
        assert_eq!(resolved.percent, 42.5);
        assert_eq!(resolved.source, ThresholdSource::Default);
    }

    #[test]
    fn test_regex_override_and_first_match_tie_break() {
        let mut thresholds = Thresholds::default();
        thresholds
            .class_overrides
            .push(ClassPattern::regex(r".*Repository$").unwrap(), 60.0)
            .unwrap();
        thresholds
            .class_overrides
            .push(ClassPattern::exact("com/example/CachedRepository"), 100.0)
            .unwrap();

        let name = "com/example/CachedRepository";
        assert_eq!(thresholds.class_overrides.matching(name).count(), 2);
        assert_eq!(thresholds.required(name), 60.0);
        assert_eq!(thresholds.required("com/example/Service"), 0.0);
    }

    #[test]
    fn test_from_key_falls_back_to_exact() {
        let pattern = ClassPattern::from_key("com/example/Broken(");
        assert!(matches!(pattern, ClassPattern::Exact(_)));
        assert!(pattern.matches("com/example/Broken("));
        assert!(!pattern.matches("com/example/Broken"));
    }

    #[test]
    fn test_regex_key_matches_verbatim() {
        // `+` is a regex metacharacter, so the regex alone would not match.
        let pattern = ClassPattern::from_key("com/example/Outer+Inner");
        assert!(pattern.matches("com/example/Outer+Inner"));
    }

    #[test]
    fn test_invalid_explicit_regex() {
        let err = ClassPattern::regex("([").unwrap_err();
        assert!(matches!(err, GateError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_percent() {
        assert!(Thresholds::new(120.0).is_err());
        assert!(Thresholds::new(f64::NAN).is_err());
        let mut overrides = PackageOverrides::new();
        assert!(overrides.insert("com/", -1.0).is_err());
    }
}
