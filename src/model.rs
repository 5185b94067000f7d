//! In-memory representation of the parts of a JaCoCo report we care about:
//! counters and the classes that own them. Everything else in the report is
//! skipped by the extractor and never modeled.

use std::fmt;

use serde::{Serialize, Serializer};

/// Coverage metric kind of a `<counter>` element.
///
/// Only INSTRUCTION, BRANCH and LINE carry meaning for evaluation. Any other
/// `type` attribute is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Instruction,
    Branch,
    Line,
    Complexity,
    Method,
    Class,
    Other(String),
}

impl CounterKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "INSTRUCTION" => CounterKind::Instruction,
            "BRANCH" => CounterKind::Branch,
            "LINE" => CounterKind::Line,
            "COMPLEXITY" => CounterKind::Complexity,
            "METHOD" => CounterKind::Method,
            "CLASS" => CounterKind::Class,
            other => CounterKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CounterKind::Instruction => "INSTRUCTION",
            CounterKind::Branch => "BRANCH",
            CounterKind::Line => "LINE",
            CounterKind::Complexity => "COMPLEXITY",
            CounterKind::Method => "METHOD",
            CounterKind::Class => "CLASS",
            CounterKind::Other(s) => s,
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CounterKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A missed/covered tally for one metric kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub kind: CounterKind,
    pub missed: u64,
    pub covered: u64,
}

impl Counter {
    pub fn new(kind: CounterKind, missed: u64, covered: u64) -> Self {
        Self {
            kind,
            missed,
            covered,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.missed.saturating_add(self.covered)
    }

    /// Coverage truncated towards zero, or `None` when the counter is empty.
    ///
    /// Integer arithmetic keeps `1/3` at exactly 33 with no float rounding.
    #[must_use]
    pub fn floor_percent(&self) -> Option<u32> {
        let total = u128::from(self.missed) + u128::from(self.covered);
        if total == 0 {
            return None;
        }
        Some((u128::from(self.covered) * 100 / total) as u32)
    }

    /// Coverage rounded to two decimals, or `None` when the counter is empty.
    #[must_use]
    pub fn rounded_percent(&self) -> Option<f64> {
        let total = self.missed as f64 + self.covered as f64;
        if total == 0.0 {
            return None;
        }
        Some((self.covered as f64 * 100.0 / total * 100.0).round() / 100.0)
    }
}

/// Class-level counters of one tracked `<class>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    /// Slash-delimited class path, e.g. `com/example/CachedRepository`.
    pub name: String,
    /// Counters in document order. A kind may appear more than once.
    pub counters: Vec<Counter>,
}

impl ClassRecord {
    pub fn new(name: String) -> Self {
        Self {
            name,
            counters: Vec::new(),
        }
    }

    /// First counter of the given kind.
    pub fn counter(&self, kind: &CounterKind) -> Option<&Counter> {
        self.counters.iter().find(|c| &c.kind == kind)
    }
}

/// Outcome of comparing a coverage percentage with its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Warn,
    Fail,
    /// The class had neither a BRANCH nor a LINE counter.
    NoData,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warn => "warn",
            Status::Fail => "fail",
            Status::NoData => "no data",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_percent_truncates() {
        let counter = Counter::new(CounterKind::Branch, 2, 1);
        assert_eq!(counter.floor_percent(), Some(33));

        let counter = Counter::new(CounterKind::Line, 1, 2);
        assert_eq!(counter.floor_percent(), Some(66));

        let counter = Counter::new(CounterKind::Line, 1, 199);
        assert_eq!(counter.floor_percent(), Some(99));
    }

    #[test]
    fn test_percent_undefined_for_empty_counter() {
        let counter = Counter::new(CounterKind::Instruction, 0, 0);
        assert_eq!(counter.floor_percent(), None);
        assert_eq!(counter.rounded_percent(), None);
    }

    #[test]
    fn test_rounded_percent() {
        let counter = Counter::new(CounterKind::Instruction, 671, 329);
        assert_eq!(counter.rounded_percent(), Some(32.9));

        let counter = Counter::new(CounterKind::Instruction, 2, 1);
        assert_eq!(counter.rounded_percent(), Some(33.33));
    }

    #[test]
    fn test_counter_kind_round_trips_unknown_types() {
        assert_eq!(CounterKind::parse("BRANCH"), CounterKind::Branch);
        let custom = CounterKind::parse("CYCLES");
        assert_eq!(custom, CounterKind::Other("CYCLES".to_string()));
        assert_eq!(custom.as_str(), "CYCLES");
    }

    #[test]
    fn test_class_record_counter_picks_first_of_kind() {
        let mut record = ClassRecord::new("com/example/Foo".to_string());
        record.counters.push(Counter::new(CounterKind::Line, 1, 1));
        record.counters.push(Counter::new(CounterKind::Line, 0, 9));
        let line = record.counter(&CounterKind::Line).unwrap();
        assert_eq!(line.covered, 1);
        assert!(record.counter(&CounterKind::Branch).is_none());
    }
}
