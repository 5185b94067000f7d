//! Per-class and project-level coverage evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};
use crate::model::{ClassRecord, Counter, CounterKind, Status};
use crate::threshold::{ThresholdSource, Thresholds};

/// What to do with a tracked class that has neither a BRANCH nor a LINE
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Abort the evaluation with [`GateError::NoCoverageData`].
    #[default]
    Fail,
    /// Log a warning and keep the class as a [`Status::NoData`] row that
    /// does not take part in pass/fail.
    Warn,
}

impl NoDataPolicy {
    pub fn from_fail_flag(fail: bool) -> Self {
        if fail {
            NoDataPolicy::Fail
        } else {
            NoDataPolicy::Warn
        }
    }
}

/// Two-band status: below half the threshold fails, below the threshold
/// warns, otherwise ok.
#[must_use]
pub fn classify(coverage: f64, required: f64) -> Status {
    if coverage < required / 2.0 {
        Status::Fail
    } else if coverage < required {
        Status::Warn
    } else {
        Status::Ok
    }
}

/// Pick the counter a class is judged by: the first BRANCH counter, else the
/// first LINE counter.
pub fn select_counter(counters: &[Counter]) -> Option<&Counter> {
    counters
        .iter()
        .find(|c| c.kind == CounterKind::Branch)
        .or_else(|| counters.iter().find(|c| c.kind == CounterKind::Line))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub coverage_percent: u32,
    pub status: Status,
}

/// Floor percentage of `counter` and its status against `required`.
/// `None` when the counter has nothing to measure.
pub fn evaluate(counter: &Counter, required: f64) -> Option<Evaluation> {
    let coverage_percent = counter.floor_percent()?;
    Some(Evaluation {
        coverage_percent,
        status: classify(f64::from(coverage_percent), required),
    })
}

/// Result of evaluating one tracked class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEvaluation {
    pub name: String,
    /// `None` when the class had no usable counter.
    pub coverage_percent: Option<u32>,
    pub required_percent: f64,
    pub threshold_source: ThresholdSource,
    pub counter: Option<CounterKind>,
    pub status: Status,
}

impl ClassEvaluation {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Ok
    }
}

pub fn evaluate_class(
    record: &ClassRecord,
    thresholds: &Thresholds,
    policy: NoDataPolicy,
) -> Result<ClassEvaluation> {
    let resolved = thresholds.resolve(&record.name);
    tracing::debug!(
        class = %record.name,
        required = resolved.percent,
        source = ?resolved.source,
        "resolved class threshold"
    );

    let measured = select_counter(&record.counters)
        .and_then(|counter| evaluate(counter, resolved.percent).map(|e| (counter, e)));

    match measured {
        Some((counter, evaluation)) => Ok(ClassEvaluation {
            name: record.name.clone(),
            coverage_percent: Some(evaluation.coverage_percent),
            required_percent: resolved.percent,
            threshold_source: resolved.source,
            counter: Some(counter.kind.clone()),
            status: evaluation.status,
        }),
        None => match policy {
            NoDataPolicy::Fail => Err(GateError::NoCoverageData(record.name.clone())),
            NoDataPolicy::Warn => {
                tracing::warn!(class = %record.name, "No coverage data found for {}", record.name);
                Ok(ClassEvaluation {
                    name: record.name.clone(),
                    coverage_percent: None,
                    required_percent: resolved.percent,
                    threshold_source: resolved.source,
                    counter: None,
                    status: Status::NoData,
                })
            }
        },
    }
}

/// Evaluate every record in order. Stops at the first strict-policy failure.
pub fn evaluate_classes(
    records: &[ClassRecord],
    thresholds: &Thresholds,
    policy: NoDataPolicy,
) -> Result<Vec<ClassEvaluation>> {
    records
        .iter()
        .map(|record| evaluate_class(record, thresholds, policy))
        .collect()
}

/// Project-wide coverage from the report-scope INSTRUCTION counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectEvaluation {
    /// Rounded to two decimals.
    pub coverage_percent: f64,
    pub required_percent: f64,
    pub status: Status,
}

impl ProjectEvaluation {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.coverage_percent >= self.required_percent
    }
}

pub fn evaluate_project(report_counters: &[Counter], required: f64) -> Result<ProjectEvaluation> {
    let coverage_percent = report_counters
        .iter()
        .find(|c| c.kind == CounterKind::Instruction)
        .and_then(Counter::rounded_percent)
        .ok_or(GateError::NoProjectCoverage)?;

    Ok(ProjectEvaluation {
        coverage_percent,
        required_percent: required,
        status: classify(coverage_percent, required),
    })
}
