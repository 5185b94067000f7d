use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::evaluate::{evaluate_classes, evaluate_project};
use crate::parsers::{jacoco, looks_like_jacoco};
use crate::report::{aggregate, GateReport};

/// Open a JaCoCo XML report, check that it looks like one, and evaluate the
/// tracked classes against `config`.
pub fn run(report_path: &Path, targets: &HashSet<String>, config: &GateConfig) -> Result<GateReport> {
    let file = File::open(report_path)?;
    let mut reader = BufReader::new(file);

    if !looks_like_jacoco(reader.fill_buf()?) {
        return Err(GateError::UnknownFormat);
    }

    evaluate_report(&mut reader, targets, config)
}

/// Single pass over the report followed by evaluation and aggregation.
pub fn evaluate_report(
    reader: &mut dyn BufRead,
    targets: &HashSet<String>,
    config: &GateConfig,
) -> Result<GateReport> {
    let thresholds = config.thresholds()?;
    let project_threshold = config.project_threshold()?;

    let extraction = jacoco::extract_from(reader, targets)?;
    let project = evaluate_project(&extraction.report_counters, project_threshold)?;
    let classes = evaluate_classes(&extraction.classes, &thresholds, config.no_data_policy())?;

    Ok(aggregate(
        classes,
        project,
        thresholds.default,
        config.report_url.as_deref(),
    ))
}
