//! Command handler functions for the jacoco-gate CLI.
//!
//! Each `cmd_*` function returns its output as a `String` (plus the report
//! where the caller needs the verdict), making them easy to test without
//! capturing stdout.

use std::collections::HashSet;
use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::changes::ClassNameMapper;
use crate::config::GateConfig;
use crate::diff::{self, DiffSource};
use crate::report::{GateReport, JsonFormatter, ReportFormatter, TextFormatter};

/// Output style for the `check` command.
#[derive(Clone, ValueEnum)]
pub enum Style {
    Text,
    Json,
}

/// Rendered output of `check` plus the report it was rendered from.
pub struct CheckOutput {
    pub rendered: String,
    pub report: GateReport,
}

/// Load a JSON config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GateConfig> {
    let Some(path) = path else {
        return Ok(GateConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Class names to track: explicit names plus the classes of the files a diff
/// touches.
pub fn resolve_targets(
    classes: &[String],
    diff_text: Option<&str>,
    mapper: &ClassNameMapper,
) -> HashSet<String> {
    let mut targets: HashSet<String> = classes.iter().cloned().collect();
    if let Some(text) = diff_text {
        let files = diff::changed_files(text);
        targets.extend(mapper.class_names(files.iter().map(String::as_str)));
    }
    targets
}

/// Fetch a diff from `source`, if any.
pub fn fetch_diff(source: Option<&dyn DiffSource>) -> Result<Option<String>> {
    source.map(|s| s.fetch_diff()).transpose()
}

pub fn cmd_check(
    report_path: &Path,
    targets: &HashSet<String>,
    config: &GateConfig,
    style: &Style,
) -> Result<CheckOutput> {
    let report = crate::gate::run(report_path, targets, config)
        .with_context(|| format!("Failed to evaluate {}", report_path.display()))?;

    let rendered = match style {
        Style::Text => report.format(&TextFormatter),
        Style::Json => report.format(&JsonFormatter),
    };

    Ok(CheckOutput { rendered, report })
}

pub fn cmd_targets(targets: &HashSet<String>) -> String {
    if targets.is_empty() {
        return "No changed classes.\n".to_string();
    }
    let mut names: Vec<&String> = targets.iter().collect();
    names.sort();
    let mut out = String::new();
    for name in names {
        writeln!(out, "{name}").unwrap();
    }
    out
}
