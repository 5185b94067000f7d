//! Aggregation of class and project evaluations into a gate verdict, plus
//! plain-text and JSON output for the CLI.

use std::fmt::Write;

use serde::Serialize;

use crate::evaluate::{ClassEvaluation, ProjectEvaluation};
use crate::model::Status;

/// One output row per tracked class, in extraction order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRow {
    pub class_name: String,
    /// `None` for classes without coverage data.
    pub coverage_percent: Option<u32>,
    pub required_percent: f64,
    pub status: Status,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub project_coverage_percent: f64,
    pub project_required_percent: f64,
    pub project_status: Status,
    pub project_passed: bool,
    /// True when every class with coverage data is at or above its
    /// threshold. WARN counts as a miss; no-data rows are left out.
    pub all_classes_passed: bool,
}

/// Everything a caller needs to render a report and decide failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateReport {
    pub rows: Vec<ClassRow>,
    pub verdict: Verdict,
    /// Global class default, quoted in the class failure message.
    pub class_threshold: f64,
}

impl GateReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict.project_passed && self.verdict.all_classes_passed
    }

    /// Human-readable failure messages. Project and class checks are
    /// independent, so both can appear.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.verdict.project_passed {
            messages.push(format!(
                "Total coverage of {}%. Improve this to at least {}%",
                self.verdict.project_coverage_percent, self.verdict.project_required_percent
            ));
        }
        if !self.verdict.all_classes_passed {
            messages.push(format!(
                "Class coverage is below minimum. Improve to at least {}%",
                self.class_threshold
            ));
        }
        messages
    }

    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }
}

/// Fold class evaluations and the project evaluation into a report.
pub fn aggregate(
    evaluations: Vec<ClassEvaluation>,
    project: ProjectEvaluation,
    class_threshold: f64,
    report_url: Option<&str>,
) -> GateReport {
    let all_classes_passed = evaluations
        .iter()
        .filter(|e| e.status != Status::NoData)
        .all(|e| e.passed());

    let rows = evaluations
        .into_iter()
        .map(|e| ClassRow {
            link: report_url.and_then(|url| report_link(&e.name, url)),
            class_name: e.name,
            coverage_percent: e.coverage_percent,
            required_percent: e.required_percent,
            status: e.status,
        })
        .collect();

    GateReport {
        rows,
        verdict: Verdict {
            project_passed: project.passed(),
            project_coverage_percent: project.coverage_percent,
            project_required_percent: project.required_percent,
            project_status: project.status,
            all_classes_passed,
        },
        class_threshold,
    }
}

/// Link to the class page of a JaCoCo HTML report hosted at `base_url`.
///
/// The HTML report uses dotted package directories, so every `/` except the
/// one before the simple class name becomes `.`:
/// `com/example/Foo` → `{base_url}com.example/Foo.html`.
#[must_use]
pub fn report_link(class_name: &str, base_url: &str) -> Option<String> {
    if base_url.is_empty() {
        return None;
    }
    let cut = class_name
        .match_indices('/')
        .map(|(i, _)| i)
        .filter(|&i| i + 1 < class_name.len())
        .last();
    let page = match cut {
        Some(cut) => format!("{}{}", class_name[..cut].replace('/', "."), &class_name[cut..]),
        None => class_name.to_string(),
    };
    Some(format!("{base_url}{page}.html"))
}

/// Trait for formatting gate reports.
pub trait ReportFormatter {
    fn format(&self, report: &GateReport) -> String;
}

/// Plain text table.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &GateReport) -> String {
        let mut out = String::new();
        let v = &report.verdict;

        writeln!(
            out,
            "Project coverage: {}% (required {}%)  {}",
            v.project_coverage_percent, v.project_required_percent, v.project_status
        )
        .unwrap();

        if report.rows.is_empty() {
            out.push_str("No tracked classes found in report.\n");
            return out;
        }

        out.push('\n');
        writeln!(
            out,
            "{:<60} {:>8} {:>8}  STATUS",
            "CLASS", "COVERAGE", "REQUIRED"
        )
        .unwrap();
        writeln!(out, "{}", "-".repeat(88)).unwrap();
        for row in &report.rows {
            let coverage = match row.coverage_percent {
                Some(pct) => format!("{pct}%"),
                None => "-".to_string(),
            };
            let required = format!("{}%", row.required_percent);
            write!(
                out,
                "{:<60} {:>8} {:>8}  {}",
                row.class_name, coverage, required, row.status
            )
            .unwrap();
            if let Some(link) = &row.link {
                write!(out, "  {link}").unwrap();
            }
            out.push('\n');
        }

        out
    }
}

/// Pretty-printed JSON of the full report.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &GateReport) -> String {
        let mut out = serde_json::to_string_pretty(report).unwrap_or_default();
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::ThresholdSource;

    fn class(name: &str, coverage: Option<u32>, required: f64, status: Status) -> ClassEvaluation {
        ClassEvaluation {
            name: name.to_string(),
            coverage_percent: coverage,
            required_percent: required,
            threshold_source: ThresholdSource::Default,
            counter: None,
            status,
        }
    }

    fn project(coverage: f64, required: f64, status: Status) -> ProjectEvaluation {
        ProjectEvaluation {
            coverage_percent: coverage,
            required_percent: required,
            status,
        }
    }

    #[test]
    fn test_report_link() {
        assert_eq!(
            report_link("com/example/CachedRepository", "http://test.com/").as_deref(),
            Some("http://test.com/com.example/CachedRepository.html")
        );
        assert_eq!(
            report_link("Foo", "http://test.com/").as_deref(),
            Some("http://test.com/Foo.html")
        );
        assert_eq!(report_link("com/example/Foo", ""), None);
    }

    #[test]
    fn test_both_failures_reported_together() {
        let report = aggregate(
            vec![class("com/example/CachedRepository", Some(50), 100.0, Status::Warn)],
            project(32.9, 50.0, Status::Warn),
            0.0,
            None,
        );

        assert!(!report.verdict.project_passed);
        assert!(!report.verdict.all_classes_passed);
        assert!(!report.passed());
        assert_eq!(
            report.failures(),
            vec![
                "Total coverage of 32.9%. Improve this to at least 50%".to_string(),
                "Class coverage is below minimum. Improve to at least 0%".to_string(),
            ]
        );
    }

    #[test]
    fn test_warn_does_not_pass_but_no_data_is_skipped() {
        let report = aggregate(
            vec![
                class("a/Ok", Some(90), 80.0, Status::Ok),
                class("a/Missing", None, 80.0, Status::NoData),
            ],
            project(90.0, 50.0, Status::Ok),
            80.0,
            None,
        );
        assert!(report.verdict.all_classes_passed);
        assert!(report.passed());
        assert!(report.failures().is_empty());

        let report = aggregate(
            vec![class("a/Warn", Some(79), 80.0, Status::Warn)],
            project(90.0, 50.0, Status::Ok),
            80.0,
            None,
        );
        assert!(!report.verdict.all_classes_passed);
        assert_eq!(
            report.failures(),
            vec!["Class coverage is below minimum. Improve to at least 80%".to_string()]
        );
    }

    #[test]
    fn test_rows_keep_order_and_links() {
        let report = aggregate(
            vec![
                class("b/B", Some(10), 50.0, Status::Fail),
                class("a/A", Some(60), 50.0, Status::Ok),
            ],
            project(50.0, 50.0, Status::Ok),
            50.0,
            Some("https://ci/jacoco/"),
        );
        let names: Vec<_> = report.rows.iter().map(|r| r.class_name.as_str()).collect();
        assert_eq!(names, ["b/B", "a/A"]);
        assert_eq!(
            report.rows[1].link.as_deref(),
            Some("https://ci/jacoco/a/A.html")
        );
    }

    #[test]
    fn test_text_formatter() {
        let report = aggregate(
            vec![
                class("com/example/Foo", Some(50), 100.0, Status::Warn),
                class("com/example/Bar", None, 80.0, Status::NoData),
            ],
            project(32.9, 50.0, Status::Warn),
            0.0,
            None,
        );
        let text = report.format(&TextFormatter);
        assert!(text.contains("Project coverage: 32.9% (required 50%)  warn"));
        assert!(text.contains("com/example/Foo"));
        assert!(text.contains("100%"));
        assert!(text.contains("no data"));
    }

    #[test]
    fn test_json_formatter_is_deterministic() {
        let build = || {
            aggregate(
                vec![class("com/example/Foo", Some(50), 100.0, Status::Warn)],
                project(32.9, 50.0, Status::Warn),
                0.0,
                Some("http://test.com/"),
            )
        };
        let first = build().format(&JsonFormatter);
        let second = build().format(&JsonFormatter);
        assert_eq!(first, second);

        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["verdict"]["all_classes_passed"], false);
        assert_eq!(value["rows"][0]["status"], "warn");
        assert_eq!(
            value["rows"][0]["link"],
            "http://test.com/com.example/Foo.html"
        );
    }
}
