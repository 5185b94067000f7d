use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Not a JaCoCo XML report")]
    UnknownFormat,

    #[error("Malformed report at position {position}: {message}")]
    Malformed { message: String, position: usize },

    /// The report has no usable report-scope INSTRUCTION counter.
    #[error("No project coverage data: report-scope INSTRUCTION counter is missing or empty")]
    NoProjectCoverage,

    #[error("No coverage data found for {0}")]
    NoCoverageData(String),

    #[error("Invalid class override pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GateError {
    /// Errors that make the whole report unusable and must abort the run.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GateError::Xml { .. } | GateError::Malformed { .. } | GateError::NoProjectCoverage
        )
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
