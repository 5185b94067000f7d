//! Mapping of changed source files to JaCoCo class names.
//!
//! `src/main/java/com/example/Foo.java` → `com/example/Foo`: keep files with
//! a tracked extension, drop the extension, then keep what follows the
//! source-root delimiter.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GateError, Result};

pub const DEFAULT_DELIMITER: &str = "/java/|/kotlin/|/scala/";

static DEFAULT_DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_DELIMITER).unwrap());

pub fn default_extensions() -> Vec<String> {
    vec![".kt".to_string(), ".java".to_string()]
}

#[derive(Debug, Clone)]
pub struct ClassNameMapper {
    extensions: Vec<String>,
    delimiter: Regex,
}

impl ClassNameMapper {
    pub fn new(extensions: Vec<String>, delimiter: &str) -> Result<Self> {
        let delimiter = Regex::new(delimiter).map_err(|source| GateError::InvalidPattern {
            pattern: delimiter.to_string(),
            source,
        })?;
        Ok(Self {
            extensions,
            delimiter,
        })
    }

    /// Class name for one changed path, or `None` when the file is not a
    /// tracked source file or sits outside a recognized source root.
    pub fn class_name(&self, path: &str) -> Option<String> {
        if !self.extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            return None;
        }

        // Cut at the first '.' of the file name, so `Foo.test.kt` → `Foo`
        // while dotted directories stay intact.
        let file_start = path.rfind('/').map_or(0, |i| i + 1);
        let stem_end = path[file_start..]
            .find('.')
            .map_or(path.len(), |i| file_start + i);
        let without_ext = &path[..stem_end];

        let m = self.delimiter.find(without_ext)?;
        let class_name = &without_ext[m.end()..];
        if class_name.is_empty() {
            return None;
        }
        Some(class_name.to_string())
    }

    /// Target set for the extractor from a list of changed paths.
    pub fn class_names<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
        paths
            .into_iter()
            .filter_map(|path| {
                let name = self.class_name(path);
                if name.is_none() {
                    tracing::debug!(path, "changed file does not map to a class");
                }
                name
            })
            .collect()
    }
}

impl Default for ClassNameMapper {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            delimiter: DEFAULT_DELIMITER_RE.clone(),
        }
    }
}
