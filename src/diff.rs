/// Extract the files a unified diff adds or modifies. Those paths are then
/// mapped to class names to decide which classes of the report to check.
///
/// Also provides a [`DiffSource`] trait that abstracts over different
/// ways to obtain a diff (stdin, git).
use std::process::Command;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Diff sources
// ---------------------------------------------------------------------------

/// A source for obtaining a unified diff.
pub trait DiffSource {
    /// Fetch the diff text.
    fn fetch_diff(&self) -> Result<String>;
}

/// Diff from stdin.
pub struct StdinDiff;

impl DiffSource for StdinDiff {
    fn fetch_diff(&self) -> Result<String> {
        std::io::read_to_string(std::io::stdin()).context("Failed to read diff from stdin")
    }
}

/// Diff from a git command (e.g., `git diff main...HEAD`).
pub struct GitDiff {
    /// Arguments to pass to `git diff`.
    pub args: String,
}

impl DiffSource for GitDiff {
    fn fetch_diff(&self) -> Result<String> {
        let diff_args: Vec<&str> = self.args.split_whitespace().collect();
        let output = Command::new("git")
            .arg("diff")
            .args(&diff_args)
            .output()
            .context("Failed to run git diff")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git diff failed: {stderr}");
        }

        String::from_utf8(output.stdout).context("git diff output not valid UTF-8")
    }
}

// ---------------------------------------------------------------------------
// Diff parsing
// ---------------------------------------------------------------------------

/// Parse a unified diff (e.g., `git diff`) and return the new-side path of
/// every added or modified file, in diff order, without duplicates.
/// Deleted files are skipped.
pub fn changed_files(diff_text: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();

    for line in diff_text.lines() {
        let Some(rest) = line.strip_prefix("+++ ") else {
            continue;
        };
        // Timestamps from `diff -u` follow a tab.
        let rest = rest.split('\t').next().unwrap_or(rest);
        if rest == "/dev/null" {
            continue;
        }
        // Strip common VCS prefixes: "b/" (default git), "a/" (some tools).
        // Also handles --no-prefix diffs where no prefix is present.
        let path = rest
            .strip_prefix("b/")
            .or_else(|| rest.strip_prefix("a/"))
            .unwrap_or(rest);
        if !files.iter().any(|f| f == path) {
            files.push(path.to_string());
        }
    }

    files
}
