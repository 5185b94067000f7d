use std::collections::HashSet;
use std::path::PathBuf;

/// Path to a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn targets(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}
