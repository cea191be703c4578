//! Shared fixture helpers for the integration tests in this directory,
//! following the teacher's own `mod common;` convention for CLI-level
//! tests (`shipcat_cli/tests/common.rs`).

/// Absolute path to a checked-in fixture tree under `tests/fixtures/<name>`.
pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}
