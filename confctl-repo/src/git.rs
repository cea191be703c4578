use std::path::Path;
use std::process::Command;

use crate::error::{ErrorKind, Result};

/// Dumb git wrapper that validates output or bails, same shape as the
/// teacher's `git::exec` (single `Command`, stderr logged not swallowed).
fn exec(args: &[&str]) -> Result<String> {
    debug!("git {}", args.join(" "));
    let out = Command::new("git").args(args).output()?;
    if !out.status.success() {
        return Err(ErrorKind::SubprocessFailure(args.join(" "), out.status.code().unwrap_or(1001)).into());
    }
    let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
    if !stderr.is_empty() {
        warn!("git {}: {}", args.join(" "), stderr);
    }
    Ok(stdout)
}

/// Shallow, single-branch clone of `url` at `reference` into `dest`
/// (§4.5 "shallow-clone, depth 1, single branch").
pub fn clone_shallow(url: &str, reference: &str, dest: &Path) -> Result<()> {
    exec(&[
        "clone",
        "--depth",
        "1",
        "--branch",
        reference,
        "--single-branch",
        url,
        &dest.to_string_lossy(),
    ])?;
    Ok(())
}
