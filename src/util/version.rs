//! Compiler version parsing and detection.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::util::process::{CommandRunner, ProcessBuilder};

/// Parse a version string into semver::Version, handling incomplete versions.
///
/// Handles versions like "4.1.2", "12.2.0-14", "3.0.x" or "10". Missing
/// minor and patch components are treated as zero.
pub fn parse_version_flexible(version_str: &str) -> Option<semver::Version> {
    // Remove any suffix after the first non-version character
    let clean_version = version_str
        .trim()
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or(version_str);

    if let Ok(v) = clean_version.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = clean_version.split('.').collect();
    let major = parts.first().and_then(|s| s.parse().ok())?;
    let minor = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(semver::Version::new(major, minor, patch))
}

/// Ask a GCC-compatible compiler for its version (`CCVERSION`).
pub fn detect_cc_version(runner: &dyn CommandRunner, cc: &Path) -> Result<String> {
    let cmd = ProcessBuilder::new(cc).arg("-dumpversion");
    let output = runner
        .run(&cmd)
        .with_context(|| format!("failed to run {}", cmd.display_command()))?;

    if !output.success() {
        bail!("{} failed: {}", cmd.display_command(), output.stderr.trim());
    }

    let version = output.stdout.trim().to_string();
    if parse_version_flexible(&version).is_none() {
        bail!(
            "could not parse compiler version from `{}` output: {}",
            cmd.display_command(),
            version
        );
    }

    tracing::debug!("{} reports version {}", cc.display(), version);
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutor, MockProcessOutput};

    #[test]
    fn test_parse_version_flexible() {
        assert_eq!(
            parse_version_flexible("4.1.2"),
            Some(semver::Version::new(4, 1, 2))
        );
        assert_eq!(
            parse_version_flexible("12.2.0-14"),
            Some(semver::Version::new(12, 2, 0))
        );
        assert_eq!(
            parse_version_flexible("3.0.x"),
            Some(semver::Version::new(3, 0, 0))
        );
        assert_eq!(
            parse_version_flexible("10"),
            Some(semver::Version::new(10, 0, 0))
        );
        assert_eq!(parse_version_flexible("gcc"), None);
        assert_eq!(parse_version_flexible(""), None);
    }

    #[test]
    fn test_detect_cc_version() {
        let exec = MockExecutor::new();
        exec.expect("gcc -dumpversion", MockProcessOutput::success("4.1.2\n"));

        let version = detect_cc_version(&exec, Path::new("gcc")).unwrap();
        assert_eq!(version, "4.1.2");
        assert_eq!(exec.calls(), vec!["gcc -dumpversion"]);
    }

    #[test]
    fn test_detect_cc_version_garbage() {
        let exec = MockExecutor::new();
        exec.expect(
            "cc -dumpversion",
            MockProcessOutput::success("unknown\n"),
        );
        assert!(detect_cc_version(&exec, Path::new("cc")).is_err());

        let exec = MockExecutor::new();
        exec.expect("cc -dumpversion", MockProcessOutput::failure(1, "boom"));
        assert!(detect_cc_version(&exec, Path::new("cc")).is_err());
    }
}
