//! External grammar linter invocation.
//!
//! Content is handed to the linter through a scratch file that is removed
//! on every exit path, including spawn failures and panics.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

/// One linter finding, attributed to a line of the checked text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub line: u64,
    pub message: String,
}

/// Runs the external grammar linter over in-memory text.
pub struct LintRunner {
    binary: PathBuf,
    scratch_dir: PathBuf,
}

impl LintRunner {
    /// Create a runner invoking `binary`. Scratch files default to the
    /// system temp directory.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Place scratch files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Check that the linter binary is present and answers `--version`.
    pub async fn verify_installation(&self) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("failed to run {} --version", self.binary.display()))?;
        if !output.status.success() {
            bail!(
                "{} --version exited with {}",
                self.binary.display(),
                output.status
            );
        }
        Ok(())
    }

    /// Lint `content`, returning findings in the linter's order.
    ///
    /// Any failure - spawn error, non-zero exit, unparseable output - is
    /// logged and degrades to zero findings so one bad file never aborts a
    /// whole sweep.
    pub async fn lint_text(&self, content: &str) -> Vec<LintFinding> {
        match self.try_lint(content).await {
            Ok(findings) => findings,
            Err(err) => {
                warn!(error = %err, "Lint invocation failed; treating as no findings");
                Vec::new()
            }
        }
    }

    async fn try_lint(&self, content: &str) -> Result<Vec<LintFinding>> {
        // Dropping the NamedTempFile removes the scratch file no matter how
        // this function exits.
        let scratch = tempfile::NamedTempFile::new_in(&self.scratch_dir)
            .context("failed to create scratch file")?;
        std::fs::write(scratch.path(), content).context("failed to write scratch file")?;
        debug!(scratch = %scratch.path().display(), "Running grammar linter");

        let output = self.invoke(scratch.path()).await?;
        parse_diagnostics(&output)
    }

    async fn invoke(&self, scratch: &Path) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg(scratch)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the linter's JSON diagnostics into ordered findings.
fn parse_diagnostics(output: &str) -> Result<Vec<LintFinding>> {
    #[derive(Deserialize)]
    struct Diagnostic {
        range: DiagnosticRange,
        message: String,
    }

    #[derive(Deserialize)]
    struct DiagnosticRange {
        start: DiagnosticPosition,
    }

    #[derive(Deserialize)]
    struct DiagnosticPosition {
        line: u64,
    }

    let diagnostics: Vec<Diagnostic> =
        serde_json::from_str(output).context("linter emitted unparseable diagnostics")?;
    Ok(diagnostics
        .into_iter()
        .map(|d| LintFinding {
            line: d.range.start.line,
            message: d.message,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diagnostics() {
        let output = r#"[
            {"range": {"start": {"line": 3}, "end": {"line": 3}}, "message": "Possible typo"},
            {"range": {"start": {"line": 9}}, "message": "Repeated word"}
        ]"#;

        let findings = parse_diagnostics(output).unwrap();
        assert_eq!(
            findings,
            vec![
                LintFinding {
                    line: 3,
                    message: "Possible typo".to_string()
                },
                LintFinding {
                    line: 9,
                    message: "Repeated word".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_diagnostics_empty_array() {
        assert!(parse_diagnostics("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_diagnostics_rejects_garbage() {
        assert!(parse_diagnostics("harper: command crashed").is_err());
        assert!(parse_diagnostics("{\"not\": \"an array\"}").is_err());
    }

    #[cfg(unix)]
    fn fake_linter(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-harper");
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lint_text_parses_linter_output() {
        let bin_dir = tempfile::tempdir().unwrap();
        let script = fake_linter(
            bin_dir.path(),
            "#!/bin/sh\necho '[{\"range\":{\"start\":{\"line\":3}},\"message\":\"Possible typo\"}]'\n",
        );

        let scratch_dir = tempfile::tempdir().unwrap();
        let runner = LintRunner::new(&script).with_scratch_dir(scratch_dir.path());

        let findings = runner.lint_text("Thiss is text.").await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scratch_file_removed_after_success() {
        let bin_dir = tempfile::tempdir().unwrap();
        let script = fake_linter(bin_dir.path(), "#!/bin/sh\necho '[]'\n");

        let scratch_dir = tempfile::tempdir().unwrap();
        let runner = LintRunner::new(&script).with_scratch_dir(scratch_dir.path());

        runner.lint_text("clean text").await;
        assert_eq!(std::fs::read_dir(scratch_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_scratch_file_removed_after_failure() {
        let scratch_dir = tempfile::tempdir().unwrap();
        // `false` exits non-zero for any argument.
        let runner = LintRunner::new("false").with_scratch_dir(scratch_dir.path());

        let findings = runner.lint_text("whatever").await;
        assert!(findings.is_empty());
        assert_eq!(std::fs::read_dir(scratch_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_binary_degrades_to_no_findings() {
        let scratch_dir = tempfile::tempdir().unwrap();
        let runner =
            LintRunner::new("/nonexistent/harper-cli").with_scratch_dir(scratch_dir.path());

        assert!(runner.lint_text("text").await.is_empty());
        assert_eq!(std::fs::read_dir(scratch_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_verify_installation_fails_for_missing_binary() {
        let runner = LintRunner::new("/nonexistent/harper-cli");
        assert!(runner.verify_installation().await.is_err());
    }
}
