//! Rendering of the consolidated weekly suggestions document.

use std::fmt::Write as _;

use crate::lint::harper::LintFinding;

/// Title of the weekly pull request.
pub const REPORT_TITLE: &str = "Weekly grammar check suggestions";

/// Findings for one file of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub repository: String,
    pub file: String,
    pub findings: Vec<LintFinding>,
}

/// Render all findings of a run, grouped by repository and file.
#[must_use]
pub fn render_report(reports: &[FileReport]) -> String {
    let mut body = String::from("Here are this week's grammar suggestions:\n\n");
    for report in reports {
        let _ = writeln!(
            body,
            "## In repo '{}', file '{}':",
            report.repository, report.file
        );
        for finding in &report.findings {
            let _ = writeln!(body, "- Line {}: {}", finding.line, finding.message);
        }
        body.push('\n');
    }
    body
}
