//! Weekly documentation lint sweep.

mod harper;
mod pipeline;
mod report;

pub use harper::{LintFinding, LintRunner};
pub use pipeline::{LintPipeline, LintRunSummary, SUGGESTIONS_PATH};
pub use report::{render_report, FileReport, REPORT_TITLE};
