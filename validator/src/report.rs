use crate::runner::{RunSummary, TestResult, TestStatus};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const REPORT_FILE_NAME: &str = "lookml_validation_results.md";
pub const COLUMN_HEADERS: [&str; 4] = ["Test Name", "Result", "Error Message", "Level"];

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Glyph shown next to each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Ok,
}

impl Level {
    pub fn glyph(&self) -> &'static str {
        match self {
            Level::Error => "⛔",
            Level::Ok => "✅",
        }
    }
}

impl From<TestStatus> for Level {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Failed => Level::Error,
            TestStatus::Passed => Level::Ok,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} | {} {}",
            self.failed,
            Level::Error.glyph(),
            self.passed,
            Level::Ok.glyph()
        )
    }
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Markdown document with a title carrying the summary and one table row per result.
pub fn render_markdown(results: &[TestResult], summary: &RunSummary) -> String {
    let mut out = format!("# LookML Validation Results: {}\n\n", summary);

    out.push_str(&format!("| {} |\n", COLUMN_HEADERS.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        COLUMN_HEADERS.iter().map(|_| " --- |").collect::<String>()
    ));

    for result in results {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&result.test_name),
            result.result,
            cell(&result.error_message),
            Level::from(result.result).glyph()
        ));
    }

    out
}

/// Write the report into `directory` and return the file path.
pub fn write_markdown(
    directory: impl AsRef<Path>,
    results: &[TestResult],
    summary: &RunSummary,
) -> ReportResult<PathBuf> {
    let path = directory.as_ref().join(REPORT_FILE_NAME);
    std::fs::write(&path, render_markdown(results, summary)).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    info!("Wrote report to {}", path.display());
    Ok(path)
}
