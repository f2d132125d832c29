pub mod definition;
pub mod error;
pub mod evaluate;
pub mod report;
pub mod resolve;
pub mod runner;

pub use definition::{
    load_tests, parse_tests, Check, DefinitionError, DefinitionResult, ValidationTest,
};
pub use error::{ValidationError, ValidationResult};
pub use evaluate::{evaluate, find_field, CheckOutcome};
pub use report::{
    render_markdown, write_markdown, Level, ReportError, ReportResult, COLUMN_HEADERS,
    REPORT_FILE_NAME,
};
pub use resolve::{resolve, ResolvedFields, ALL_FIELDS};
pub use runner::{run, run_checks, RunOutcome, RunSummary, TestResult, TestStatus};
