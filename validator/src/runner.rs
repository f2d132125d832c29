use crate::definition::ValidationTest;
use crate::evaluate::evaluate;
use catalog::{CatalogProvider, CatalogResult, FieldDescriptor};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "Passed"),
            TestStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Verdict for one [`ValidationTest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult {
    pub test_name: String,
    pub result: TestStatus,
    pub error_message: String,
}

impl TestResult {
    pub fn passed(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            result: TestStatus::Passed,
            error_message: String::new(),
        }
    }

    pub fn failed(test_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            result: TestStatus::Failed,
            error_message: error_message.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.result == TestStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub failed: usize,
    pub passed: usize,
    /// Tests without checks; they produce no result.
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult], skipped: usize) -> Self {
        let failed = results.iter().filter(|r| r.is_failed()).count();
        Self {
            failed,
            passed: results.len() - failed,
            skipped,
        }
    }

    /// True when no test failed anywhere in the run.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.failed + self.passed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub results: Vec<TestResult>,
    pub summary: RunSummary,
}

/// Run every check of `test` against an already fetched catalog.
///
/// The first failing check decides the verdict and the remaining checks are
/// skipped. Returns `None` for a test without checks.
pub fn run_checks(test: &ValidationTest, catalog: &[FieldDescriptor]) -> Option<TestResult> {
    if test.checks.is_empty() {
        return None;
    }

    for check in &test.checks {
        match evaluate(check, catalog) {
            Err(err) => {
                warn!("{}: {}", test.test_name, err);
                return Some(TestResult::failed(&test.test_name, err.to_string()));
            }
            Ok(outcome) if !outcome.is_passing() => {
                let missing = outcome.missing_names();
                warn!("{}: missing fields {}", test.test_name, missing);
                return Some(TestResult::failed(&test.test_name, missing));
            }
            Ok(_) => {}
        }
    }

    Some(TestResult::passed(&test.test_name))
}

/// Evaluate all tests in order, fetching each test's catalog from `provider`.
///
/// Catalog errors abort the run; resolution errors only fail their test.
pub async fn run<P>(tests: &[ValidationTest], provider: &P) -> CatalogResult<RunOutcome>
where
    P: CatalogProvider + ?Sized,
{
    let mut results = Vec::with_capacity(tests.len());
    let mut skipped = 0;

    for test in tests {
        info!(
            "Running {} against {}/{} ({})",
            test.test_name, test.model, test.explore, test.project
        );
        let catalog = provider
            .fetch_catalog(&test.project, &test.model, &test.explore)
            .await?;

        match run_checks(test, &catalog) {
            Some(result) => {
                info!("{}: {}", result.test_name, result.result);
                results.push(result);
            }
            None => {
                warn!("{} has no checks; no result recorded", test.test_name);
                skipped += 1;
            }
        }
    }

    let summary = RunSummary::from_results(&results, skipped);
    info!(
        "Run finished: {} passed, {} failed, {} skipped",
        summary.passed, summary.failed, summary.skipped
    );

    Ok(RunOutcome { results, summary })
}
