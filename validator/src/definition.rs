//! Test definition files.
//!
//! A definition file is a JSON array of tests:
//!
//! ```json
//! [
//!   {
//!     "test_name": "order tags",
//!     "project": "analytics",
//!     "model": "ecommerce",
//!     "explore": "orders",
//!     "checks": [
//!       {"field": "orders.status", "parameter": "tags", "validation": "ALL_FIELDS*,-orders.id"}
//!     ]
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Cannot read test definitions from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid test definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// One named test against a single explore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationTest {
    pub test_name: String,
    pub project: String,
    pub model: String,
    pub explore: String,
    #[serde(default)]
    pub checks: Vec<Check>,
}

/// Asserts that `parameter` on `field` references every field selected by `validation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Check {
    pub field: String,
    pub parameter: String,
    pub validation: String,
}

impl Check {
    pub fn new(
        field: impl Into<String>,
        parameter: impl Into<String>,
        validation: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            parameter: parameter.into(),
            validation: validation.into(),
        }
    }
}

pub fn parse_tests(contents: &str) -> DefinitionResult<Vec<ValidationTest>> {
    Ok(serde_json::from_str(contents)?)
}

pub fn load_tests(path: impl AsRef<Path>) -> DefinitionResult<Vec<ValidationTest>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tests(&contents)
}
