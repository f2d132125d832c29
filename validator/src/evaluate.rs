use crate::definition::Check;
use crate::error::{ValidationError, ValidationResult};
use crate::resolve::resolve;
use catalog::FieldDescriptor;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Resolved fields split by whether the checked parameter references them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome<'c> {
    pub found: Vec<&'c FieldDescriptor>,
    pub missing: Vec<&'c FieldDescriptor>,
}

impl CheckOutcome<'_> {
    pub fn is_passing(&self) -> bool {
        self.missing.is_empty()
    }

    /// Full names of the missing fields, space separated.
    pub fn missing_names(&self) -> String {
        self.missing
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// First descriptor whose full name is `name`.
pub fn find_field<'c>(
    name: &str,
    catalog: &'c [FieldDescriptor],
) -> ValidationResult<&'c FieldDescriptor> {
    catalog
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| ValidationError::FieldNotFound {
            field: name.to_string(),
        })
}

/// Compare the references in `check.parameter` of the target field against
/// the short names of every field selected by `check.validation`.
pub fn evaluate<'c>(
    check: &Check,
    catalog: &'c [FieldDescriptor],
) -> ValidationResult<CheckOutcome<'c>> {
    let target = find_field(&check.field, catalog)?;
    let expected = resolve(&check.validation, catalog)?;

    let empty = BTreeSet::new();
    let references = target.parameter(&check.parameter).unwrap_or_else(|| {
        warn!(
            "Field {} has no parameter {}; treating it as empty",
            target.name, check.parameter
        );
        &empty
    });

    let (found, missing): (Vec<_>, Vec<_>) = expected
        .iter()
        .partition(|field| references.contains(field.short_name()));

    debug!(
        "{}.{}: {} found, {} missing",
        check.field,
        check.parameter,
        found.len(),
        missing.len()
    );

    Ok(CheckOutcome { found, missing })
}
