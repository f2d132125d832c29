//! Inclusion/exclusion expressions.
//!
//! An expression is a comma-separated list of terms. `ALL_FIELDS*` seeds the
//! selection with the whole catalog, a bare field name adds that field and a
//! `-` prefix removes it. Terms are applied in order and the selection must
//! stay non-empty after every term.

use crate::error::{ValidationError, ValidationResult};
use catalog::FieldDescriptor;
use std::collections::BTreeSet;
use tracing::trace;

pub const ALL_FIELDS: &str = "ALL_FIELDS*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term<'e> {
    AllFields,
    Include(&'e str),
    Exclude(&'e str),
}

impl<'e> Term<'e> {
    fn parse(raw: &'e str) -> Self {
        if raw == ALL_FIELDS {
            Term::AllFields
        } else if let Some(name) = raw.strip_prefix('-') {
            Term::Exclude(name)
        } else {
            Term::Include(raw)
        }
    }
}

/// Fields selected by an expression, kept in catalog order.
#[derive(Debug, Clone)]
pub struct ResolvedFields<'c> {
    catalog: &'c [FieldDescriptor],
    selected: BTreeSet<usize>,
}

impl<'c> ResolvedFields<'c> {
    pub fn iter(&self) -> impl Iterator<Item = &'c FieldDescriptor> + '_ {
        let catalog = self.catalog;
        self.selected.iter().map(move |&index| &catalog[index])
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|field| field.name == name)
    }

    pub fn names(&self) -> Vec<&'c str> {
        self.iter().map(|field| field.name.as_str()).collect()
    }
}

fn matching<'a>(catalog: &'a [FieldDescriptor], name: &'a str) -> impl Iterator<Item = usize> + 'a {
    catalog
        .iter()
        .enumerate()
        .filter(move |(_, field)| field.kind.is_field() && field.name == name)
        .map(|(index, _)| index)
}

/// Resolve `expression` against `catalog`.
///
/// Unknown names are ignored. Fails with [`ValidationError::NoFieldsSpecified`]
/// as soon as a term leaves the selection empty, even if a later term would
/// have added fields back.
pub fn resolve<'c>(
    expression: &str,
    catalog: &'c [FieldDescriptor],
) -> ValidationResult<ResolvedFields<'c>> {
    let terms: Vec<Term<'_>> = expression.split(',').map(Term::parse).collect();

    let seed: BTreeSet<usize> = if terms.contains(&Term::AllFields) {
        (0..catalog.len()).collect()
    } else {
        BTreeSet::new()
    };

    let selected = terms.iter().try_fold(seed, |mut selected, term| {
        match *term {
            Term::AllFields => {}
            Term::Include(name) => selected.extend(matching(catalog, name)),
            Term::Exclude(name) => {
                for index in matching(catalog, name) {
                    selected.remove(&index);
                }
            }
        }
        trace!("After {:?}: {} fields selected", term, selected.len());

        if selected.is_empty() {
            Err(ValidationError::NoFieldsSpecified {
                expression: expression.to_string(),
            })
        } else {
            Ok(selected)
        }
    })?;

    Ok(ResolvedFields { catalog, selected })
}
