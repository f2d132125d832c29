use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Category of an explore field as reported by the catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Dimension,
    Measure,
    Filter,
    Parameter,
    #[serde(other)]
    Other,
}

impl FieldKind {
    /// Whether expression terms may select this field by name.
    pub fn is_field(&self) -> bool {
        !matches!(self, FieldKind::Other)
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Dimension
    }
}

/// One field of an explore, identified by its `view.field` name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub parameters: BTreeMap<String, BTreeSet<String>>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Dimension,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parameter<I, S>(mut self, parameter: impl Into<String>, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.insert(
            parameter.into(),
            references.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// The field-local segment of the name: `status` for `orders.status`.
    pub fn short_name(&self) -> &str {
        self.name.split('.').nth(1).unwrap_or(&self.name)
    }

    pub fn parameter(&self, parameter: &str) -> Option<&BTreeSet<String>> {
        self.parameters.get(parameter)
    }

    /// Build a descriptor from a raw field object of the explore endpoint.
    ///
    /// `name` and `category` are lifted into their own slots; every other
    /// attribute that carries strings becomes a parameter. Arrays keep their
    /// string elements and a scalar string becomes a one-element set.
    pub fn from_api_field(raw: &serde_json::Value) -> Option<Self> {
        let object = raw.as_object()?;
        let name = object.get("name")?.as_str()?.to_string();

        let kind = object
            .get("category")
            .cloned()
            .and_then(|category| serde_json::from_value(category).ok())
            .unwrap_or_default();

        let mut parameters = BTreeMap::new();
        for (key, value) in object {
            if key == "name" || key == "category" {
                continue;
            }
            let references: Option<BTreeSet<String>> = match value {
                serde_json::Value::Array(items) => Some(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                ),
                serde_json::Value::String(s) => Some(BTreeSet::from([s.clone()])),
                _ => None,
            };
            if let Some(references) = references {
                parameters.insert(key.clone(), references);
            }
        }

        Some(Self {
            name,
            kind,
            parameters,
        })
    }
}

/// Response body of the explore endpoint, trimmed to what validation reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ExploreDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: ExploreFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExploreFields {
    #[serde(default)]
    pub dimensions: Vec<serde_json::Value>,
}

impl ExploreDefinition {
    /// Dimension descriptors in catalog order. Entries without a name are dropped.
    pub fn dimensions(&self) -> Vec<FieldDescriptor> {
        self.fields
            .dimensions
            .iter()
            .filter_map(FieldDescriptor::from_api_field)
            .collect()
    }
}
