use crate::error::{Result, StoreError};
use crate::fields::Field;
use crate::kind::KindTag;
use serde::{Deserialize, Serialize};

/// How record fields are paired with schema declarations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matching {
    /// Field `name` is checked against the declaration named `name`.
    #[default]
    ByName,
    /// The i-th record field is checked against the i-th declaration,
    /// names ignored.
    ByPosition,
}

/// Ordered field declarations for a store. Held in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, KindTag)>,
    matching: Matching,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matching(matching: Matching) -> Self {
        Schema {
            fields: Vec::new(),
            matching,
        }
    }

    /// Builder form of [`Schema::declare`].
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Result<Self> {
        self.declare(name, field)?;
        Ok(self)
    }

    /// Declare (or redeclare) a field. Takes the no-argument output of a field
    /// helper; a concrete value is rejected. Redeclaring keeps the original
    /// position.
    pub fn declare(&mut self, name: impl Into<String>, field: impl Into<Field>) -> Result<()> {
        let name = name.into();
        let field: Field = field.into();
        let tag = match field {
            Field::Kind(tag) => tag,
            Field::Value(value) => {
                return Err(StoreError::SchemaType(format!(
                    "Field '{name}' must be declared with a kind tag, got value {value}"
                )))
            }
        };

        self.insert(name, tag);
        Ok(())
    }

    fn insert(&mut self, name: String, tag: KindTag) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = tag,
            None => self.fields.push((name, tag)),
        }
    }

    pub fn get(&self, name: &str) -> Option<KindTag> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tag)| *tag)
    }

    pub fn get_index(&self, index: usize) -> Option<(&str, KindTag)> {
        self.fields.get(index).map(|(n, tag)| (n.as_str(), *tag))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, KindTag)> {
        self.fields.iter().map(|(n, tag)| (n.as_str(), *tag))
    }

    pub fn matching(&self) -> Matching {
        self.matching
    }

    pub fn set_matching(&mut self, matching: Matching) {
        self.matching = matching;
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
