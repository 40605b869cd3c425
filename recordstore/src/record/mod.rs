// Record - one stored entry, field name to tagged value

use crate::error::Result;
use crate::fields::Field;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record. Fields keep their insertion order, on disk too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Builder form: add a field produced by a field helper.
    /// Fails when given a bare kind tag instead of a value.
    pub fn with(mut self, name: impl Into<String>, field: Field) -> Result<Self> {
        self.0.insert(name.into(), field.into_value()?);
        Ok(self)
    }

    /// Insert a raw value, replacing any previous value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}
