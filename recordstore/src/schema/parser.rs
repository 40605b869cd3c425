use super::types::{Matching, Schema};
use crate::error::{Result, StoreError};
use crate::kind::KindTag;
use serde::Deserialize;
use std::path::Path;

/// On-disk shape of a schema file
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    matching: Matching,
    fields: serde_yaml::Mapping,
}

/// Parse a schema YAML file into a Schema
pub fn parse_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
}

/// Parse a schema YAML string into a Schema. Declaration order is kept.
pub fn parse_schema_str(content: &str) -> Result<Schema> {
    let file: SchemaFile = serde_yaml::from_str(content)?;
    let mut schema = Schema::with_matching(file.matching);

    for (key, value) in &file.fields {
        let name = key
            .as_str()
            .ok_or_else(|| StoreError::Schema(format!("Field name must be a string, got {key:?}")))?;
        let tag = value
            .as_str()
            .ok_or_else(|| StoreError::Schema(format!("Field '{name}' kind must be a string")))?
            .parse::<KindTag>()
            .map_err(|e| StoreError::Schema(format!("Field '{name}': {e}")))?;
        schema.declare(name, tag)?;
    }

    Ok(schema)
}
