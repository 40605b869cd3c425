use crate::error::{Result, StoreError};
use crate::kind::resolve_kind;
use crate::record::Record;
use crate::schema::{Matching, Schema};

/// Result of checking a record against a schema
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check every field of `record` against `schema`.
///
/// Every supplied field needs a declaration to pair with; declared fields
/// absent from the record are not an error.
pub fn validate_record(schema: &Schema, record: &Record) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (position, (field_name, value)) in record.fields().enumerate() {
        let declared = match schema.matching() {
            Matching::ByName => schema.get(field_name),
            Matching::ByPosition => schema.get_index(position).map(|(_, tag)| tag),
        };
        let actual = resolve_kind(value);

        match declared {
            None => result.errors.push(match schema.matching() {
                Matching::ByName => format!("Field '{field_name}' is not declared in the schema"),
                Matching::ByPosition => format!(
                    "Field '{field_name}' at position {position} has no schema declaration"
                ),
            }),
            Some(expected) if expected != actual => result.errors.push(format!(
                "Typeof {value} is not matching with schema: field '{field_name}' expected {expected}, got {actual}"
            )),
            Some(_) => {}
        }
    }

    result
}

/// Validate and turn any problems into a single `SchemaType` error.
pub fn ensure_valid(schema: &Schema, record: &Record) -> Result<()> {
    let result = validate_record(schema, record);

    if !result.is_ok() {
        return Err(StoreError::SchemaType(format!(
            "Record validation failed:\n  - {}",
            result.errors.join("\n  - ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{char, number, string};
    use crate::kind::KindTag;
    use serde_json::json;

    fn person_schema(matching: Matching) -> Schema {
        let mut schema = Schema::with_matching(matching);
        schema.declare("name", string(None).unwrap()).unwrap();
        schema.declare("age", number(None).unwrap()).unwrap();
        schema
    }

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_record() {
        let schema = person_schema(Matching::ByName);
        let rec = record(&[("name", json!("Ann")), ("age", json!(30))]);
        let result = validate_record(&schema, &rec);
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
    }

    #[test]
    fn test_kind_mismatch() {
        let schema = person_schema(Matching::ByName);
        let rec = record(&[("name", json!("Ann")), ("age", json!("thirty"))]);
        let result = validate_record(&schema, &rec);
        assert!(!result.is_ok());
        assert!(result.errors.iter().any(|e| e.contains("age")));
    }

    #[test]
    fn test_by_name_ignores_order() {
        let schema = person_schema(Matching::ByName);
        let rec = record(&[("age", json!(30)), ("name", json!("Ann"))]);
        assert!(validate_record(&schema, &rec).is_ok());
    }

    #[test]
    fn test_by_position_ignores_names() {
        let schema = person_schema(Matching::ByPosition);
        let swapped = record(&[("age", json!(30)), ("name", json!("Ann"))]);
        assert!(!validate_record(&schema, &swapped).is_ok());

        let renamed = record(&[("label", json!("Ann")), ("years", json!(30))]);
        assert!(validate_record(&schema, &renamed).is_ok());
    }

    #[test]
    fn test_undeclared_field() {
        for matching in [Matching::ByName, Matching::ByPosition] {
            let schema = person_schema(matching);
            let rec = record(&[
                ("name", json!("Ann")),
                ("age", json!(30)),
                ("extra", json!("x")),
            ]);
            let result = validate_record(&schema, &rec);
            assert!(result.errors.iter().any(|e| e.contains("extra")));
        }
    }

    #[test]
    fn test_infinity_like_words_are_text() {
        let schema = person_schema(Matching::ByName);
        for name in ["Inf", "inf", "infinity", "NaN"] {
            let rec = record(&[("name", string(Some(json!(name))).unwrap().into_value().unwrap())]);
            let result = validate_record(&schema, &rec);
            assert!(result.is_ok(), "{name:?}: {:?}", result.errors);
        }

        let hex = record(&[("name", json!("0x1F"))]);
        assert!(!validate_record(&schema, &hex).is_ok());
        let hex_age = record(&[("age", json!("0x1F"))]);
        assert!(validate_record(&schema, &hex_age).is_ok());
    }

    #[test]
    fn test_missing_field_allowed() {
        let schema = person_schema(Matching::ByName);
        let rec = record(&[("name", json!("Ann"))]);
        assert!(validate_record(&schema, &rec).is_ok());
    }

    #[test]
    fn test_char_declaration_rejects_longer_text() {
        let mut schema = Schema::new();
        schema.declare("initial", char(None)).unwrap();
        let rec = record(&[("initial", json!("AB"))]);
        let err = ensure_valid(&schema, &rec).unwrap_err();
        assert!(matches!(err, StoreError::SchemaType(ref m) if m.contains(KindTag::Char.as_str())));
    }
}
