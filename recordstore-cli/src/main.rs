use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use recordstore::{
    parse_schema, resolve_kind, KindTag, Matching, OpenMode, Record, Schema, Store,
    StoreConfig,
};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;

/// recordstore CLI: inspect and edit schema-validated JSON record stores
#[derive(Parser)]
#[command(name = "recordstore", version, about)]
struct Cli {
    /// Directory holding the store files (default: $RECORDSTORE_DATA_DIR or .)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// File name prefix for store files (default: $RECORDSTORE_PREFIX or db_)
    #[arg(long)]
    prefix: Option<String>,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new, empty store
    Create {
        /// Store name
        name: String,
        /// Replace an existing store of the same name
        #[arg(long)]
        truncate: bool,
    },

    /// Print every record in a store
    Get {
        /// Store name
        name: String,
    },

    /// Append a record, typing each field by the schema
    Add {
        /// Store name
        name: String,
        /// Schema YAML file
        #[arg(long)]
        schema: PathBuf,
        /// Field values (e.g. --field name=Ann --field age=30)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Delete the record at a position
    Delete {
        /// Store name
        name: String,
        /// 0-based record index
        index: usize,
        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the store file
    Destroy {
        /// Store name
        name: String,
    },

    /// List stores in the data directory
    List,

    /// Show the kind tag of a JSON literal (e.g. '"x"', 42, '{"message":"m"}')
    Kind {
        /// JSON value; bare words are read as text
        value: String,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s.find('=').ok_or_else(|| {
        format!("Invalid key=value pair: no '=' found in '{s}'")
    })?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(prefix) = cli.prefix {
        config.prefix = prefix;
    }
    log::debug!("Using data directory {}", config.data_dir.display());

    match cli.command {
        Command::Create { name, truncate } => {
            let mode = if truncate {
                OpenMode::CreateOrTruncate
            } else {
                OpenMode::Create
            };
            let store = Store::open_in(&config, &name, mode)?;
            print_output(
                &serde_json::json!({ "ok": true, "created": name, "path": store.path().display().to_string() }),
                &cli.format,
            )?;
        }

        Command::Get { name } => {
            let store = Store::open_in(&config, &name, OpenMode::Open)?;
            let records = store.get()?;
            print_output(&serde_json::to_value(records)?, &cli.format)?;
        }

        Command::Add {
            name,
            schema,
            fields,
        } => {
            let schema = parse_schema(&schema)?;
            let record = build_record(&schema, &fields)?;
            let mut store = Store::open_in(&config, &name, OpenMode::Open)?;
            store.set_schema(schema);

            let (tx, rx) = mpsc::channel();
            store
                .add(record, move |result| {
                    let _ = tx.send(result);
                })?
                .wait()?;
            let status = rx.recv()??;
            print_output(&serde_json::to_value(status)?, &cli.format)?;
        }

        Command::Delete {
            name,
            index,
            dry_run,
        } => {
            let store = Store::open_in(&config, &name, OpenMode::Open)?;
            if dry_run {
                let records = store.get()?;
                let record = records.get(index).ok_or_else(|| {
                    format!("Index {index} out of range for store of {} records", records.len())
                })?;
                print_output(
                    &serde_json::json!({
                        "dry_run": true,
                        "would_delete": { "store": name, "index": index },
                        "record": record,
                    }),
                    &cli.format,
                )?;
            } else {
                let removed = store.delete(index)?;
                print_output(
                    &serde_json::json!({ "ok": true, "deleted": index, "record": removed }),
                    &cli.format,
                )?;
            }
        }

        Command::Destroy { name } => {
            let store = Store::open_in(&config, &name, OpenMode::Open)?;
            store.destroy()?;
            print_output(&serde_json::json!({ "ok": true, "destroyed": name }), &cli.format)?;
        }

        Command::List => {
            let names = config.list_stores()?;
            print_output(&serde_json::to_value(names)?, &cli.format)?;
        }

        Command::Kind { value } => {
            let json_val =
                serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            let kind = resolve_kind(&json_val);
            print_output(
                &serde_json::json!({ "value": json_val, "kind": kind }),
                &cli.format,
            )?;
        }
    }

    Ok(())
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Build a record from raw `key=value` strings, running each value through
/// the field helper for the kind the schema declares.
fn build_record(
    schema: &Schema,
    fields: &[(String, String)],
) -> Result<Record, Box<dyn std::error::Error>> {
    let mut record = Record::new();

    for (position, (key, raw)) in fields.iter().enumerate() {
        let kind = match schema.matching() {
            Matching::ByName => schema.get(key),
            Matching::ByPosition => schema.get_index(position).map(|(_, tag)| tag),
        }
        .ok_or_else(|| format!("Field '{key}' is not declared in the schema"))?;

        let text = serde_json::Value::String(raw.clone());
        let field = match kind {
            KindTag::String => recordstore::string(Some(text))?,
            KindTag::Char => recordstore::char(Some(text)),
            KindTag::Number => recordstore::number(Some(text))?,
            KindTag::Date => recordstore::date(Some(parse_date(raw)?)),
            KindTag::Error => {
                let err = std::io::Error::new(std::io::ErrorKind::Other, raw.clone());
                recordstore::error(Some(&err))
            }
        };
        record = record.with(key.clone(), field)?;
    }

    Ok(record)
}

/// Accepts `now`, RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`,
/// `YYYY-MM-DDTHH:MM:SS[.fff]` and `YYYY-MM-DD`, all as local time.
fn parse_date(raw: &str) -> Result<NaiveDateTime, String> {
    if raw == "now" {
        return Ok(Local::now().naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("Cannot parse '{raw}' as a date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(yaml: &str) -> Schema {
        recordstore::parse_schema_str(yaml).unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("name=Ann=B").unwrap(),
            ("name".to_string(), "Ann=B".to_string())
        );
        assert!(parse_key_value("name").is_err());
    }

    #[test]
    fn test_build_record_types_fields() {
        let schema = schema("fields:\n  name: string\n  age: number\n  initial: char\n");
        let record = build_record(
            &schema,
            &pairs(&[("name", "Ann"), ("age", "30"), ("initial", "A")]),
        )
        .unwrap();
        assert_eq!(record.get("age"), Some(&json!(30)));
        assert_eq!(record.get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn test_build_record_unknown_field() {
        let schema = schema("fields:\n  name: string\n");
        assert!(build_record(&schema, &pairs(&[("nickname", "A")])).is_err());
    }

    #[test]
    fn test_build_record_bad_number() {
        let schema = schema("fields:\n  age: number\n");
        assert!(build_record(&schema, &pairs(&[("age", "old")])).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(13, 45, 7)
            .unwrap();
        assert_eq!(parse_date("2024-03-15 13:45:07").unwrap(), expected);
        assert_eq!(parse_date("2024-03-15T13:45:07").unwrap(), expected);
        assert_eq!(
            parse_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_error_field_kind() {
        let schema = schema("fields:\n  cause: error\n");
        let record = build_record(&schema, &pairs(&[("cause", "timeout")])).unwrap();
        assert_eq!(
            resolve_kind(record.get("cause").unwrap()),
            KindTag::Error
        );
    }
}
