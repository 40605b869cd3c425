pub mod config;
pub mod error;
pub mod fields;
pub mod files;
pub mod kind;
pub mod record;
pub mod schema;
pub mod store;
pub mod validation;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use fields::{char, date, error, number, string, DateValue, Field};
pub use files::{DiskFiles, FileAccess, MemoryFiles};
pub use kind::{resolve_kind, KindTag};
pub use record::Record;
pub use schema::{parse_schema, parse_schema_str, Matching, Schema};
pub use store::{AddStatus, OpenMode, PendingAdd, Store};
