use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Schema type error: {0}")]
    SchemaType(String),

    #[error("Index {index} out of range for store of {len} records")]
    Index { index: usize, len: usize },

    #[error("Invalid store name: {0:?}")]
    InvalidName(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StoreError {
    /// True for failures of the backing file itself (missing, unreadable,
    /// undeletable, unlockable).
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
