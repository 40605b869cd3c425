use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::files::{DiskFiles, FileAccess, FileLock};
use crate::record::Record;
use crate::schema::Schema;
use crate::validation;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Status code reported for a successful append.
pub const STATUS_OK: u16 = 200;

/// How [`Store::open_in`] treats the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Use an existing file. Existence is checked on first access.
    Open,
    /// Allocate a new empty store; fail if the file already exists.
    Create,
    /// Allocate a new empty store, discarding any existing file.
    CreateOrTruncate,
}

/// Outcome of a successful append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddStatus {
    pub code: u16,
    /// Index of the appended record.
    pub position: usize,
}

/// A named store of records backed by one JSON array file.
///
/// Every write rewrites the whole file. Writers are serialized by a lock
/// shared between clones of the same `Store` and, on disk, by an exclusive
/// lock on the file itself.
#[derive(Debug, Clone)]
pub struct Store {
    name: String,
    schema: Schema,
    backing: Backing,
}

impl Store {
    /// Open (`create == false`) or create-or-truncate (`create == true`) the
    /// store `name` in the directory given by the environment.
    pub fn new(name: &str, create: bool) -> Result<Self> {
        let mode = if create {
            OpenMode::CreateOrTruncate
        } else {
            OpenMode::Open
        };
        Self::open_in(&StoreConfig::from_env(), name, mode)
    }

    /// Open or create a store on the local filesystem.
    pub fn open_in(config: &StoreConfig, name: &str, mode: OpenMode) -> Result<Self> {
        Self::open_with(Arc::new(DiskFiles), config, name, mode)
    }

    /// Open or create a store on any [`FileAccess`] backend.
    pub fn open_with(
        files: Arc<dyn FileAccess>,
        config: &StoreConfig,
        name: &str,
        mode: OpenMode,
    ) -> Result<Self> {
        let path = config.store_path(name)?;
        let store = Store {
            name: name.to_string(),
            schema: Schema::new(),
            backing: Backing {
                path,
                files,
                writer: Arc::new(Mutex::new(())),
            },
        };

        match mode {
            OpenMode::Open => {}
            OpenMode::Create => store.create(false)?,
            OpenMode::CreateOrTruncate => store.create(true)?,
        }

        Ok(store)
    }

    fn create(&self, overwrite: bool) -> Result<()> {
        let _guard = self.backing.writer_guard();
        self.backing
            .files
            .create(&self.backing.path, b"[]", overwrite)?;
        log::info!(
            "Created store '{}' at {}",
            self.name,
            self.backing.path.display()
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.backing.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    pub fn exists(&self) -> bool {
        self.backing.files.exists(&self.backing.path)
    }

    /// All records, in file order.
    pub fn get(&self) -> Result<Vec<Record>> {
        self.backing.exclusive(|lock| self.backing.read_records(lock))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.get()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Validate `record` and append it in the background.
    ///
    /// A schema mismatch is returned here, before any I/O. Otherwise
    /// `on_complete` is called exactly once from the worker thread with the
    /// outcome of the write.
    pub fn add<F>(&self, record: Record, on_complete: F) -> Result<PendingAdd>
    where
        F: FnOnce(Result<AddStatus>) + Send + 'static,
    {
        validation::ensure_valid(&self.schema, &record)?;

        let backing = self.backing.clone();
        let handle = std::thread::Builder::new()
            .name(format!("recordstore-add-{}", self.name))
            .spawn(move || {
                let result = backing.append(record);
                if let Err(e) = &result {
                    log::warn!("Append to {} failed: {}", backing.path.display(), e);
                }
                on_complete(result);
            })?;

        Ok(PendingAdd { handle })
    }

    /// Validate `record` and append it, blocking until the file is written.
    pub fn append(&self, record: Record) -> Result<AddStatus> {
        validation::ensure_valid(&self.schema, &record)?;
        self.backing.append(record)
    }

    /// Remove and return the record at `index`. An out-of-range index is an
    /// error and leaves the file untouched.
    pub fn delete(&self, index: usize) -> Result<Record> {
        self.backing.exclusive(|lock| {
            let mut records = self.backing.read_records(lock)?;
            if index >= records.len() {
                return Err(StoreError::Index {
                    index,
                    len: records.len(),
                });
            }
            let removed = records.remove(index);
            self.backing.write_records(lock, &records)?;
            log::debug!(
                "Deleted record {} from {} ({} left)",
                index,
                self.backing.path.display(),
                records.len()
            );
            Ok(removed)
        })
    }

    /// Delete the backing file once no writer holds it. Fails if it is
    /// already gone.
    pub fn destroy(self) -> Result<()> {
        self.backing
            .exclusive(|_lock| Ok(self.backing.files.remove(&self.backing.path)?))?;
        log::info!(
            "Destroyed store '{}' at {}",
            self.name,
            self.backing.path.display()
        );
        Ok(())
    }
}

/// Handle to an append running in the background.
#[derive(Debug)]
pub struct PendingAdd {
    handle: JoinHandle<()>,
}

impl PendingAdd {
    /// Block until the write finished and the completion handler returned.
    pub fn wait(self) -> Result<()> {
        self.handle.join().map_err(|_| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "append worker panicked",
            ))
        })
    }
}

/// The backing file plus the lock that serializes its writers.
#[derive(Debug, Clone)]
struct Backing {
    path: PathBuf,
    files: Arc<dyn FileAccess>,
    writer: Arc<Mutex<()>>,
}

impl Backing {
    fn writer_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with both the in-process and the file lock held.
    fn exclusive<T>(&self, f: impl FnOnce(&mut FileLock) -> Result<T>) -> Result<T> {
        let _guard = self.writer_guard();
        let mut lock = self.files.lock(&self.path)?;
        f(&mut lock)
    }

    fn read_records(&self, lock: &mut FileLock) -> Result<Vec<Record>> {
        let content = self.files.read(lock, &self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Record> = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn write_records(&self, lock: &mut FileLock, records: &[Record]) -> Result<()> {
        let json = serde_json::to_vec(records)?;
        self.files.write(lock, &self.path, &json)?;
        Ok(())
    }

    fn append(&self, record: Record) -> Result<AddStatus> {
        self.exclusive(|lock| {
            let mut records = self.read_records(lock)?;
            records.push(record);
            self.write_records(lock, &records)?;
            let position = records.len() - 1;
            log::debug!(
                "Appended record {} to {}",
                position,
                self.path.display()
            );
            Ok(AddStatus {
                code: STATUS_OK,
                position,
            })
        })
    }
}
