// File access - the open/read/write/remove surface the store runs on

use fs2::FileExt;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Operations the store needs from wherever its backing file lives.
///
/// Reads and writes of an existing file go through the guard returned by
/// [`FileAccess::lock`], so a backend that locks a handle does its I/O on
/// that same handle.
pub trait FileAccess: Send + Sync + fmt::Debug {
    /// Allocate `path` holding `contents`. With `overwrite` false an existing
    /// file is an `AlreadyExists` error; with it true the file is truncated
    /// under the same lock writers take.
    fn create(&self, path: &Path, contents: &[u8], overwrite: bool) -> io::Result<()>;

    /// Take an exclusive lock on an existing file, held until the guard drops.
    fn lock(&self, path: &Path) -> io::Result<FileLock>;

    /// Whole contents of the locked file.
    fn read(&self, lock: &mut FileLock, path: &Path) -> io::Result<String>;

    /// Replace the contents of the locked file.
    fn write(&self, lock: &mut FileLock, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// Guard for [`FileAccess::lock`].
#[derive(Debug)]
pub struct FileLock {
    file: Option<File>,
}

impl FileLock {
    /// A lock with nothing to release, for backends that rely on the
    /// store's in-process writer lock alone.
    pub fn unheld() -> Self {
        FileLock { file: None }
    }

    fn held_file(&mut self, path: &Path) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("No lock held on {}", path.display()),
            )
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.unlock();
        }
    }
}

/// The local filesystem. Locks are advisory `flock`-style locks on the data
/// file itself, so writes go in place rather than through a rename.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFiles;

impl FileAccess for DiskFiles {
    fn create(&self, path: &Path, contents: &[u8], overwrite: bool) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if overwrite {
            // Truncate only once the lock is ours
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?;
            file.lock_exclusive()?;
            let mut lock = FileLock { file: Some(file) };
            return self.write(&mut lock, path, contents);
        }

        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }

    fn lock(&self, path: &Path) -> io::Result<FileLock> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        file.lock_exclusive()?;
        // Removed while we waited for the lock
        if !path.is_file() {
            return Err(not_found(path));
        }
        Ok(FileLock { file: Some(file) })
    }

    fn read(&self, lock: &mut FileLock, path: &Path) -> io::Result<String> {
        let file = lock.held_file(path)?;
        file.seek(SeekFrom::Start(0))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(contents)
    }

    fn write(&self, lock: &mut FileLock, path: &Path, contents: &[u8]) -> io::Result<()> {
        let file = lock.held_file(path)?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(contents)?;
        file.sync_all()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Files kept in memory. Useful for tests and for hosts without a writable
/// filesystem.
#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for MemoryFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<PathBuf> = self.files().keys().cloned().collect();
        f.debug_struct("MemoryFiles").field("paths", &paths).finish()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("No such file: {}", path.display()),
    )
}

impl FileAccess for MemoryFiles {
    fn create(&self, path: &Path, contents: &[u8], overwrite: bool) -> io::Result<()> {
        let mut files = self.files();
        if !overwrite && files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("File exists: {}", path.display()),
            ));
        }
        files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn lock(&self, path: &Path) -> io::Result<FileLock> {
        if self.exists(path) {
            Ok(FileLock::unheld())
        } else {
            Err(not_found(path))
        }
    }

    fn read(&self, _lock: &mut FileLock, path: &Path) -> io::Result<String> {
        let bytes = self.files().get(path).cloned().ok_or_else(|| not_found(path))?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write(&self, _lock: &mut FileLock, path: &Path, contents: &[u8]) -> io::Result<()> {
        match self.files().get_mut(path) {
            Some(existing) => {
                *existing = contents.to_vec();
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.files().remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files().contains_key(path)
    }
}
