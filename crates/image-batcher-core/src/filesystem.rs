//! Minimal file system surface used by the file manager.
//!
//! `NativeFs` talks to the disk; `MemoryFs` keeps everything in memory so
//! orchestration can be tested deterministically.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub trait FileSystem: Send + Sync {
    fn file_exists(&self, path: &Path) -> bool;

    fn directory_exists(&self, path: &Path) -> bool;

    /// Create an empty file. Fails with `AlreadyExists` unless `overwrite` is set.
    fn create(&self, path: &Path, overwrite: bool) -> io::Result<()>;

    fn mkdir_all(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real file system
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFs;

impl FileSystem for NativeFs {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create(&self, path: &Path, overwrite: bool) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        options.open(path).map(|_| ())
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
}

/// An in-memory file system holding only names, no content
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryState>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed files (and their parent directories)
    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let memfs = Self::new();
        {
            let mut state = memfs.lock();
            for file in files {
                let file = file.as_ref();
                if let Some(parent) = file.parent() {
                    insert_dirs(&mut state.dirs, parent);
                }
                state.files.insert(file.to_path_buf());
            }
        }
        memfs
    }

    /// Every file currently present, in path order
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock().files.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the sets half updated
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn insert_dirs(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

impl FileSystem for MemoryFs {
    fn file_exists(&self, path: &Path) -> bool {
        self.lock().files.contains(path)
    }

    fn directory_exists(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }

    fn create(&self, path: &Path, overwrite: bool) -> io::Result<()> {
        let mut state = self.lock();
        if !overwrite && state.files.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", path.display()),
            ));
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) => {
                Err(not_found(parent))
            }
            _ => {
                state.files.insert(path.to_path_buf());
                Ok(())
            }
        }
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        insert_dirs(&mut self.lock().dirs, path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if !state.files.contains(from) {
            return Err(not_found(from));
        }
        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                return Err(not_found(parent));
            }
        }
        state.files.remove(from);
        state.files.insert(to.to_path_buf());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if self.lock().files.remove(path) {
            Ok(())
        } else {
            Err(not_found(path))
        }
    }
}
