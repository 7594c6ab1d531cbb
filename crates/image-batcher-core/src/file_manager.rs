//! Physical preparation and clean up around the processing of one item.
//!
//! The file manager is the only part of the engine that mutates the file
//! system; in dry-run mode it computes the same paths and touches nothing.

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::logging::{log_file_error, log_fs_modification};
use crate::pathfinder::PathFinder;
use crate::statics::StaticInfo;
use crate::types::{FileItem, PathInfo};

pub struct FileManager {
    fs: Arc<dyn FileSystem>,
    finder: PathFinder,
    statics: Arc<StaticInfo>,
    dry_run: bool,
}

impl FileManager {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        finder: PathFinder,
        statics: Arc<StaticInfo>,
        dry_run: bool,
    ) -> Self {
        Self {
            fs,
            finder,
            statics,
            dry_run,
        }
    }

    pub fn finder(&self) -> &PathFinder {
        &self.finder
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn statics(&self) -> &StaticInfo {
        &self.statics
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Create an empty file, refusing to replace one unless `overwrite` is set
    pub fn create(&self, path: &Path, overwrite: bool) -> Result<()> {
        self.fs.create(path, overwrite).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::DestinationExists(path.to_path_buf()),
            _ => Error::fs("create", path, e),
        })
    }

    /// Whether an item already carries a journal marker
    pub fn is_marked(&self, item: &FileItem) -> bool {
        self.fs.file_exists(&self.statics.meta.marker_for(item))
    }

    /// Flag an item as in progress by creating its journal marker
    pub fn mark(&self, item: &FileItem) -> Result<PathBuf> {
        let marker = self.statics.meta.marker_for(item);
        if self.dry_run {
            return Ok(marker);
        }
        self.create(&marker, false)?;
        debug!("Journal marker created: {}", marker.display());
        Ok(marker)
    }

    /// Withdraw the marker of an item that will not be processed after all
    pub fn unmark(&self, item: &FileItem) -> Result<()> {
        let marker = self.statics.meta.marker_for(item);
        if self.dry_run || !self.fs.file_exists(&marker) {
            return Ok(());
        }
        self.fs
            .remove(&marker)
            .map_err(|e| Error::fs("remove journal", &marker, e))
    }

    /// Move the original out of the way of its result, returning the path the
    /// external program should read from.
    pub fn setup(&self, pi: &PathInfo) -> Result<PathBuf> {
        if !self.finder.is_transparent() {
            return Ok(pi.item.path.clone());
        }

        let Some(transfer) = self.finder.transfer(pi) else {
            return Ok(pi.item.path.clone());
        };
        let destination = transfer.path();

        if self.dry_run {
            debug!(
                "[dry-run] would move {} -> {}",
                pi.item.path.display(),
                destination.display()
            );
            return Ok(destination);
        }

        self.fs
            .mkdir_all(&transfer.folder)
            .map_err(|e| Error::fs("create directory", &transfer.folder, e))?;

        if !self.fs.file_exists(&pi.item.path) {
            return Err(Error::SourceMissing(pi.item.path.clone()));
        }
        if self.fs.file_exists(&destination) {
            return Err(Error::DestinationExists(destination));
        }

        self.fs.rename(&pi.item.path, &destination).map_err(|e| {
            log_file_error(&pi.item.path, "rename", &e);
            Error::fs("rename", &pi.item.path, e)
        })?;
        log_fs_modification(
            "rename",
            &pi.item.path,
            Some(&format!("to {}", destination.display())),
        );

        Ok(destination)
    }

    /// Put a relocated original back where it was found.
    ///
    /// Used when an item's sequence fails. If a result already occupies the
    /// item's path the original stays sheltered and nothing is overwritten.
    pub fn restore(&self, pi: &PathInfo, relocated: &Path) -> Result<()> {
        let original = &pi.item.path;
        if self.dry_run || relocated == original.as_path() {
            return Ok(());
        }
        if self.fs.file_exists(original) {
            warn!(
                "Leaving original at {}: {} is occupied",
                relocated.display(),
                original.display()
            );
            return Ok(());
        }
        if !self.fs.file_exists(relocated) {
            return Err(Error::SourceMissing(relocated.to_path_buf()));
        }

        self.fs.rename(relocated, original).map_err(|e| {
            log_file_error(relocated, "restore", &e);
            Error::fs("restore", relocated, e)
        })?;
        log_fs_modification(
            "restore",
            relocated,
            Some(&format!("to {}", original.display())),
        );
        Ok(())
    }

    /// Make sure a result folder exists before the program writes into it
    pub fn ensure_folder(&self, folder: &Path) -> Result<()> {
        if self.dry_run || self.fs.directory_exists(folder) {
            return Ok(());
        }
        self.fs
            .mkdir_all(folder)
            .map_err(|e| Error::fs("create directory", folder, e))?;
        log_fs_modification("mkdir", folder, None);
        Ok(())
    }

    /// Remove the item's journal marker once its sequence has run
    pub fn tidy(&self, pi: &PathInfo) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }

        let marker = self.statics.meta.marker_for(&pi.item);
        if !self.fs.file_exists(&marker) {
            return Err(Error::JournalMissing(marker));
        }
        self.fs
            .remove(&marker)
            .map_err(|e| Error::fs("remove journal", &marker, e))?;
        debug!("Journal marker removed: {}", marker.display());
        Ok(())
    }
}
