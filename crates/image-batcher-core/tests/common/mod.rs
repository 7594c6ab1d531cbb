#![allow(dead_code)]

use image_batcher_core::{Error, ExecutionAgent, FlagSet, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// One call seen by the agent, with what was on disk at that moment
#[derive(Debug, Clone)]
pub struct Call {
    pub flags: FlagSet,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Journal markers present in the source item's directory during the call
    pub markers: Vec<PathBuf>,
}

/// Stands in for the image program: copies source to destination on disk
#[derive(Default)]
pub struct CopyAgent {
    calls: Mutex<Vec<Call>>,
}

impl CopyAgent {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ExecutionAgent for CopyAgent {
    fn is_installed(&self) -> bool {
        true
    }

    fn invoke(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Result<()> {
        let markers = destination
            .parent()
            .map(markers_in)
            .unwrap_or_default();
        self.calls.lock().unwrap().push(Call {
            flags: flags.clone(),
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            markers,
        });
        fs::copy(source, destination)?;
        Ok(())
    }
}

/// An image program that fails on every file
pub struct FailingAgent;

impl ExecutionAgent for FailingAgent {
    fn is_installed(&self) -> bool {
        true
    }

    fn invoke(&self, _flags: &FlagSet, source: &Path, _destination: &Path) -> Result<()> {
        Err(Error::ProgramFailed {
            program: "failing".to_string(),
            source_path: source.to_path_buf(),
            code: Some(1),
        })
    }
}

/// Journal markers directly inside `dir`
pub fn markers_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut markers: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(".$journal.txt"))
        .collect();
    markers.sort();
    markers
}

/// A scan folder holding `count` small fake JPEGs named `IMG_01.jpg`...
pub fn scan_tree(count: usize) -> (TempDir, PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let scan = root.path().join("scan-01");
    fs::create_dir_all(&scan).unwrap();
    for i in 1..=count {
        fs::write(scan.join(format!("IMG_{:02}.jpg", i)), format!("image {}", i)).unwrap();
    }
    (root, scan)
}

/// Every file below `dir`, relative to it, sorted
pub fn snapshot(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}
