//! Core functionality for batch processing image trees with an external program.
//!
//! This library provides:
//! - File discovery and per-directory sampling
//! - Path resolution for results and relocated originals
//! - Journal markers for crash-safe, non-destructive runs
//! - Parallel dispatch through a pool of controllers

// -- External Dependencies --

use crossbeam::channel::Sender;
use log::{info, warn};
use rayon::prelude::*;

// -- Standard Library --
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use agent::{Agent, ExecutionAgent};
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod agent;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod file_manager;
pub mod filesystem;
pub mod logging;
pub mod pathfinder;
pub mod registry;
pub mod sequence;
pub mod statics;
pub mod types;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;

use controller::SharedControllerInfo;
use filesystem::{FileSystem, NativeFs};
use registry::ControllerRegistry;

/// What happened to a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    /// Carries the error message; the error itself lands in the summary
    Failed(String),
    /// Left alone because a marker from an earlier run is still present
    Skipped,
    /// Never dispatched because the run was stopped
    Cancelled,
}

/// Events sent to an observer while a run progresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Started { total: usize },
    Item { path: PathBuf, outcome: Outcome },
    Finished,
}

/// The result of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub processed: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub cancelled: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl RunSummary {
    /// True when every dispatched item went through
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }
}

/// Main entry point for a batch run
pub struct ImageBatcher<A: ExecutionAgent = Agent> {
    config: Config,
    shared: Arc<SharedControllerInfo<A>>,
    cancel: Arc<AtomicBool>,
}

impl ImageBatcher<Agent> {
    /// Create a batcher running the configured program on the real file system.
    ///
    /// Fails if the configuration does not validate or names a profile or
    /// scheme that does not exist. When the program is unavailable the run
    /// degrades to a dry run.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;

        let fs: Arc<dyn FileSystem> = Arc::new(NativeFs);
        let agent = Agent::resolve(&config, Arc::clone(&fs), &config.labels.fake);
        if agent.is_dummy() && !config.dry_run {
            info!("No program will run; nothing on disk will change");
            config.dry_run = true;
        }

        Self::with_agent(config, fs, agent)
    }
}

impl<A: ExecutionAgent + 'static> ImageBatcher<A> {
    /// Create a batcher around an explicit file system and agent
    pub fn with_agent(config: Config, fs: Arc<dyn FileSystem>, agent: A) -> Result<Self> {
        config.validate()?;
        let shared = SharedControllerInfo::from_config(&config, fs, agent)?;

        Ok(Self {
            config,
            shared: Arc::new(shared),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn agent(&self) -> &A {
        &self.shared.agent
    }

    /// Setting this flag stops dispatching new items; items in flight finish
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Discover the items of a run, sampled per directory when configured
    pub fn discover(&self, root: &Path) -> Result<Vec<FileItem>> {
        let statics = self.shared.file_manager.statics();
        let items = discovery::discover_images(root, &self.config, statics)?;

        let Some(sample) = self.config.sample else {
            return Ok(items);
        };
        Ok(discovery::group_by_directory(items)
            .into_iter()
            .flat_map(|(_, group)| discovery::sample(group, &sample))
            .collect())
    }

    /// Run the whole batch below `root`.
    ///
    /// Directories are handled one after the other: every item of a directory
    /// is marked before any of them is dispatched to the worker pool.
    pub fn run(&self, root: &Path, progress: Option<Sender<Progress>>) -> Result<RunSummary> {
        let start_time = Instant::now();
        let notify = |event: Progress| {
            if let Some(tx) = &progress {
                // The observer going away must not stop the run
                let _ = tx.send(event);
            }
        };

        info!("Discovering images in {}...", root.display());
        let items = self.discover(root)?;
        info!("Found {} images", items.len());

        let mut summary = RunSummary {
            discovered: items.len(),
            ..Default::default()
        };
        notify(Progress::Started { total: items.len() });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers())
            .thread_name(|i| format!("batch-worker-{}", i))
            .build()?;
        let registry = ControllerRegistry::for_shared(Arc::clone(&self.shared));
        let manager = &self.shared.file_manager;
        let aborted = AtomicBool::new(false);

        for (directory, group) in discovery::group_by_directory(items) {
            if self.is_stopped(&aborted) {
                for item in group {
                    notify(item_event(&item, Outcome::Cancelled));
                    summary.cancelled.push(item.path);
                }
                continue;
            }

            let mut pending = Vec::with_capacity(group.len());
            for item in group {
                if manager.is_marked(&item) {
                    warn!("Skipping '{}': journal marker present", item.path.display());
                    notify(item_event(&item, Outcome::Skipped));
                    summary.skipped.push(item.path);
                    continue;
                }
                match manager.mark(&item) {
                    Ok(_) => pending.push(item),
                    Err(e) => {
                        notify(item_event(&item, Outcome::Failed(e.to_string())));
                        summary.failed.push((item.path, e));
                    }
                }
            }
            info!(
                "Processing {} items in {}",
                pending.len(),
                directory.display()
            );

            let results: Vec<(PathBuf, Result<()>)> = pool.install(|| {
                pending
                    .par_iter()
                    .map(|item| {
                        if self.is_stopped(&aborted) {
                            if let Err(e) = manager.unmark(item) {
                                warn!("Could not withdraw marker: {}", e);
                            }
                            notify(item_event(item, Outcome::Cancelled));
                            return (item.path.clone(), Err(Error::Cancelled));
                        }

                        let result = registry.acquire().on_item(item);
                        let outcome = match &result {
                            Ok(()) => Outcome::Processed,
                            Err(e) => {
                                if self.config.abort_on_error {
                                    aborted.store(true, Ordering::SeqCst);
                                }
                                Outcome::Failed(e.to_string())
                            }
                        };
                        notify(item_event(item, outcome));
                        (item.path.clone(), result)
                    })
                    .collect()
            });

            for (path, result) in results {
                match result {
                    Ok(()) => summary.processed.push(path),
                    Err(Error::Cancelled) => summary.cancelled.push(path),
                    Err(e) => summary.failed.push((path, e)),
                }
            }
        }

        notify(Progress::Finished);
        info!(
            "Run complete in {:.1}s: {} processed, {} failed, {} skipped, {} cancelled ({} controllers)",
            start_time.elapsed().as_secs_f64(),
            summary.processed.len(),
            summary.failed.len(),
            summary.skipped.len(),
            summary.cancelled.len(),
            registry.created()
        );

        Ok(summary)
    }

    fn workers(&self) -> usize {
        match self.config.workers {
            0 => num_cpus::get(),
            n => n,
        }
    }

    fn is_stopped(&self, aborted: &AtomicBool) -> bool {
        self.cancel.load(Ordering::SeqCst) || aborted.load(Ordering::SeqCst)
    }
}

fn item_event(item: &FileItem, outcome: Outcome) -> Progress {
    Progress::Item {
        path: item.path.clone(),
        outcome,
    }
}
