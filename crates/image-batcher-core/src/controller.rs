//! Per-item sequencing: set up, run every step, tidy up.

use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::ExecutionAgent;
use crate::config::Config;
use crate::error::Result;
use crate::file_manager::FileManager;
use crate::filesystem::FileSystem;
use crate::pathfinder::{PathFinder, Policy};
use crate::sequence::{self, Sequence, Strategy};
use crate::statics::StaticInfo;
use crate::types::{FileItem, FlagSet, PathInfo};

/// State every controller of a run reads but never writes
pub struct SharedControllerInfo<A> {
    pub strategy: Strategy,
    pub file_manager: FileManager,
    pub agent: A,

    /// Flags named explicitly on the command line
    pub command_line: FlagSet,

    pub cuddle: bool,
    pub output: Option<PathBuf>,
    pub trash: Option<PathBuf>,
}

impl<A: ExecutionAgent> SharedControllerInfo<A> {
    /// Resolve everything a run needs up front. Fails on any name that does not
    /// resolve, before a single file is touched.
    pub fn from_config(config: &Config, fs: Arc<dyn FileSystem>, agent: A) -> Result<Self> {
        let strategy = Strategy::resolve(config)?;
        let statics = Arc::new(StaticInfo::from_config(config));
        let finder = PathFinder::new(
            Arc::clone(&statics),
            Policy::from_config(config, strategy.arity()),
        );

        Ok(Self {
            file_manager: FileManager::new(fs, finder, statics, config.dry_run),
            strategy,
            agent,
            command_line: config.flags.clone(),
            cuddle: config.cuddle,
            output: config.output.clone(),
            trash: config.trash.clone(),
        })
    }
}

/// State belonging to the item a controller is currently handling
#[derive(Debug, Default)]
pub struct PrivateControllerInfo {
    pub pi: Option<PathInfo>,
}

/// Processes one item at a time. Not shareable between threads; each worker
/// takes its own from the [`ControllerRegistry`](crate::registry::ControllerRegistry).
pub struct Controller<A> {
    shared: Arc<SharedControllerInfo<A>>,
    private: PrivateControllerInfo,
}

impl<A: ExecutionAgent> Controller<A> {
    pub fn new(shared: Arc<SharedControllerInfo<A>>) -> Self {
        Self {
            shared,
            private: PrivateControllerInfo::default(),
        }
    }

    /// The path info of the last item handled, until the next reset
    pub fn current(&self) -> Option<&PathInfo> {
        self.private.pi.as_ref()
    }

    /// Clear per-item state so the controller can be reused
    pub fn reset(&mut self) {
        self.private = PrivateControllerInfo::default();
    }

    /// Build the path info for an item under this run's policy
    pub fn path_info(&self, item: &FileItem) -> PathInfo {
        let shared = &self.shared;
        let mut pi = PathInfo::new(item.clone());
        pi.scheme = shared.strategy.scheme().map(str::to_string);
        pi.profile = shared.strategy.profile().map(str::to_string);
        pi.cuddle = shared.cuddle;
        pi.output = shared.output.clone();
        pi.trash = shared.trash.clone();
        pi
    }

    /// The steps an item goes through, reading from `source`
    pub fn sequence(&self, source: PathBuf) -> Sequence<'_, A> {
        sequence::build(&self.shared, source)
    }

    /// Process one discovered item.
    ///
    /// Steps run in order and stop at the first failure. A failed item gets its
    /// relocated original back at its own path. The journal marker is removed
    /// whatever happens, so a failed item is reported, not retried.
    pub fn on_item(&mut self, item: &FileItem) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let manager = &shared.file_manager;
        let mut pi = self.path_info(item);

        let outcome = match manager.setup(&pi) {
            Ok(source) => {
                pi.source = source.clone();
                let outcome = run_sequence(&sequence::build(&shared, source.clone()), &mut pi);
                if outcome.is_err() {
                    if let Err(e) = manager.restore(&pi, &source) {
                        error!("Could not restore '{}': {}", item.path.display(), e);
                    }
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let tidied = manager.tidy(&pi);
        self.private.pi = Some(pi);

        match (outcome, tidied) {
            (Err(e), Err(tidy_error)) => {
                warn!("Tidy failed for '{}': {}", item.path.display(), tidy_error);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), tidied) => {
                if tidied.is_ok() {
                    info!("Processed '{}'", item.path.display());
                }
                tidied
            }
        }
    }
}

fn run_sequence<A: ExecutionAgent>(sequence: &Sequence<'_, A>, pi: &mut PathInfo) -> Result<()> {
    for (index, step) in sequence.iter().enumerate() {
        if let Err(e) = step.run(pi) {
            error!(
                "Step {}/{} failed for '{}': {}",
                index + 1,
                sequence.len(),
                pi.item.path.display(),
                e
            );
            return Err(e);
        }
    }
    Ok(())
}
