//! The seam to the external image program.

use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::config::{Config, ExecutorKind};
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::pathfinder::decorate;
use crate::types::FlagSet;

/// Runs one invocation of the external program
pub trait ExecutionAgent: Send + Sync {
    /// Whether the program can be run at all
    fn is_installed(&self) -> bool;

    /// Blocking invocation reading `source` and writing `destination`
    fn invoke(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Result<()>;
}

/// Invokes ImageMagick: `magick <source> <flags...> <destination>`
#[derive(Debug, Clone)]
pub struct MagickAgent {
    program: String,
}

impl MagickAgent {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(source).args(flags.to_args()).arg(destination);
        command
    }
}

impl ExecutionAgent for MagickAgent {
    fn is_installed(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn invoke(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Result<()> {
        let mut command = self.command(flags, source, destination);
        debug!("Invoking {:?}", command);

        let output = command.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ProgramNotInstalled(self.program.clone()),
            _ => Error::Io(e),
        })?;

        if output.status.success() {
            Ok(())
        } else {
            warn!(
                "{} failed on '{}': {}",
                self.program,
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Err(Error::ProgramFailed {
                program: self.program.clone(),
                source_path: source.to_path_buf(),
                code: output.status.code(),
            })
        }
    }
}

/// Writes an empty result, decorated with the fake label, in place of running
/// the program
pub struct FakeAgent {
    fs: Arc<dyn FileSystem>,
    label: String,
}

impl FakeAgent {
    pub fn new(fs: Arc<dyn FileSystem>, label: impl Into<String>) -> Self {
        Self {
            fs,
            label: label.into(),
        }
    }

    /// The file a fake invocation writes for `destination`
    pub fn fake_destination(&self, destination: &Path) -> PathBuf {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        destination.with_file_name(decorate(&name, &[self.label.as_str()]))
    }
}

impl ExecutionAgent for FakeAgent {
    fn is_installed(&self) -> bool {
        true
    }

    fn invoke(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Result<()> {
        let fake = self.fake_destination(destination);
        debug!(
            "[fake] {} {:?} -> {}",
            source.display(),
            flags.to_args(),
            fake.display()
        );
        self.fs
            .create(&fake, true)
            .map_err(|e| Error::fs("create fake result", &fake, e))
    }
}

/// The agent chosen for a run
pub enum Agent {
    Magick(MagickAgent),
    Dummy,
    Fake(FakeAgent),
}

impl Agent {
    /// Pick the agent once, at start up. A dry run always gets the dummy; a
    /// missing program falls back to it.
    pub fn resolve(config: &Config, fs: Arc<dyn FileSystem>, fake_label: &str) -> Self {
        if config.dry_run {
            return Agent::Dummy;
        }

        match config.executor {
            ExecutorKind::Dummy => Agent::Dummy,
            ExecutorKind::Fake => Agent::Fake(FakeAgent::new(fs, fake_label)),
            ExecutorKind::Magick => {
                let magick = MagickAgent::new(config.program.as_str());
                if magick.is_installed() {
                    Agent::Magick(magick)
                } else {
                    warn!(
                        "'{}' is not installed; falling back to a dry run",
                        config.program
                    );
                    Agent::Dummy
                }
            }
        }
    }

    /// The dummy does nothing, so the run must not move files either
    pub fn is_dummy(&self) -> bool {
        matches!(self, Agent::Dummy)
    }
}

impl ExecutionAgent for Agent {
    fn is_installed(&self) -> bool {
        match self {
            Agent::Magick(magick) => magick.is_installed(),
            Agent::Dummy => true,
            Agent::Fake(fake) => fake.is_installed(),
        }
    }

    fn invoke(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Result<()> {
        match self {
            Agent::Magick(magick) => magick.invoke(flags, source, destination),
            Agent::Dummy => {
                info!(
                    "[dry-run] {} {:?} -> {}",
                    source.display(),
                    flags.to_args(),
                    destination.display()
                );
                Ok(())
            }
            Agent::Fake(fake) => fake.invoke(flags, source, destination),
        }
    }
}
