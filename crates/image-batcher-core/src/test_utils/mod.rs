use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::agent::ExecutionAgent;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filesystem::{FileSystem, MemoryFs};
use crate::types::FlagSet;

pub const ROOT: &str = "/photos";

/// One recorded call to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub flags: FlagSet,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Records invocations and writes an empty result into a memory file system.
/// Fails any invocation whose destination passes through the `failing` folder.
pub struct RecordingAgent {
    fs: Arc<MemoryFs>,
    failing: Option<String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl RecordingAgent {
    pub fn new(fs: Arc<MemoryFs>) -> Self {
        Self {
            fs,
            failing: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, folder: &str) -> Self {
        self.failing = Some(folder.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ExecutionAgent for RecordingAgent {
    fn is_installed(&self) -> bool {
        true
    }

    fn invoke(&self, flags: &FlagSet, source: &Path, destination: &Path) -> Result<()> {
        self.invocations.lock().unwrap().push(Invocation {
            flags: flags.clone(),
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });

        if let Some(folder) = &self.failing {
            if destination.components().any(|c| c.as_os_str() == folder.as_str()) {
                return Err(Error::ProgramFailed {
                    program: "recording".to_string(),
                    source_path: source.to_path_buf(),
                    code: Some(1),
                });
            }
        }
        self.fs.create(destination, true)?;
        Ok(())
    }
}

/// Configuration with a few profiles and schemes to sample with
pub fn sampling_config() -> Config {
    let mut config = Config::default();
    config.profiles.insert(
        "blur".to_string(),
        FlagSet::new().with("gaussian-blur", "0.05").with("quality", "80"),
    );
    config
        .profiles
        .insert("sf".to_string(), FlagSet::new().with("sampling-factor", "4:2:0"));
    config
        .profiles
        .insert("adaptive".to_string(), FlagSet::new().with("adaptive-resize", "50%"));
    config.schemes.insert(
        "blur-sf".to_string(),
        vec!["blur".to_string(), "sf".to_string()],
    );
    config.schemes.insert(
        "trio".to_string(),
        vec!["adaptive".to_string(), "blur".to_string(), "sf".to_string()],
    );
    config
}

/// Absolute path of a file below [`ROOT`]
pub fn photo(relative: &str) -> PathBuf {
    Path::new(ROOT).join(relative)
}
