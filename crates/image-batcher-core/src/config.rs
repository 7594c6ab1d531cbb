use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::statics::RESERVED_PREFIX;
use crate::types::FlagSet;

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Which execution agent to use for invoking the external program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Invoke the real program
    Magick,

    /// Log invocations without running anything
    Dummy,

    /// Write empty, fake-labelled result files instead of running the program
    Fake,
}

/// Case folding applied to result file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    Lower,
    Upper,
}

/// How result file names have their extension mutated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionMapping {
    /// Case transforms, applied in order
    pub transforms: Vec<CaseTransform>,

    /// Suffix remap table, e.g. `jpeg -> jpg`. Keys match case-insensitively.
    pub remap: BTreeMap<String, String>,
}

/// Labels used to decorate relocated and generated files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub adhoc: String,
    pub legacy: String,
    pub trash: String,
    pub fake: String,
    pub journal: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            adhoc: "ADHOC".to_string(),
            legacy: "LEGACY".to_string(),
            trash: "TRASH".to_string(),
            fake: "FAKE".to_string(),
            journal: "journal".to_string(),
        }
    }
}

/// Only process a few files from each directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Number of files per directory
    pub files: usize,

    /// Take the last files in name order rather than the first
    #[serde(default)]
    pub last: bool,
}

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether to run without making changes
    pub dry_run: bool,

    /// Keep relocated originals and results in the source directory
    pub cuddle: bool,

    /// Where results go; when absent results replace their inputs in place
    pub output: Option<PathBuf>,

    /// Where displaced originals go; defaults to a labelled folder beside them
    pub trash: Option<PathBuf>,

    /// Named profile to apply
    pub profile: Option<String>,

    /// Named scheme (ordered list of profiles) to apply
    pub scheme: Option<String>,

    /// Sample a few files per directory instead of a full run
    pub sample: Option<Sample>,

    /// Maximum directory depth for scanning
    pub max_depth: Option<usize>,

    /// Number of worker threads (0 = auto, 1 = serial)
    pub workers: usize,

    /// Stop dispatching new items after the first failure
    pub abort_on_error: bool,

    /// Flags given explicitly on the command line; these win over profile flags
    pub flags: FlagSet,

    /// Named profiles
    pub profiles: BTreeMap<String, FlagSet>,

    /// Named schemes, each an ordered list of profile names
    pub schemes: BTreeMap<String, Vec<String>>,

    /// File decoration labels
    pub labels: Labels,

    /// Result file extension handling
    pub extensions: ExtensionMapping,

    /// Name or path of the external program
    pub program: String,

    /// Which agent invokes the program
    pub executor: ExecutorKind,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dry_run: false,
            cuddle: false,
            output: None,
            trash: None,
            profile: None,
            scheme: None,
            sample: None,
            max_depth: None,
            workers: 0, // Auto
            abort_on_error: false,
            flags: FlagSet::new(),
            profiles: BTreeMap::new(),
            schemes: BTreeMap::new(),
            labels: Labels::default(),
            extensions: ExtensionMapping::default(),
            program: "magick".to_string(),
            executor: ExecutorKind::Magick,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::fs("read config", path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Configuration(format!("could not parse {}: {}", path.display(), e))
        })
    }

    /// Save configuration as pretty printed JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("could not serialise: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::fs("create config dir", parent, e))?;
        }
        fs::write(path, text).map_err(|e| Error::fs("write config", path, e))
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-batcher").join("image-batcher.json"))
    }

    /// Look up a profile's stored flags
    pub fn profile(&self, name: &str) -> Option<&FlagSet> {
        self.profiles.get(name)
    }

    /// Look up a scheme's ordered profile names
    pub fn scheme(&self, name: &str) -> Option<&[String]> {
        self.schemes.get(name).map(Vec::as_slice)
    }

    /// Check the configuration is usable before anything touches the file system
    pub fn validate(&self) -> Result<()> {
        if self.profile.is_some() && self.scheme.is_some() {
            return Err(Error::Configuration(
                "a profile and a scheme cannot both be active".to_string(),
            ));
        }

        for (scheme, profiles) in &self.schemes {
            if profiles.is_empty() {
                return Err(Error::Configuration(format!(
                    "scheme '{}' has no profiles",
                    scheme
                )));
            }
            if let Some(missing) = profiles.iter().find(|p| !self.profiles.contains_key(*p)) {
                return Err(Error::UnknownProfile(missing.clone()));
            }
        }

        if let Some(name) = &self.profile {
            if self.profile(name).is_none() {
                return Err(Error::UnknownProfile(name.clone()));
            }
        }

        if let Some(name) = &self.scheme {
            if self.scheme(name).is_none() {
                return Err(Error::UnknownScheme(name.clone()));
            }
        }

        let labels = [
            ("adhoc", &self.labels.adhoc),
            ("legacy", &self.labels.legacy),
            ("trash", &self.labels.trash),
            ("fake", &self.labels.fake),
            ("journal", &self.labels.journal),
        ];
        for (which, label) in labels {
            if label.is_empty()
                || label.starts_with(RESERVED_PREFIX)
                || label.contains(['/', '\\'])
            {
                return Err(Error::Configuration(format!(
                    "invalid {} label: '{}'",
                    which, label
                )));
            }
        }

        if matches!(self.sample, Some(Sample { files: 0, .. })) {
            return Err(Error::Configuration(
                "sample must include at least one file".to_string(),
            ));
        }

        if self.program.is_empty() {
            return Err(Error::Configuration("program must not be empty".to_string()));
        }

        Ok(())
    }
}

// -- Tests --
