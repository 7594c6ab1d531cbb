use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the image-batcher library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file system operation failed on a specific path
    #[error("{operation} failed for {}: {source}", path.display())]
    FileSystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The file to be relocated is not where discovery found it
    #[error("Source missing: {0}")]
    SourceMissing(PathBuf),

    /// Refusing to overwrite an existing file
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The journal marker for an item was not found during tidy up
    #[error("Journal marker missing: {0}")]
    JournalMissing(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A profile name that does not resolve in the configuration
    #[error("Unknown profile: '{0}'")]
    UnknownProfile(String),

    /// A scheme name that does not resolve in the configuration
    #[error("Unknown scheme: '{0}'")]
    UnknownScheme(String),

    /// The external program could not be found
    #[error("Program not installed: {0}")]
    ProgramNotInstalled(String),

    /// The external program ran but reported failure
    #[error("{program} failed on {} (exit code: {code:?})", source_path.display())]
    ProgramFailed {
        program: String,
        source_path: PathBuf,
        code: Option<i32>,
    },

    /// The worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The run was cancelled before the item was dispatched
    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error means the configuration is unusable, rather than an
    /// individual item failing
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::UnknownProfile(_) | Self::UnknownScheme(_)
        )
    }

    pub(crate) fn fs(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            operation,
            path: path.into(),
            source,
        }
    }
}
