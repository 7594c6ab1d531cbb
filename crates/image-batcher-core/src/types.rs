use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported image formats
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Tiff,
    Webp,
    Gif,
    Heic,
    Other(String),
}

impl ImageFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "tif" | "tiff" => Self::Tiff,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            "heic" => Self::Heic,
            other => Self::Other(other.to_string()),
        }
    }

    /// Check if format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// A discovered image file, identified relative to the traversal root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// Full path to the image file
    pub path: PathBuf,

    /// File name including extension
    pub name: String,

    /// Directory containing the file
    pub parent: PathBuf,

    /// Parent directory relative to the traversal root (empty at the root)
    pub sub_path: PathBuf,

    /// Image format
    pub format: ImageFormat,
}

impl FileItem {
    /// Build an item for `path`, found while traversing `root`
    pub fn new(root: &Path, path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let sub_path = parent
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or_else(|| ImageFormat::Other(String::new()));

        Self {
            path: path.to_path_buf(),
            name,
            parent,
            sub_path,
            format,
        }
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        split_name(&self.name).0
    }

    /// Extension without the leading dot, empty when there is none
    pub fn extension(&self) -> &str {
        split_name(&self.name).1
    }
}

/// Split a file name into stem and extension at the last dot
pub(crate) fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => (&name[..idx], &name[idx + 1..]),
    }
}

/// A named set of flags passed through to the external program.
///
/// Keyed by flag name (without leading dashes); switches carry an empty value.
/// Flags keep the order they were declared in, since the program applies
/// operators in argument order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(IndexMap<String, String>);

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag. Replacing a value keeps the flag's original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder form of [`FlagSet::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as program arguments: `-name value`, or just `-name` for switches
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for (name, value) in &self.0 {
            args.push(format!("-{}", name));
            if !value.is_empty() {
                args.push(value.clone());
            }
        }
        args
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Per-item, per-invocation context passed through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// The discovered file; never mutated once created
    pub item: FileItem,

    /// Parent directory of the item
    pub origin: PathBuf,

    /// Active scheme, if any
    pub scheme: Option<String>,

    /// Active profile, if any. For scheme runs this is set per step.
    pub profile: Option<String>,

    /// Keep relocated/result files alongside the input, decorated by name
    pub cuddle: bool,

    /// Explicit output directory override
    pub output: Option<PathBuf>,

    /// Explicit trash directory override
    pub trash: Option<PathBuf>,

    /// Concrete path fed to the external program for the current step
    pub source: PathBuf,
}

impl PathInfo {
    pub fn new(item: FileItem) -> Self {
        Self {
            origin: item.parent.clone(),
            source: item.path.clone(),
            item,
            scheme: None,
            profile: None,
            cuddle: false,
            output: None,
            trash: None,
        }
    }
}

// -- Tests --
