//! Run-wide constant labels, resolved once from configuration.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::types::{split_name, FileItem};

/// Prefix reserved for files and folders the engine creates for itself.
/// Image files never start with it, so generated names cannot collide.
pub const RESERVED_PREFIX: &str = "$";

/// Name of the folder that shelters relocated originals from re-discovery
const DEJA_VU: &str = "deja-vu";

const JOURNAL_EXTENSION: &str = "txt";

/// Naming of the journal markers that flag items as in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalMetaInfo {
    /// Core name, e.g. `$journal`
    pub core: String,

    /// Full marker suffix, e.g. `$journal.txt`
    pub name: String,

    /// Marker extension without the dot
    pub extension: String,

    /// Directory tag excluded from traversal, e.g. `$deja-vu`
    pub discriminator: String,
}

impl JournalMetaInfo {
    pub fn new(label: &str) -> Self {
        let core = format!("{}{}", RESERVED_PREFIX, label);
        Self {
            name: format!("{}.{}", core, JOURNAL_EXTENSION),
            core,
            extension: JOURNAL_EXTENSION.to_string(),
            discriminator: format!("{}{}", RESERVED_PREFIX, DEJA_VU),
        }
    }

    /// Journal marker for an item: `<parent>/<name>.$journal.txt`.
    /// The full file name keeps `IMG.jpg` and `IMG.png` apart.
    pub fn marker_for(&self, item: &FileItem) -> PathBuf {
        item.parent.join(format!("{}.{}", item.name, self.name))
    }

    /// Whether a file name is one of our journal markers
    pub fn is_marker(&self, file_name: &str) -> bool {
        file_name.ends_with(&format!(".{}", self.name))
    }

    /// Whether a directory must be skipped during traversal
    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(&self.discriminator))
            .unwrap_or(false)
    }
}

/// Labels shared read-only by every item of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticInfo {
    pub adhoc: String,
    pub legacy: String,
    pub trash: String,
    pub fake: String,
    pub meta: JournalMetaInfo,
}

impl StaticInfo {
    pub fn from_config(config: &Config) -> Self {
        let labels = &config.labels;
        Self {
            adhoc: labels.adhoc.clone(),
            legacy: labels.legacy.clone(),
            trash: labels.trash.clone(),
            fake: labels.fake.clone(),
            meta: JournalMetaInfo::new(&labels.journal),
        }
    }

    /// Whether a file name is an original kept beside its result by a cuddled
    /// run, i.e. its stem ends in `.<legacy>`
    pub fn is_cuddled_original(&self, file_name: &str) -> bool {
        let (stem, _) = split_name(file_name);
        stem.strip_suffix(self.legacy.as_str())
            .map(|rest| rest.ends_with('.'))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_naming() {
        let meta = JournalMetaInfo::new("journal");
        assert_eq!(meta.core, "$journal");
        assert_eq!(meta.name, "$journal.txt");
        assert_eq!(meta.discriminator, "$deja-vu");

        let item = FileItem::new(Path::new("/root"), Path::new("/root/scan-01/IMG_1.jpg"));
        assert_eq!(
            meta.marker_for(&item),
            PathBuf::from("/root/scan-01/IMG_1.jpg.$journal.txt")
        );
        assert!(meta.is_marker("IMG_1.jpg.$journal.txt"));
        assert!(!meta.is_marker("IMG_1.jpg"));
    }

    #[test]
    fn test_same_stem_siblings_get_distinct_markers() {
        let meta = JournalMetaInfo::new("journal");
        let root = Path::new("/root");
        let jpg = FileItem::new(root, Path::new("/root/scan-01/IMG.jpg"));
        let png = FileItem::new(root, Path::new("/root/scan-01/IMG.png"));

        assert_ne!(meta.marker_for(&jpg), meta.marker_for(&png));
    }

    #[test]
    fn test_cuddled_original_names() {
        let statics = StaticInfo::from_config(&Config::default());
        assert!(statics.is_cuddled_original("IMG_01.ADHOC.LEGACY.jpg"));
        assert!(statics.is_cuddled_original("IMG_01.blur-sf.LEGACY.png"));
        assert!(!statics.is_cuddled_original("IMG_01.jpg"));
        assert!(!statics.is_cuddled_original("LEGACY.jpg"));
        assert!(!statics.is_cuddled_original("IMG_01NOTLEGACY.jpg"));
    }

    #[test]
    fn test_excluded_dir() {
        let meta = JournalMetaInfo::new("journal");
        assert!(meta.is_excluded_dir(Path::new("/root/scan-01/$deja-vu")));
        assert!(!meta.is_excluded_dir(Path::new("/root/scan-01/deja-vu")));
    }
}
