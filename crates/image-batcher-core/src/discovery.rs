use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::{Config, Sample};
use crate::error::{Error, Result};
use crate::statics::StaticInfo;
use crate::types::{FileItem, ImageFormat};

/// Discover images below `root`, in path order.
///
/// Anything a previous run produced is never yielded: sheltered originals,
/// journal markers, cuddled originals, scheme result folders nested beside
/// their inputs, and the output directory when it lies inside the tree.
pub fn discover_images(root: &Path, config: &Config, statics: &StaticInfo) -> Result<Vec<FileItem>> {
    if !root.is_dir() {
        return Err(Error::FileNotFound(root.to_path_buf()));
    }

    let max_depth = config.max_depth.unwrap_or(usize::MAX);
    let exclusions = Exclusions { config, statics };

    let mut items = Vec::new();
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !exclusions.is_excluded(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Log error but continue with other files
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && has_image_extension(entry.path()) {
            items.push(FileItem::new(root, entry.path()));
        }
    }

    Ok(items)
}

struct Exclusions<'a> {
    config: &'a Config,
    statics: &'a StaticInfo,
}

impl Exclusions<'_> {
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();

        if entry.file_type().is_dir() {
            if entry.depth() == 0 {
                return false;
            }
            return self.statics.meta.is_excluded_dir(entry.path())
                || self.is_result_dir(entry.path(), &name);
        }

        self.statics.meta.is_marker(&name) || self.statics.is_cuddled_original(&name)
    }

    fn is_result_dir(&self, path: &Path, name: &str) -> bool {
        match &self.config.output {
            // Scheme results nest under the origin as `<scheme>/<profile>`
            None => self.config.schemes.contains_key(name),
            Some(output) => path == output.as_path(),
        }
    }
}

/// Returns if the given path has a supported image extension
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ImageFormat::from_extension(ext).is_supported())
        .unwrap_or(false)
}

/// Group items by their parent directory, keeping path order within each group
pub fn group_by_directory(items: Vec<FileItem>) -> Vec<(PathBuf, Vec<FileItem>)> {
    let mut groups: BTreeMap<PathBuf, Vec<FileItem>> = BTreeMap::new();
    for item in items {
        groups.entry(item.parent.clone()).or_default().push(item);
    }
    groups.into_iter().collect()
}

/// Keep only the first (or last) few items of a directory
pub fn sample(mut items: Vec<FileItem>, sample: &Sample) -> Vec<FileItem> {
    if items.len() <= sample.files {
        return items;
    }
    if sample.last {
        items.split_off(items.len() - sample.files)
    } else {
        items.truncate(sample.files);
        items
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn statics(config: &Config) -> StaticInfo {
        StaticInfo::from_config(config)
    }

    fn scheme_config() -> Config {
        let mut config = Config::default();
        config
            .schemes
            .insert("blur-sf".to_string(), vec!["blur".to_string(), "sf".to_string()]);
        config
    }

    fn create_test_image(dir: &Path, name: &str, ext: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let file_path = dir.join(format!("{}.{}", name, ext));
        let mut file = File::create(&file_path).unwrap();
        // Write some dummy data to simulate an image
        file.write_all(b"DUMMY IMAGE DATA").unwrap();
        file_path
    }

    fn setup_test_directory() -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();
        let subdir_path = dir.path().join("subdir");

        let files = vec![
            create_test_image(dir.path(), "image1", "jpg"),
            create_test_image(dir.path(), "image2", "png"),
            create_test_image(dir.path(), "image3", "tiff"),
            create_test_image(dir.path(), "image4", "heic"),
            create_test_image(&subdir_path, "subdir_image1", "jpg"),
            create_test_image(&subdir_path, "subdir_image2", "png"),
        ];

        // Non-image file, an in-progress marker, a sheltered original,
        // a cuddled original and a scheme result
        create_test_image(dir.path(), "document", "txt");
        create_test_image(dir.path(), "image1.jpg.$journal", "txt");
        create_test_image(&dir.path().join("$deja-vu/ADHOC/TRASH"), "old", "jpg");
        create_test_image(dir.path(), "image2.ADHOC.LEGACY", "png");
        create_test_image(&dir.path().join("blur-sf/blur"), "image1", "jpg");

        (dir, files)
    }

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension(Path::new("test.jpg")));
        assert!(has_image_extension(Path::new("test.JPEG")));
        assert!(has_image_extension(Path::new("test.webp")));
        assert!(!has_image_extension(Path::new("test.txt")));
        assert!(!has_image_extension(Path::new("test")));
    }

    #[test]
    fn test_discover_images_skips_own_artifacts() {
        let (dir, files) = setup_test_directory();
        let config = scheme_config();

        let discovered = discover_images(dir.path(), &config, &statics(&config)).unwrap();

        let paths: Vec<PathBuf> = discovered.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, files);
    }

    #[test]
    fn test_output_inside_tree_is_not_rediscovered() {
        let (dir, files) = setup_test_directory();
        let output = dir.path().join("subdir");
        let config = Config {
            output: Some(output.clone()),
            ..scheme_config()
        };

        let discovered = discover_images(dir.path(), &config, &statics(&config)).unwrap();

        // With an output directory, scheme folders are ordinary input
        let paths: Vec<PathBuf> = discovered.iter().map(|f| f.path.clone()).collect();
        assert!(paths.iter().all(|p| !p.starts_with(&output)));
        assert!(paths.contains(&dir.path().join("blur-sf/blur/image1.jpg")));
        assert_eq!(paths.len(), files.len() - 2 + 1);
    }

    #[test]
    fn test_discover_images_with_depth_limit() {
        let (dir, _) = setup_test_directory();
        let config = Config {
            max_depth: Some(1),
            ..Default::default()
        };

        let discovered = discover_images(dir.path(), &config, &statics(&config)).unwrap();

        assert_eq!(discovered.len(), 4);
        for file in &discovered {
            assert_eq!(file.parent, dir.path());
            assert_eq!(file.sub_path, PathBuf::new());
        }
    }

    #[test]
    fn test_discover_images_nonexistent_directory() {
        let result = discover_images(
            Path::new("/path/that/does/not/exist"),
            &Config::default(),
            &statics(&Config::default()),
        );
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_group_and_sample() {
        let (dir, _) = setup_test_directory();
        let config = scheme_config();
        let discovered = discover_images(dir.path(), &config, &statics(&config)).unwrap();

        let groups = group_by_directory(discovered);
        assert_eq!(groups.len(), 2);
        let (root_dir, root_items) = &groups[0];
        assert_eq!(root_dir, dir.path());

        let first = sample(root_items.clone(), &Sample { files: 2, last: false });
        let names: Vec<_> = first.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["image1.jpg", "image2.png"]);

        let last = sample(root_items.clone(), &Sample { files: 1, last: true });
        assert_eq!(last[0].name, "image4.heic");

        let all = sample(root_items.clone(), &Sample { files: 10, last: true });
        assert_eq!(all.len(), 4);
    }
}
