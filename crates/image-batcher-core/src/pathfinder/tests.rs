use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::*;
use crate::config::{CaseTransform, Config, ExtensionMapping};
use crate::statics::StaticInfo;
use crate::types::{FileItem, PathInfo};

fn finder(transparent: bool, arity: usize) -> PathFinder {
    let statics = Arc::new(StaticInfo::from_config(&Config::default()));
    PathFinder::new(
        statics,
        Policy {
            transparent,
            arity,
            extensions: ExtensionMapping::default(),
        },
    )
}

fn info(root: &str, path: &str) -> PathInfo {
    PathInfo::new(FileItem::new(Path::new(root), Path::new(path)))
}

#[test]
fn test_path_computation_is_idempotent() {
    let finder = finder(true, 1);
    let mut pi = info("/photos", "/photos/scan-01/IMG_01.jpg");
    pi.profile = Some("blur".to_string());

    assert_eq!(finder.transfer(&pi), finder.transfer(&pi));
    assert_eq!(finder.result(&pi), finder.result(&pi));
}

#[test]
fn test_adhoc_transparent_transfer_shelters_original() {
    let finder = finder(true, 1);
    let pi = info("/photos", "/photos/scan-01/IMG_01.jpg");

    let transfer = finder.transfer(&pi).unwrap();

    assert_eq!(
        transfer.folder,
        PathBuf::from("/photos/scan-01/$deja-vu/ADHOC/TRASH")
    );
    assert_eq!(transfer.file, "IMG_01.jpg");
}

#[test]
fn test_transfer_with_trash_override_keeps_sub_path() {
    let finder = finder(true, 1);
    let mut pi = info("/photos", "/photos/2023/scan-01/IMG_01.jpg");
    pi.trash = Some(PathBuf::from("/bin"));
    pi.profile = Some("blur".to_string());

    let transfer = finder.transfer(&pi).unwrap();

    assert_eq!(
        transfer.folder,
        PathBuf::from("/bin/2023/scan-01/$deja-vu/blur/TRASH")
    );
}

#[test]
fn test_transparent_arity_one_result_is_in_place() {
    let finder = finder(true, 1);
    for pi in [
        info("/photos", "/photos/scan-01/IMG_01.jpg"),
        info("/photos", "/photos/IMG_02.png"),
    ] {
        assert_eq!(finder.result(&pi).folder, pi.origin);
        assert_eq!(finder.result(&pi).path(), pi.item.path);
    }
}

#[test]
fn test_non_transparent_never_transfers() {
    let finder = finder(false, 1);
    let mut pi = info("/photos", "/photos/scan-01/IMG_01.jpg");
    assert_eq!(finder.transfer(&pi), None);

    pi.cuddle = true;
    pi.trash = Some(PathBuf::from("/bin"));
    assert_eq!(finder.transfer(&pi), None);
}

#[test]
fn test_cuddled_transfer_decorates_name() {
    let finder = finder(true, 2);
    let mut pi = info("/photos", "/photos/scan-01/IMG_01.jpg");
    pi.cuddle = true;
    pi.scheme = Some("blur-sf".to_string());

    let transfer = finder.transfer(&pi).unwrap();

    assert_eq!(transfer.folder, pi.origin);
    assert!(transfer.file.len() > pi.item.name.len());
    assert!(transfer.file.contains("IMG_01"));
    assert_eq!(transfer.file, "IMG_01.blur-sf.LEGACY.jpg");
}

#[test]
fn test_separated_transfer_keeps_name() {
    let finder = finder(true, 1);
    let pi = info("/photos", "/photos/scan-01/IMG_01.jpg");

    let transfer = finder.transfer(&pi).unwrap();

    assert_ne!(transfer.folder, pi.origin);
    assert_eq!(transfer.file, pi.item.name);
}

#[test]
fn test_output_with_profile_nests_result() {
    let finder = PathFinder::new(
        Arc::new(StaticInfo::from_config(&Config::default())),
        Policy::from_config(
            &Config {
                output: Some(PathBuf::from("results")),
                ..Config::default()
            },
            1,
        ),
    );
    let mut pi = info("/photos", "/photos/IMG_01.jpg");
    pi.output = Some(PathBuf::from("results"));
    pi.profile = Some("blur".to_string());

    assert_eq!(finder.transfer(&pi), None);
    assert_eq!(
        finder.result(&pi),
        Destination {
            folder: PathBuf::from("results/blur"),
            file: "IMG_01.jpg".to_string(),
        }
    );
}

#[test]
fn test_scheme_results_fan_out_by_profile() {
    let finder = finder(true, 2);
    let mut pi = info("/photos", "/photos/scan-01/IMG_01.jpg");
    pi.scheme = Some("blur-sf".to_string());

    pi.profile = Some("blur".to_string());
    let blur = finder.result(&pi);
    pi.profile = Some("sf".to_string());
    let sf = finder.result(&pi);

    assert_eq!(blur.folder, PathBuf::from("/photos/scan-01/blur-sf/blur"));
    assert_eq!(sf.folder, PathBuf::from("/photos/scan-01/blur-sf/sf"));
    assert_eq!(blur.file, "IMG_01.jpg");
}

#[test]
fn test_supplement() {
    let finder = finder(true, 1);
    let mut pi = info("/photos", "/photos/a.jpg");
    assert_eq!(finder.supplement(&pi), vec!["ADHOC"]);

    pi.profile = Some("blur".to_string());
    assert_eq!(finder.supplement(&pi), vec!["blur"]);

    pi.scheme = Some("blur-sf".to_string());
    assert_eq!(finder.supplement(&pi), vec!["blur-sf", "blur"]);
}

#[test]
fn test_extension_remap_with_lower_transform() {
    let mut mapping = ExtensionMapping {
        transforms: vec![CaseTransform::Lower],
        ..ExtensionMapping::default()
    };
    mapping.remap.insert("jpeg".to_string(), "jpg".to_string());

    assert_eq!(mutate_extension("IMG.JPEG", &mapping), "img.jpg");
    assert_eq!(mutate_extension("IMG.PNG", &mapping), "img.png");
}

#[test]
fn test_extension_mutation_only_affects_result() {
    let mut extensions = ExtensionMapping {
        transforms: vec![CaseTransform::Upper],
        ..ExtensionMapping::default()
    };
    extensions.remap.insert("jpeg".to_string(), "jpg".to_string());
    let finder = PathFinder::new(
        Arc::new(StaticInfo::from_config(&Config::default())),
        Policy {
            transparent: true,
            arity: 1,
            extensions,
        },
    );
    let pi = info("/photos", "/photos/pic.jpeg");

    assert_eq!(finder.result(&pi).file, "PIC.JPG");
    assert_eq!(finder.transfer(&pi).unwrap().file, "pic.jpeg");
}

#[test]
fn test_decorate_without_extension() {
    assert_eq!(decorate("README", &["a", "b"]), "README.a.b");
    assert_eq!(decorate("x.png", &["FAKE"]), "x.FAKE.png");
}
