//! Where originals are moved to and where results are written.
//!
//! Everything here is a pure function of a [`PathInfo`], the run's
//! [`StaticInfo`] and its [`Policy`]. No I/O happens and nothing can fail.

pub mod shape;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CaseTransform, Config, ExtensionMapping};
use crate::statics::StaticInfo;
use crate::types::{split_name, PathInfo};
use shape::{Segments, Shape};

/// Run-wide relocation policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Results occupy the paths of their inputs; true unless an output directory is given
    pub transparent: bool,

    /// Number of profiles applied to each item
    pub arity: usize,

    /// Result file extension handling
    pub extensions: ExtensionMapping,
}

impl Policy {
    /// Derive the policy from configuration. `arity` must already be resolved
    /// from the active scheme.
    pub fn from_config(config: &Config, arity: usize) -> Self {
        Self {
            transparent: config.output.is_none(),
            arity,
            extensions: config.extensions.clone(),
        }
    }
}

/// A folder plus file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub folder: PathBuf,
    pub file: String,
}

impl Destination {
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.file)
    }
}

#[derive(Debug, Clone)]
pub struct PathFinder {
    statics: Arc<StaticInfo>,
    policy: Policy,
}

impl PathFinder {
    pub fn new(statics: Arc<StaticInfo>, policy: Policy) -> Self {
        Self { statics, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn is_transparent(&self) -> bool {
        self.policy.transparent
    }

    /// Where the original must be moved to make room for a same-named result.
    ///
    /// `None` when the policy is not transparent: results land elsewhere, so the
    /// original stays put.
    pub fn transfer(&self, info: &PathInfo) -> Option<Destination> {
        if !self.policy.transparent {
            return None;
        }

        let supplement = self.supplement(info);

        if info.cuddle {
            let mut labels = supplement.clone();
            labels.push(self.statics.legacy.as_str());
            return Some(Destination {
                folder: shape::expand(
                    &shape::CUDDLED_TRANSFER,
                    &self.segments(info, info.trash.as_deref(), &supplement),
                ),
                file: decorate(&info.item.name, &labels),
            });
        }

        Some(Destination {
            folder: shape::expand(
                &shape::RELOCATED_TRANSFER,
                &self.segments(info, info.trash.as_deref(), &supplement),
            ),
            file: info.item.name.clone(),
        })
    }

    /// Where the processed output for the current step is written
    pub fn result(&self, info: &PathInfo) -> Destination {
        let supplement = self.supplement(info);
        let layout: &Shape = if self.policy.transparent && self.policy.arity == 1 {
            &shape::IN_PLACE_RESULT
        } else {
            &shape::NESTED_RESULT
        };

        Destination {
            folder: shape::expand(
                layout,
                &self.segments(info, info.output.as_deref(), &supplement),
            ),
            file: mutate_extension(&info.item.name, &self.policy.extensions),
        }
    }

    /// Path segments identifying the active scheme/profile, or the adhoc label
    pub fn supplement<'a>(&'a self, info: &'a PathInfo) -> Vec<&'a str> {
        match (info.scheme.as_deref(), info.profile.as_deref()) {
            (None, None) => vec![self.statics.adhoc.as_str()],
            (scheme, profile) => scheme.into_iter().chain(profile).collect(),
        }
    }

    fn segments<'a>(
        &'a self,
        info: &'a PathInfo,
        base: Option<&'a Path>,
        supplement: &'a [&'a str],
    ) -> Segments<'a> {
        // The origin already contains the sub-path; only an override root needs it
        let (to, sub_path) = match base {
            Some(root) => (root, info.item.sub_path.as_path()),
            None => (info.origin.as_path(), Path::new("")),
        };

        Segments {
            to,
            origin: &info.origin,
            sub_path,
            deja_vu: &self.statics.meta.discriminator,
            supplement,
            trash: &self.statics.trash,
        }
    }
}

/// Insert labels between a file's stem and extension: `name.a.b.ext`
pub fn decorate(name: &str, labels: &[&str]) -> String {
    let (stem, ext) = split_name(name);
    let mut decorated = String::from(stem);
    for label in labels {
        decorated.push('.');
        decorated.push_str(label);
    }
    if !ext.is_empty() {
        decorated.push('.');
        decorated.push_str(ext);
    }
    decorated
}

/// Apply case transforms, then the suffix remap table, to a result file name
pub fn mutate_extension(name: &str, mapping: &ExtensionMapping) -> String {
    let (stem, ext) = split_name(name);
    let stem = fold(stem, &mapping.transforms);
    let mut ext = fold(ext, &mapping.transforms);

    if let Some((_, to)) = mapping
        .remap
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(&ext))
    {
        ext = fold(to, &mapping.transforms);
    }

    if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    }
}

fn fold(text: &str, transforms: &[CaseTransform]) -> String {
    transforms
        .iter()
        .fold(text.to_string(), |acc, transform| match transform {
            CaseTransform::Lower => acc.to_lowercase(),
            CaseTransform::Upper => acc.to_uppercase(),
        })
}

#[cfg(test)]
mod tests;
