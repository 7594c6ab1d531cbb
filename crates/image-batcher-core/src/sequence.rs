//! Ordered invocation plans for a single item.

use log::debug;
use std::path::PathBuf;

use crate::agent::ExecutionAgent;
use crate::config::Config;
use crate::controller::SharedControllerInfo;
use crate::error::{Error, Result};
use crate::types::{FlagSet, PathInfo};

/// How every item of a run is processed. Exactly one applies to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Command line flags only
    Adhoc,

    /// A single stored profile, overridden by the command line
    Profile { name: String, flags: FlagSet },

    /// Several profiles in declared order, for comparison sampling
    Scheme {
        name: String,
        profiles: Vec<(String, FlagSet)>,
    },
}

impl Strategy {
    /// Resolve the active profile or scheme. Any name that does not resolve is
    /// a configuration error.
    pub fn resolve(config: &Config) -> Result<Self> {
        match (&config.profile, &config.scheme) {
            (Some(_), Some(_)) => Err(Error::Configuration(
                "a profile and a scheme cannot both be active".to_string(),
            )),
            (Some(name), None) => {
                let flags = config
                    .profile(name)
                    .ok_or_else(|| Error::UnknownProfile(name.clone()))?;
                Ok(Strategy::Profile {
                    name: name.clone(),
                    flags: flags.clone(),
                })
            }
            (None, Some(name)) => {
                let members = config
                    .scheme(name)
                    .ok_or_else(|| Error::UnknownScheme(name.clone()))?;
                if members.is_empty() {
                    return Err(Error::Configuration(format!(
                        "scheme '{}' has no profiles",
                        name
                    )));
                }
                let profiles = members
                    .iter()
                    .map(|member| {
                        config
                            .profile(member)
                            .map(|flags| (member.clone(), flags.clone()))
                            .ok_or_else(|| Error::UnknownProfile(member.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Strategy::Scheme {
                    name: name.clone(),
                    profiles,
                })
            }
            (None, None) => Ok(Strategy::Adhoc),
        }
    }

    /// Number of results produced per item
    pub fn arity(&self) -> usize {
        match self {
            Strategy::Scheme { profiles, .. } => profiles.len(),
            _ => 1,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        match self {
            Strategy::Scheme { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&str> {
        match self {
            Strategy::Profile { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Merge stored flags with command line flags, keyed by flag name. A flag the
/// command line names explicitly wins.
pub fn compose(primary: &FlagSet, secondary: &FlagSet) -> FlagSet {
    let mut merged = primary.clone();
    for (name, value) in secondary.iter() {
        merged.set(name, value);
    }
    merged
}

/// One invocation of the external program
pub struct Step<'a, A> {
    shared: &'a SharedControllerInfo<A>,

    /// Composed flags for this invocation
    pub flags: FlagSet,

    /// Profile this step applies; `None` for adhoc
    pub profile: Option<String>,

    /// Path the program reads from
    pub source: PathBuf,
}

impl<'a, A: ExecutionAgent> Step<'a, A> {
    pub fn new(
        shared: &'a SharedControllerInfo<A>,
        flags: FlagSet,
        profile: Option<String>,
        source: PathBuf,
    ) -> Self {
        Self {
            shared,
            flags,
            profile,
            source,
        }
    }

    /// Invoke the program for this step, writing to the step's result path
    pub fn run(&self, pi: &mut PathInfo) -> Result<()> {
        if self.profile.is_some() {
            pi.profile = self.profile.clone();
        }
        pi.source = self.source.clone();

        let manager = &self.shared.file_manager;
        let result = manager.finder().result(pi);
        let destination = result.path();
        manager.ensure_folder(&result.folder)?;

        debug!(
            "Step [{}]: {} -> {}",
            self.profile.as_deref().unwrap_or("adhoc"),
            self.source.display(),
            destination.display()
        );
        self.shared
            .agent
            .invoke(&self.flags, &self.source, &destination)
    }
}

/// The steps for one item, in execution order
pub type Sequence<'a, A> = Vec<Step<'a, A>>;

/// Build the sequence the strategy calls for
pub fn build<'a, A: ExecutionAgent>(
    shared: &'a SharedControllerInfo<A>,
    source: PathBuf,
) -> Sequence<'a, A> {
    let command_line = &shared.command_line;
    match &shared.strategy {
        Strategy::Adhoc => vec![Step::new(shared, command_line.clone(), None, source)],
        Strategy::Profile { name, flags } => vec![Step::new(
            shared,
            compose(flags, command_line),
            Some(name.clone()),
            source,
        )],
        Strategy::Scheme { profiles, .. } => profiles
            .iter()
            .map(|(name, flags)| {
                Step::new(
                    shared,
                    compose(flags, command_line),
                    Some(name.clone()),
                    source.clone(),
                )
            })
            .collect(),
    }
}
