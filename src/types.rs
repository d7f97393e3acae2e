//! Small shared types: pipeline states and placeholder resolution.
//!
//! # Tracked file names
//!
//! Tracked files are given as templates without extension, e.g.
//! `"messages_%lang%"`. Before each pass, every [`Placeholder`] token is
//! replaced by the value of its host variable and the configured extension is
//! appended, so with `language = "en"` the template above becomes
//! `"messages_en.toml"`.
//!
//! Variable values come from a [`VariableSource`]. By default they are read
//! from the on-disk primary settings file (`config.toml`), which is where
//! hosts usually keep settings such as the active language.

use std::fmt;

/// Stage of an update pass.
///
/// ```text
/// Idle → VersionGate → BackingUp → Caching → RunningHooks
///      → RewritingVersion (optional) → ReCaching → Merging → Done
/// ```
///
/// `VersionGate` goes straight to `Done` when the versions match. Any stage
/// can end in `Failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateState {
    #[default]
    Idle,
    VersionGate,
    BackingUp,
    Caching,
    RunningHooks,
    RewritingVersion,
    ReCaching,
    Merging,
    Done,
    Failed,
}

/// A token in tracked file templates and the host variable that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: String,
    pub variable: String,
}

impl Placeholder {
    pub fn new(token: &str, variable: &str) -> Self {
        Self {
            token: token.to_string(),
            variable: variable.to_string(),
        }
    }
}

/// Where placeholder variables are looked up.
pub enum VariableSource {
    /// The string at the variable's path in the on-disk primary settings file.
    Settings,
    /// A host-supplied lookup.
    Resolver(Box<dyn Fn(&str) -> Option<String>>),
}

impl fmt::Debug for VariableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableSource::Settings => write!(f, "Settings"),
            VariableSource::Resolver(_) => write!(f, "Resolver(..)"),
        }
    }
}
