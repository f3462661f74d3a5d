//! Feature flag evaluation.
//!
//! Flags pick which authorization model a request uses. Evaluation is a pure
//! function of the caller; a request captures a [`FlagSnapshot`] once at its
//! start so a flag cannot flip halfway through.

use std::collections::HashMap;

use crate::model::Caller;

/// Selects the requirement-handler model for groups, collections, ciphers
/// and organization events.
pub const FLEXIBLE_COLLECTIONS: &str = "flexible-collections";

/// Every flag the access gate consults.
pub const KNOWN_FLAGS: [&str; 1] = [FLEXIBLE_COLLECTIONS];

/// Evaluates named boolean flags.
///
/// Implementations must fail closed: an unknown flag is `false`, never an
/// error.
pub trait FeatureFlags: Send + Sync {
    fn is_enabled(&self, flag: &str, caller: &Caller) -> bool;
}

/// Flags read from static configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    flags: HashMap<String, bool>,
}

impl StaticFeatureFlags {
    pub fn new(flags: HashMap<String, bool>) -> Self {
        Self { flags }
    }

    pub fn with_flag(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.flags.insert(flag.into(), enabled);
        self
    }
}

impl FeatureFlags for StaticFeatureFlags {
    fn is_enabled(&self, flag: &str, _caller: &Caller) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }
}

/// Flag values frozen at the start of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSnapshot {
    values: HashMap<&'static str, bool>,
}

impl FlagSnapshot {
    /// Evaluates every known flag once for `caller`.
    pub fn capture(flags: &dyn FeatureFlags, caller: &Caller) -> Self {
        let values = KNOWN_FLAGS
            .iter()
            .map(|&name| (name, flags.is_enabled(name, caller)))
            .collect();
        Self { values }
    }

    /// Unknown or uncaptured flags read as disabled.
    pub fn is_enabled(&self, flag: &str) -> bool {
        self.values.get(flag).copied().unwrap_or(false)
    }
}
