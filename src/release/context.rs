// src/release/context.rs

use std::fmt;

/// Immutable run-scoped context: the resolved version string and the draft
/// release identifier.
///
/// Created exactly once per run by the resolver and then only cloned; every
/// stage instance receives the same values by value, so no stage can affect
/// what later stages see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub version: String,
    pub release_id: String,
    /// Environment variable name the version is exported under.
    pub version_var: String,
    /// Environment variable name the release id is exported under.
    pub release_id_var: String,
}

impl RunContext {
    /// The environment entries injected into every stage and publish process.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![
            (self.version_var.clone(), self.version.clone()),
            (self.release_id_var.clone(), self.release_id.clone()),
        ]
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version {} (release {})", self.version, self.release_id)
    }
}
