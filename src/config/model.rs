// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Name of the implicit target used by stages that declare no `targets`.
pub const LOCAL_TARGET: &str = "local";

/// Top-level pipeline configuration as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// max_parallel_per_target = 2
///
/// [resolver]
/// cmd = "build-cli release create-draft"
/// version_var = "ENSO_VERSION"
/// release_id_var = "ENSO_RELEASE_ID"
///
/// [publish]
/// cmd = "build-cli release publish"
/// pass_env = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"]
///
/// [target.linux]
/// env = { OS = "linux" }
///
/// [stage.engine]
/// cmd = "build-cli engine build"
/// targets = ["linux", "macos"]
///
/// [stage.ide]
/// cmd = "build-cli ide build"
/// needs = ["engine", "wasm"]
/// ```
///
/// Only semantic validation (`config::validate`) turns the raw form into a
/// [`ConfigFile`] usable by the rest of the crate.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// The version/release resolver from `[resolver]`.
    pub resolver: ResolverSection,

    /// The publish step from `[publish]`.
    pub publish: PublishSection,

    /// Named execution targets from `[target.<name>]`.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,

    /// All build stages from `[stage.<name>]`.
    ///
    /// Keys are the stage names (e.g. `"engine"`, `"wasm"`, `"ide"`).
    #[serde(default)]
    pub stage: BTreeMap<String, StageConfig>,
}

/// Validated configuration.
///
/// Construction goes through `TryFrom<RawConfigFile>` in `config::validate`,
/// which guarantees:
/// - at least one stage exists,
/// - every `needs` entry references a declared stage (and not itself),
/// - every `targets` entry references a declared target (or `local`),
/// - the stage graph is acyclic,
/// - all concurrency limits are >= 1.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub resolver: ResolverSection,
    pub publish: PublishSection,
    pub target: BTreeMap<String, TargetConfig>,
    pub stage: BTreeMap<String, StageConfig>,
}

impl ConfigFile {
    /// Internal constructor used by validation. Callers outside
    /// `config::validate` should go through `TryFrom<RawConfigFile>`.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            pipeline: raw.pipeline,
            resolver: raw.resolver,
            publish: raw.publish,
            target: raw.target,
            stage: raw.stage,
        }
    }

    /// Effective concurrency limit for the given target pool.
    pub fn max_parallel_for_target(&self, target: &str) -> usize {
        self.target
            .get(target)
            .and_then(|t| t.max_parallel)
            .unwrap_or(self.pipeline.max_parallel_per_target)
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// How many stage instances may run concurrently on one target pool.
    #[serde(default = "default_max_parallel_per_target")]
    pub max_parallel_per_target: usize,
}

fn default_max_parallel_per_target() -> usize {
    2
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_parallel_per_target: default_max_parallel_per_target(),
        }
    }
}

/// `[resolver]` section.
///
/// The resolver command runs once per pipeline run, before any stage. Its
/// stdout is scanned for `NAME=value` lines matching `version_var` and
/// `release_id_var`; both must appear for the run to proceed.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSection {
    /// The command that computes the version and creates the draft release.
    pub cmd: String,

    /// Environment variable name carrying the version string.
    #[serde(default = "default_version_var")]
    pub version_var: String,

    /// Environment variable name carrying the draft release identifier.
    #[serde(default = "default_release_id_var")]
    pub release_id_var: String,
}

fn default_version_var() -> String {
    "VERSION".to_string()
}

fn default_release_id_var() -> String {
    "RELEASE_ID".to_string()
}

/// `[publish]` section.
///
/// The publish command runs at most once, only after every stage instance
/// succeeded. `pass_env` names host environment variables (typically
/// transport credentials) forwarded to this command and to no other stage.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishSection {
    /// The command that flips the draft release to published.
    pub cmd: String,

    /// Host environment variables forwarded to the publish command.
    #[serde(default)]
    pub pass_env: Vec<String>,
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetConfig {
    /// Extra environment applied to every instance running on this target.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Per-target override of `pipeline.max_parallel_per_target`.
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

/// `[stage.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// The command to execute for each instance of this stage.
    pub cmd: String,

    /// Stages that must fully succeed before this one may start.
    #[serde(default)]
    pub needs: Vec<String>,

    /// Targets this stage runs on; one instance is spawned per target.
    ///
    /// Empty means the implicit `local` target.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Stage-specific environment, on top of the run context.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Host environment variables forwarded to this stage's instances.
    #[serde(default)]
    pub pass_env: Vec<String>,
}

impl StageConfig {
    /// Targets this stage effectively runs on, substituting the implicit
    /// `local` target when none are declared.
    pub fn effective_targets(&self) -> Vec<String> {
        if self.targets.is_empty() {
            vec![LOCAL_TARGET.to_string()]
        } else {
            self.targets.clone()
        }
    }
}
