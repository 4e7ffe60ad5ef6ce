#![allow(dead_code)]

use std::collections::BTreeMap;
use shipit::config::{
    ConfigFile, PipelineSection, PublishSection, RawConfigFile, ResolverSection, StageConfig,
    TargetConfig,
};

/// Builder for `ConfigFile` to simplify test setup.
///
/// The resolver and publish commands default to harmless `echo`s so tests
/// that only exercise the stage graph don't have to configure them.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pipeline: PipelineSection::default(),
                resolver: ResolverSection {
                    cmd: "echo VERSION=0.0.0-test && echo RELEASE_ID=draft-test".to_string(),
                    version_var: "VERSION".to_string(),
                    release_id_var: "RELEASE_ID".to_string(),
                },
                publish: PublishSection {
                    cmd: "echo published".to_string(),
                    pass_env: vec![],
                },
                target: BTreeMap::new(),
                stage: BTreeMap::new(),
            },
        }
    }

    pub fn with_stage(mut self, name: &str, stage: StageConfig) -> Self {
        self.config.stage.insert(name.to_string(), stage);
        self
    }

    pub fn with_target(mut self, name: &str, target: TargetConfig) -> Self {
        self.config.target.insert(name.to_string(), target);
        self
    }

    pub fn with_max_parallel_per_target(mut self, limit: usize) -> Self {
        self.config.pipeline.max_parallel_per_target = limit;
        self
    }

    pub fn with_resolver_cmd(mut self, cmd: &str) -> Self {
        self.config.resolver.cmd = cmd.to_string();
        self
    }

    pub fn with_resolver_vars(mut self, version_var: &str, release_id_var: &str) -> Self {
        self.config.resolver.version_var = version_var.to_string();
        self.config.resolver.release_id_var = release_id_var.to_string();
        self
    }

    pub fn with_publish_cmd(mut self, cmd: &str) -> Self {
        self.config.publish.cmd = cmd.to_string();
        self
    }

    pub fn with_publish_pass_env(mut self, var: &str) -> Self {
        self.config.publish.pass_env.push(var.to_string());
        self
    }

    /// Raw, unvalidated form for tests that exercise validation itself.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StageConfig`.
pub struct StageConfigBuilder {
    stage: StageConfig,
}

impl StageConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            stage: StageConfig {
                cmd: cmd.to_string(),
                needs: vec![],
                targets: vec![],
                env: BTreeMap::new(),
                pass_env: vec![],
            },
        }
    }

    pub fn needs(mut self, dep: &str) -> Self {
        self.stage.needs.push(dep.to_string());
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.stage.targets.push(target.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.stage.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn pass_env(mut self, var: &str) -> Self {
        self.stage.pass_env.push(var.to_string());
        self
    }

    pub fn build(self) -> StageConfig {
        self.stage
    }
}
