use std::path::PathBuf;

use testrelay::config::{validate_config, ConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
        }
    }

    pub fn build_program(mut self, program: &str) -> Self {
        self.config.build.program = program.to_string();
        self
    }

    pub fn host(mut self, host: impl Into<PathBuf>) -> Self {
        self.config.exec.host = Some(host.into());
        self
    }

    pub fn managed_suffix(mut self, suffix: &str) -> Self {
        self.config.exec.managed_suffix = suffix.to_string();
        self
    }

    pub fn library_arg(mut self, arg: &str) -> Self {
        self.config.exec.library_arg = arg.to_string();
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.channel.read_buffer_size = size;
        self
    }

    pub fn build(self) -> ConfigFile {
        validate_config(&self.config).expect("Failed to build valid config from builder");
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
