// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `testrelay.toml`.
///
/// ```toml
/// [build]
/// program = "dotnet"
/// property = "GetTestsProjectPipeName"
///
/// [exec]
/// managed_suffix = ".dll"
/// library_arg = "exec"
///
/// [channel]
/// read_buffer_size = 4096
/// drain_grace_ms = 25
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub exec: ExecSection,

    #[serde(default)]
    pub channel: ChannelSection,
}

/// `[build]` section: how the external build step is invoked.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Program that runs the build (`<program> build ...` / `<program> msbuild ...`).
    #[serde(default = "default_build_program")]
    pub program: String,

    /// Build property that carries the discovery channel identifier.
    #[serde(default = "default_channel_property")]
    pub property: String,
}

fn default_build_program() -> String {
    "dotnet".to_string()
}

fn default_channel_property() -> String {
    "GetTestsProjectPipeName".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            program: default_build_program(),
            property: default_channel_property(),
        }
    }
}

/// `[exec]` section: how discovered modules are launched.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecSection {
    /// Suffix marking a managed library that needs a host to run it.
    #[serde(default = "default_managed_suffix")]
    pub managed_suffix: String,

    /// Argument telling the host to execute a library.
    #[serde(default = "default_library_arg")]
    pub library_arg: String,

    /// Host executable for libraries. `None` means the current executable.
    #[serde(default)]
    pub host: Option<PathBuf>,

    /// Program used by `testrelay exec <library>` to actually run a library.
    #[serde(default = "default_library_runner")]
    pub library_runner: String,
}

fn default_managed_suffix() -> String {
    ".dll".to_string()
}

fn default_library_arg() -> String {
    "exec".to_string()
}

fn default_library_runner() -> String {
    "dotnet".to_string()
}

impl Default for ExecSection {
    fn default() -> Self {
        Self {
            managed_suffix: default_managed_suffix(),
            library_arg: default_library_arg(),
            host: None,
            library_runner: default_library_runner(),
        }
    }
}

/// `[channel]` section: discovery channel tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSection {
    /// Chunk size for draining a peer connection.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Upper bound on simultaneous listener instances (named pipes only).
    #[serde(default = "default_max_listeners")]
    pub max_listeners: usize,

    /// After cancellation, how long to keep accepting connections that were
    /// already queued, in milliseconds.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

pub const MAX_LISTENER_INSTANCES: usize = 254;

fn default_read_buffer_size() -> usize {
    4096
}

fn default_max_listeners() -> usize {
    MAX_LISTENER_INSTANCES
}

fn default_drain_grace_ms() -> u64 {
    25
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            read_buffer_size: default_read_buffer_size(),
            max_listeners: default_max_listeners(),
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}
