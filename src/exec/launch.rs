// src/exec/launch.rs

//! Launch strategy selection.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::process::Command;

use crate::config::ExecSection;
use crate::errors::Result;
use crate::types::ModuleId;

/// Resolved launch settings (host executable already determined).
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub managed_suffix: String,
    pub library_arg: String,
    pub host: PathBuf,
    /// Config file handed to the host as `--config <path>`. Only set when
    /// the host is this executable, whose `exec` subcommand reads it.
    pub forward_config: Option<PathBuf>,
}

impl LaunchSettings {
    /// Build settings from `[exec]`, defaulting the host to the running
    /// executable.
    ///
    /// `config_path` is the file the current run was loaded from, if any.
    pub fn from_config(cfg: &ExecSection, config_path: Option<&Path>) -> Result<Self> {
        let (host, forward_config) = match &cfg.host {
            Some(host) => (host.clone(), None),
            None => {
                let host = std::env::current_exe().context("resolving current executable")?;
                let forward = config_path
                    .map(|path| {
                        std::path::absolute(path)
                            .with_context(|| format!("resolving config path {}", path.display()))
                    })
                    .transpose()?;
                (host, forward)
            }
        };
        Ok(Self {
            managed_suffix: cfg.managed_suffix.clone(),
            library_arg: cfg.library_arg.clone(),
            host,
            forward_config,
        })
    }
}

/// How a module is turned into a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Run the host with `<library_arg> <module>`.
    Library { host: PathBuf, args: Vec<OsString> },
    /// Run the module itself, no arguments.
    Native { program: PathBuf },
}

impl LaunchPlan {
    pub fn for_module(module: &ModuleId, settings: &LaunchSettings) -> Self {
        if module.has_suffix(&settings.managed_suffix) {
            let mut args = vec![OsString::from(&settings.library_arg)];
            if let Some(config) = &settings.forward_config {
                args.push(OsString::from("--config"));
                args.push(config.clone().into_os_string());
            }
            args.push(OsString::from(module.as_str()));
            LaunchPlan::Library {
                host: settings.host.clone(),
                args,
            }
        } else {
            LaunchPlan::Native {
                program: module.as_path().to_path_buf(),
            }
        }
    }

    pub fn program(&self) -> &PathBuf {
        match self {
            LaunchPlan::Library { host, .. } => host,
            LaunchPlan::Native { program } => program,
        }
    }

    pub fn command(&self) -> Command {
        match self {
            LaunchPlan::Library { host, args } => {
                let mut cmd = Command::new(host);
                cmd.args(args);
                cmd
            }
            LaunchPlan::Native { program } => Command::new(program),
        }
    }
}
