// src/build.rs

//! External build trigger.
//!
//! The build is an opaque blocking step. While it runs, its test-discovery
//! target connects back to the discovery channel once per test module. It
//! returns only after every such connection has been initiated.

use std::ffi::OsString;
use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use tokio::process::Command;
use tracing::{info, warn};

use crate::channel::ChannelAddress;
use crate::config::BuildSection;
use crate::errors::Result;
use crate::types::TriggerMode;

/// Trait abstracting how the build step is run.
///
/// Production code uses [`CommandBuildTrigger`]; tests provide a scripted
/// trigger that plays the role of the build's discovery peers.
pub trait BuildTrigger: Send {
    /// Run the build to completion. The returned value is the build's own
    /// exit code, informational only.
    fn trigger<'a>(
        &'a mut self,
        address: &'a ChannelAddress,
        mode: TriggerMode,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;
}

/// Runs the build tool as a child process.
#[derive(Debug, Clone)]
pub struct CommandBuildTrigger {
    program: String,
    property: String,
    extra_args: Vec<String>,
}

impl CommandBuildTrigger {
    pub fn new(cfg: &BuildSection, extra_args: Vec<String>) -> Self {
        Self {
            program: cfg.program.clone(),
            property: cfg.property.clone(),
            extra_args,
        }
    }

    /// Arguments for `mode`:
    /// - full: `build -t:Build;_GetTestsProject -p:<property>=<address>`
    /// - discover only: `msbuild -t:_GetTestsProject -p:<property>=<address> -verbosity:q`
    pub fn args(&self, address: &ChannelAddress, mode: TriggerMode) -> Vec<OsString> {
        let verb = match mode {
            TriggerMode::BuildAndDiscover => "build",
            TriggerMode::DiscoverOnly => "msbuild",
        };

        let mut args: Vec<OsString> = vec![
            verb.into(),
            format!("-t:{}", mode.targets()).into(),
            format!("-p:{}={address}", self.property).into(),
        ];
        if mode == TriggerMode::DiscoverOnly {
            args.push("-verbosity:q".into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl BuildTrigger for CommandBuildTrigger {
    fn trigger<'a>(
        &'a mut self,
        address: &'a ChannelAddress,
        mode: TriggerMode,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let args = self.args(address, mode);
            info!(program = %self.program, ?args, "running build");

            let status = Command::new(&self.program)
                .args(&args)
                .kill_on_drop(true)
                .status()
                .await
                .with_context(|| format!("running build program '{}'", self.program))?;

            let code = status.code().unwrap_or(-1);
            if status.success() {
                info!(exit_code = code, "build finished");
            } else {
                warn!(exit_code = code, "build finished with a non-zero exit code");
            }
            Ok(code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> CommandBuildTrigger {
        CommandBuildTrigger::new(&BuildSection::default(), vec!["MySolution.sln".to_string()])
    }

    #[test]
    fn full_mode_builds_and_discovers() {
        let address = ChannelAddress::from_token("abc123");
        let args = trigger().args(&address, TriggerMode::BuildAndDiscover);
        assert_eq!(
            args,
            vec![
                OsString::from("build"),
                OsString::from("-t:Build;_GetTestsProject"),
                OsString::from("-p:GetTestsProjectPipeName=abc123"),
                OsString::from("MySolution.sln"),
            ]
        );
    }

    #[test]
    fn discover_only_mode_is_quiet_and_skips_build_target() {
        let address = ChannelAddress::from_token("abc123");
        let args = trigger().args(&address, TriggerMode::DiscoverOnly);
        assert_eq!(
            args,
            vec![
                OsString::from("msbuild"),
                OsString::from("-t:_GetTestsProject"),
                OsString::from("-p:GetTestsProjectPipeName=abc123"),
                OsString::from("-verbosity:q"),
                OsString::from("MySolution.sln"),
            ]
        );
    }
}
