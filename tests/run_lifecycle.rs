// tests/run_lifecycle.rs
#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use testrelay::channel::{self, ChannelAddress};
use testrelay::config::ChannelSection;
use testrelay::engine::{Coordinator, DiscoverySettings};
use testrelay::errors::RelayError;
use testrelay::exec::{LaunchSettings, ModuleRunner, ProcessRunner};
use testrelay::types::TriggerMode;
use testrelay_test_utils::fake_runner::RecordingRunner;
use testrelay_test_utils::fake_trigger::{HangingTrigger, NotifyingTrigger};
use testrelay_test_utils::log_capture::capture_logs;
use testrelay_test_utils::{init_tracing, with_timeout};

type TestResult = std::result::Result<(), Box<dyn Error>>;

#[tokio::test]
async fn missing_library_warns_and_the_run_still_succeeds() -> TestResult {
    let (logs, _guard) = capture_logs();
    let dir = TempDir::new()?;

    // Any launch at all would leave this file behind.
    let launched = dir.path().join("launched.txt");
    let host_script = dir.path().join("host.sh");
    fs::write(&host_script, format!("echo \"$@\" > '{}'\n", launched.display()))?;
    let settings = LaunchSettings {
        managed_suffix: ".dll".to_string(),
        library_arg: host_script.display().to_string(),
        host: PathBuf::from("/bin/sh"),
        forward_config: None,
    };

    let missing = dir.path().join("missing.dll").display().to_string();
    let address = ChannelAddress::generate();
    let listener = channel::bind(&address, &ChannelSection::default())?;

    let coordinator = Coordinator::new(
        address,
        listener,
        NotifyingTrigger::new(vec![missing.clone()]),
        Arc::new(ProcessRunner::new(settings)) as Arc<dyn ModuleRunner>,
        DiscoverySettings::default(),
    );
    let summary = with_timeout(coordinator.run(TriggerMode::BuildAndDiscover)).await?;

    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.executed, 1);
    assert!(!launched.exists(), "no process may be spawned for a missing module");

    let warnings = logs.lines_with("WARN", "test module not found");
    assert_eq!(warnings.len(), 1, "captured logs:\n{}", logs.contents());
    assert!(warnings[0].contains(&missing), "{}", warnings[0]);
    Ok(())
}

#[tokio::test]
async fn interrupt_during_build_removes_the_socket_file() -> TestResult {
    init_tracing();

    let address = ChannelAddress::generate();
    let socket = channel::socket_path(&address);
    let listener = channel::bind(&address, &ChannelSection::default())?;
    assert!(socket.exists());

    let coordinator = Coordinator::new(
        address,
        listener,
        HangingTrigger,
        Arc::new(RecordingRunner::new()) as Arc<dyn ModuleRunner>,
        DiscoverySettings::default(),
    );
    let shutdown = coordinator.shutdown_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
    });

    let result = with_timeout(coordinator.run(TriggerMode::BuildAndDiscover)).await;

    assert!(matches!(result, Err(RelayError::Interrupted)), "got {result:?}");
    assert!(!socket.exists(), "socket file left behind at {}", socket.display());
    Ok(())
}

#[tokio::test]
async fn interrupt_while_modules_run_stops_waiting() -> TestResult {
    init_tracing();

    let address = ChannelAddress::generate();
    let socket = channel::socket_path(&address);
    let listener = channel::bind(&address, &ChannelSection::default())?;
    // Far longer than the test timeout; only the interrupt can end the run.
    let runner = RecordingRunner::with_delay(Duration::from_secs(60));

    let coordinator = Coordinator::new(
        address,
        listener,
        NotifyingTrigger::new(vec!["/build/out/Slow.Tests.dll".to_string()]),
        Arc::new(runner.clone()) as Arc<dyn ModuleRunner>,
        DiscoverySettings::default(),
    );
    let shutdown = coordinator.shutdown_token();
    let started = runner.clone();
    tokio::spawn(async move {
        while started.started().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.cancel();
    });

    let result = with_timeout(coordinator.run(TriggerMode::BuildAndDiscover)).await;

    assert!(matches!(result, Err(RelayError::Interrupted)), "got {result:?}");
    assert_eq!(runner.finished(), 0);
    assert!(!socket.exists());
    Ok(())
}
