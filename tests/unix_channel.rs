// tests/unix_channel.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;

use testrelay::channel::{self, ChannelAddress};
use testrelay::config::ChannelSection;
use testrelay::engine::{Coordinator, DiscoverySettings};
use testrelay::errors::RelayError;
use testrelay::exec::ModuleRunner;
use testrelay::types::TriggerMode;
use testrelay_test_utils::fake_runner::RecordingRunner;
use testrelay_test_utils::fake_trigger::NotifyingTrigger;
use testrelay_test_utils::{init_tracing, with_timeout};

type TestResult = std::result::Result<(), Box<dyn Error>>;

#[tokio::test]
async fn modules_reported_over_a_unix_socket_are_all_run() -> TestResult {
    init_tracing();

    let address = ChannelAddress::generate();
    let listener = channel::bind(&address, &ChannelSection::default())?;
    let runner = RecordingRunner::new();

    let modules: Vec<String> = (0..8)
        .map(|i| format!("/build/out/Socket{i}.Tests.dll"))
        .collect();

    let coordinator = Coordinator::new(
        address,
        listener,
        NotifyingTrigger::new(modules.clone()),
        Arc::new(runner.clone()) as Arc<dyn ModuleRunner>,
        DiscoverySettings::default(),
    );
    let summary = with_timeout(coordinator.run(TriggerMode::BuildAndDiscover)).await?;

    assert_eq!(summary.executed, modules.len());
    let mut started = runner.started();
    started.sort();
    let mut expected = modules;
    expected.sort();
    assert_eq!(started, expected);
    Ok(())
}

#[tokio::test]
async fn binding_the_same_address_twice_is_a_channel_error() -> TestResult {
    init_tracing();

    let address = ChannelAddress::generate();
    let _first = channel::bind(&address, &ChannelSection::default())?;
    match channel::bind(&address, &ChannelSection::default()) {
        Err(RelayError::ChannelError(msg)) => assert!(msg.contains("binding")),
        Err(other) => panic!("expected ChannelError, got {other:?}"),
        Ok(_) => panic!("second bind unexpectedly succeeded"),
    }
    Ok(())
}

#[tokio::test]
async fn notify_without_listener_fails() {
    init_tracing();

    let address = ChannelAddress::generate();
    assert!(channel::notify(&address, "/build/out/A.dll").await.is_err());
}
