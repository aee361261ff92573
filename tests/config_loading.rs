// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use testrelay::config::{load_and_validate, load_or_default};
use testrelay::errors::RelayError;
use testrelay_test_utils::builders::ConfigFileBuilder;

#[test]
fn full_config_is_parsed() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[build]
program = "/usr/local/bin/dotnet"
property = "DiscoveryChannel"

[exec]
managed_suffix = ".DLL"
library_arg = "exec"
host = "/opt/dotnet/dotnet"

[channel]
read_buffer_size = 512
max_listeners = 16
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.build.program, "/usr/local/bin/dotnet");
    assert_eq!(cfg.build.property, "DiscoveryChannel");
    assert_eq!(cfg.exec.managed_suffix, ".DLL");
    assert_eq!(cfg.exec.host, Some(PathBuf::from("/opt/dotnet/dotnet")));
    assert_eq!(cfg.exec.library_runner, "dotnet");
    assert_eq!(cfg.channel.read_buffer_size, 512);
    assert_eq!(cfg.channel.max_listeners, 16);
}

#[test]
fn empty_file_means_defaults() {
    let file = NamedTempFile::new().unwrap();
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.build.program, "dotnet");
    assert_eq!(cfg.build.property, "GetTestsProjectPipeName");
    assert_eq!(cfg.exec.managed_suffix, ".dll");
    assert_eq!(cfg.exec.host, None);
    assert_eq!(cfg.channel.read_buffer_size, 4096);
}

#[test]
fn unknown_keys_are_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[exec]\nsuffix = \".dll\"\n").unwrap();

    match load_and_validate(file.path()) {
        Err(RelayError::TomlError(e)) => assert!(e.to_string().contains("suffix")),
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn invalid_values_return_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[channel]\nmax_listeners = 0\n").unwrap();

    match load_and_validate(file.path()) {
        Err(RelayError::ConfigError(msg)) => assert!(msg.contains("max_listeners")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(load_or_default(Some(&missing)).is_err());
}

#[test]
fn builder_produces_valid_config() {
    let cfg = ConfigFileBuilder::new()
        .host("/bin/sh")
        .managed_suffix(".so")
        .read_buffer_size(1)
        .build();
    assert_eq!(cfg.exec.host, Some(PathBuf::from("/bin/sh")));
    assert_eq!(cfg.exec.managed_suffix, ".so");
}
