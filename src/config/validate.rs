// src/config/validate.rs

use crate::config::model::{ConfigFile, MAX_LISTENER_INSTANCES};
use crate::errors::{RelayError, Result};

pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_build(cfg)?;
    validate_exec(cfg)?;
    validate_channel(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> RelayError {
    RelayError::ConfigError(msg.into())
}

fn validate_build(cfg: &ConfigFile) -> Result<()> {
    if cfg.build.program.trim().is_empty() {
        return Err(config_error("[build].program must not be empty"));
    }
    if cfg.build.property.trim().is_empty() {
        return Err(config_error("[build].property must not be empty"));
    }
    Ok(())
}

fn validate_exec(cfg: &ConfigFile) -> Result<()> {
    let suffix = &cfg.exec.managed_suffix;
    if suffix.len() < 2 || !suffix.starts_with('.') {
        return Err(config_error(format!(
            "[exec].managed_suffix must look like \".ext\" (got {suffix:?})"
        )));
    }
    if cfg.exec.library_arg.trim().is_empty() {
        return Err(config_error("[exec].library_arg must not be empty"));
    }
    if cfg.exec.library_runner.trim().is_empty() {
        return Err(config_error("[exec].library_runner must not be empty"));
    }
    Ok(())
}

fn validate_channel(cfg: &ConfigFile) -> Result<()> {
    if cfg.channel.read_buffer_size == 0 {
        return Err(config_error("[channel].read_buffer_size must be >= 1 (got 0)"));
    }
    let max = cfg.channel.max_listeners;
    if max == 0 || max > MAX_LISTENER_INSTANCES {
        return Err(config_error(format!(
            "[channel].max_listeners must be in 1..={MAX_LISTENER_INSTANCES} (got {max})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ConfigFile::default()).is_ok());
    }

    #[test]
    fn suffix_without_dot_is_rejected() {
        let mut cfg = ConfigFile::default();
        cfg.exec.managed_suffix = "dll".to_string();
        match validate_config(&cfg) {
            Err(RelayError::ConfigError(msg)) => assert!(msg.contains("managed_suffix")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_read_buffer_is_rejected() {
        let mut cfg = ConfigFile::default();
        cfg.channel.read_buffer_size = 0;
        assert!(matches!(validate_config(&cfg), Err(RelayError::ConfigError(_))));
    }

    #[test]
    fn listener_bound_is_enforced() {
        let mut cfg = ConfigFile::default();
        cfg.channel.max_listeners = MAX_LISTENER_INSTANCES + 1;
        assert!(matches!(validate_config(&cfg), Err(RelayError::ConfigError(_))));
    }
}
