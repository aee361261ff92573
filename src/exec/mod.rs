// src/exec/mod.rs

//! Test executor layer.
//!
//! Responsible for launching each discovered test module with
//! `tokio::process::Command` and waiting for it to exit.
//!
//! - [`launch`] decides *how* a module is started (library host vs native).
//! - [`task_runner`] validates the module, spawns it and awaits its exit.
//! - [`backend`] provides the `ModuleRunner` trait and the concrete
//!   `ProcessRunner` the coordinator uses in production, which tests can
//!   replace with a recording fake.

pub mod backend;
pub mod launch;
pub mod task_runner;

pub use backend::{ModuleRunner, ProcessRunner};
pub use launch::{LaunchPlan, LaunchSettings};
pub use task_runner::{run_module, ModuleOutcome};
