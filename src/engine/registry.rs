// src/engine/registry.rs

//! Task registries: counting barriers over a growing set of tasks.
//!
//! Each registry tracks every task spawned through it. [`TaskRegistry::join`]
//! closes the registry and waits until no tracked task is alive; tasks added
//! after closing are still tracked and awaited, so a join never returns while
//! work spawned by a still-running task is outstanding.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

#[derive(Debug)]
pub struct TaskRegistry {
    name: &'static str,
    tracker: TaskTracker,
    spawned: AtomicUsize,
    faults: Mutex<Vec<String>>,
}

impl TaskRegistry {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            tracker: TaskTracker::new(),
            spawned: AtomicUsize::new(0),
            faults: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Spawn and register a task. An `Err` result or a panic is recorded as a
    /// fault rather than lost.
    pub fn spawn<F>(self: &Arc<Self>, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let seq = self.spawned.fetch_add(1, Ordering::SeqCst);
        let this = Arc::clone(self);

        self.tracker.spawn(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {
                    debug!(registry = this.name, seq, "task finished");
                }
                Ok(Err(err)) => {
                    error!(registry = this.name, seq, error = %format!("{err:#}"), "task failed");
                    this.record_fault(format!("{err:#}"));
                }
                Err(_) => {
                    error!(registry = this.name, seq, "task panicked");
                    this.record_fault(format!("{} task {seq} panicked", this.name));
                }
            }
        });
    }

    /// Close the registry and wait for quiescence (no live tasks).
    pub async fn join(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        debug!(registry = self.name, spawned = self.spawned(), "registry drained");
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Tasks still alive.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn faults(&self) -> Vec<String> {
        match self.faults.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record_fault(&self, msg: String) {
        match self.faults.lock() {
            Ok(mut guard) => guard.push(msg),
            Err(poisoned) => poisoned.into_inner().push(msg),
        }
    }
}

/// The two registries of a run, owned by the coordinator and shared by
/// reference with the tasks that spawn into them.
#[derive(Debug, Clone)]
pub struct Registries {
    pub discovery: Arc<TaskRegistry>,
    pub executor: Arc<TaskRegistry>,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            discovery: TaskRegistry::new("discovery"),
            executor: TaskRegistry::new("executor"),
        }
    }

    /// Discovery first: once it is quiescent nothing else can add executor
    /// tasks, so the executor join that follows observes the final set.
    pub async fn join_all(&self) {
        self.discovery.join().await;
        self.executor.join().await;
    }

    pub fn faults(&self) -> Vec<String> {
        let mut faults = self.discovery.faults();
        faults.extend(self.executor.faults());
        faults
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
