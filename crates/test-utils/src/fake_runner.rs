use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use testrelay::exec::ModuleRunner;
use testrelay::types::ModuleId;

/// A fake runner that:
/// - records which modules were "run" and which finished
/// - optionally sleeps to simulate a test process that takes a while
#[derive(Clone, Default)]
pub struct RecordingRunner {
    started: Arc<Mutex<Vec<String>>>,
    finished: Arc<AtomicUsize>,
    delay: Duration,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ModuleRunner for RecordingRunner {
    fn run(&self, module: ModuleId) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.started.lock().unwrap().push(module.as_str().to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
