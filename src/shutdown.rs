use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Stop request shared between a signal watcher and the pipeline.
///
/// The pipeline polls it between elements; nothing is cancelled mid-element.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }

    /// Spawns a task on `runtime` that requests shutdown on ctrl-c.
    pub fn watch_ctrl_c(&self, runtime: &Runtime) {
        let shutdown = self.clone();
        runtime.spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received interrupt, stopping after the current element");
                    shutdown.request();
                }
                Err(e) => warn!(error = %e, "Failed to listen for interrupt signal"),
            }
        });
    }
}
