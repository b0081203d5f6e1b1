/*!
Frame ingestion worker.

Runs on its own thread: waits for a bus frame or the stop signal, filters the
frame against the tracked-ID index and copies its payload into the process
image. Any bus error ends the worker, and every exit route triggers shutdown
so the transmission loop stops with it.
*/

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use telemetry::{CanFrame, ProcessImage, TrackedIds};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use crate::bus::FrameSource;
use crate::shutdown::Shutdown;

/// Frame counters kept by the worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub frames_received: u64,
    pub frames_stored: u64,
    pub unknown_ids: u64,
    pub oversized: u64,
}

/// Sole writer of the process image
pub struct IngestWorker<S> {
    source: S,
    tracked: Arc<TrackedIds>,
    image: Arc<ProcessImage>,
    shutdown: Shutdown,
    stats: IngestStats,
}

impl<S: FrameSource> IngestWorker<S> {
    pub fn new(
        source: S,
        tracked: Arc<TrackedIds>,
        image: Arc<ProcessImage>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            source,
            tracked,
            image,
            shutdown,
            stats: IngestStats::default(),
        }
    }

    /// Receive frames until stopped or the bus fails
    pub async fn run(mut self) -> Result<IngestStats> {
        let _guard = self.shutdown.guard();
        info!("📥 Ingestion worker started ({} tracked IDs)", self.tracked.len());

        let outcome: io::Result<()> = loop {
            let received = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break Ok(()),
                received = self.source.recv() => received,
            };

            match received {
                Ok(frame) => self.ingest(&frame),
                Err(e) => {
                    error!("❌ CAN receive failed, ingestion stopped: {}", e);
                    break Err(e);
                }
            }
        };

        self.log_stats();
        outcome.context("CAN bus receive failed")?;
        Ok(self.stats)
    }

    fn ingest(&mut self, frame: &CanFrame) {
        self.stats.frames_received += 1;

        if frame.is_oversized() {
            self.stats.oversized += 1;
            debug!("Rejected 0x{:03X}: {} byte payload", frame.id(), frame.len());
            return;
        }

        let Some(slot) = self.tracked.slot_of(frame.id()) else {
            self.stats.unknown_ids += 1;
            return;
        };

        match self.image.store(slot, frame.data()) {
            Ok(()) => self.stats.frames_stored += 1,
            Err(e) => warn!("Dropped frame 0x{:03X}: {}", frame.id(), e),
        }
    }

    fn log_stats(&self) {
        info!("📊 Ingestion worker final stats:");
        info!("   Frames received: {}", self.stats.frames_received);
        info!("   Frames stored: {}", self.stats.frames_stored);
        info!("   Unknown IDs: {}", self.stats.unknown_ids);
        info!("   Oversized: {}", self.stats.oversized);
    }
}

impl<S: FrameSource + Send + 'static> IngestWorker<S> {
    /// Run the worker on a dedicated thread, driven by `runtime`.
    ///
    /// `runtime` must be the one the source was registered with.
    pub fn spawn(self, runtime: Runtime) -> io::Result<JoinHandle<Result<IngestStats>>> {
        thread::Builder::new()
            .name("can-ingest".to_string())
            .spawn(move || runtime.block_on(self.run()))
    }
}
