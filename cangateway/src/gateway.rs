/*!
Gateway orchestration.

Owns the shared state, starts the ingestion worker on its own thread, runs
the transmission loop on the calling thread and always joins the worker
before returning.
*/

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use telemetry::{haltech, DecodeTable, ProcessImage, TrackedIds};
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};

use crate::bus::FrameSource;
use crate::ingest::{IngestStats, IngestWorker};
use crate::shutdown::Shutdown;
use crate::sink::TelemetrySink;
use crate::transmit::{TransmitStats, Transmitter};

/// Runtime for one side of the gateway; each side is single threaded
pub fn current_thread_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Final counters of both tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayReport {
    pub ingest: IngestStats,
    pub transmit: TransmitStats,
}

pub struct Gateway {
    tracked: Arc<TrackedIds>,
    table: Arc<DecodeTable>,
    image: Arc<ProcessImage>,
    shutdown: Shutdown,
    cadence: Duration,
}

impl Gateway {
    pub fn new(tracked: TrackedIds, table: DecodeTable, cadence: Duration) -> Self {
        let image = ProcessImage::for_tracked(&tracked);
        Self {
            tracked: Arc::new(tracked),
            table: Arc::new(table),
            image: Arc::new(image),
            shutdown: Shutdown::new(),
            cadence,
        }
    }

    /// Gateway over the compiled-in Haltech v2 tables
    pub fn haltech(cadence: Duration) -> telemetry::Result<Self> {
        let tracked = haltech::tracked_ids();
        let table = haltech::decode_table(&tracked)?;
        Ok(Self::new(tracked, table, cadence))
    }

    /// Handle for requesting a stop from outside, e.g. a signal handler
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run until either task stops.
    ///
    /// `source` must already be registered with `worker_runtime`, and `sink`
    /// with `runtime`. A worker failure is reported in preference to a
    /// transmitter failure, since it is what brings the loop down.
    pub fn run<S, K>(
        self,
        worker_runtime: Runtime,
        source: S,
        runtime: &Runtime,
        sink: &K,
    ) -> Result<GatewayReport>
    where
        S: FrameSource + Send + 'static,
        K: TelemetrySink,
    {
        let worker = IngestWorker::new(
            source,
            Arc::clone(&self.tracked),
            Arc::clone(&self.image),
            self.shutdown.clone(),
        );
        let handle = worker
            .spawn(worker_runtime)
            .context("failed to spawn ingestion worker")?;

        let transmitter =
            Transmitter::new(Arc::clone(&self.table), Arc::clone(&self.image), self.cadence);
        let transmitted = runtime.block_on(transmitter.run(sink, &self.shutdown));

        self.shutdown.trigger();
        let ingested = handle
            .join()
            .unwrap_or_else(|_| Err(anyhow!("ingestion worker panicked")));
        info!("🛑 Ingestion worker joined");

        match (ingested, transmitted) {
            (Ok(ingest), Ok(transmit)) => Ok(GatewayReport { ingest, transmit }),
            (Err(worker_err), Err(loop_err)) => {
                error!("Transmission loop also failed: {:#}", loop_err);
                Err(worker_err)
            }
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        }
    }
}
