/*!
Telemetry transmission loop.

Walks the decode table one channel per socket write-readiness, then waits
out the cadence delay before starting the next pass. The delay is what turns
"drain as fast as the socket allows" into a steady feed.
*/

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use telemetry::{DecodeTable, ProcessImage};
use tracing::{debug, error, info, warn};

use crate::shutdown::Shutdown;
use crate::sink::TelemetrySink;

/// Counters kept by the transmission loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransmitStats {
    pub passes: u64,
    pub records_sent: u64,
    pub send_failures: u64,
}

/// Sole reader of the process image
pub struct Transmitter {
    table: Arc<DecodeTable>,
    image: Arc<ProcessImage>,
    cadence: Duration,
    stats: TransmitStats,
}

impl Transmitter {
    pub fn new(table: Arc<DecodeTable>, image: Arc<ProcessImage>, cadence: Duration) -> Self {
        Self {
            table,
            image,
            cadence,
            stats: TransmitStats::default(),
        }
    }

    /// Emit passes over the decode table until `shutdown` fires.
    ///
    /// The loop starts idle, so the first pass begins one cadence delay after
    /// the call. A write-readiness error is fatal; failed sends are not.
    pub async fn run<K: TelemetrySink>(
        mut self,
        sink: &K,
        shutdown: &Shutdown,
    ) -> Result<TransmitStats> {
        info!(
            "📤 Transmission loop started ({} channels every {} ms)",
            self.table.len(),
            self.cadence.as_millis()
        );

        let len = self.table.len();
        let mut index = len;

        let outcome: io::Result<()> = loop {
            if index < len {
                let ready = tokio::select! {
                    biased;
                    _ = shutdown.wait() => break Ok(()),
                    ready = sink.writable() => ready,
                };

                if let Err(e) = ready {
                    error!("❌ Telemetry socket failed: {}", e);
                    break Err(e);
                }

                self.emit(index, sink);
                index += 1;
                if index == len {
                    self.stats.passes += 1;
                }
            } else {
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => break Ok(()),
                    _ = tokio::time::sleep(self.cadence) => index = 0,
                }
            }
        };

        shutdown.trigger();
        self.log_stats();
        outcome.context("telemetry output failed")?;
        Ok(self.stats)
    }

    fn emit<K: TelemetrySink>(&mut self, index: usize, sink: &K) {
        let Some(channel) = self.table.get(index) else {
            return;
        };

        let sample = match channel.sample(&self.image) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Skipped channel '{}': {}", channel.spec.label, e);
                return;
            }
        };

        debug!(
            "{} raw={} value={} {}",
            channel.spec.label,
            sample.raw,
            sample.record.value,
            channel.spec.unit.unwrap_or("")
        );

        let datagram = sample.record.to_datagram();
        match sink.try_send(datagram.as_bytes()) {
            Ok(_) => self.stats.records_sent += 1,
            Err(e) => {
                self.stats.send_failures += 1;
                warn!("Dropped sample for point {}: {}", sample.record.point_id, e);
            }
        }
    }

    fn log_stats(&self) {
        info!("📊 Transmission loop final stats:");
        info!("   Passes: {}", self.stats.passes);
        info!("   Records sent: {}", self.stats.records_sent);
        info!("   Send failures: {}", self.stats.send_failures);
    }
}
