//! In-memory bus and network doubles for the worker and loop tests.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use telemetry::CanFrame;
use tokio::sync::mpsc;

use crate::bus::FrameSource;
use crate::shutdown::Shutdown;
use crate::sink::TelemetrySink;

/// Frame source fed through a channel; idles forever once the feeder is dropped
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<io::Result<CanFrame>>,
}

pub fn channel_source() -> (mpsc::UnboundedSender<io::Result<CanFrame>>, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource { rx })
}

impl FrameSource for ChannelSource {
    async fn recv(&mut self) -> io::Result<CanFrame> {
        match self.rx.recv().await {
            Some(item) => item,
            None => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Always,
    Never,
    Broken,
}

/// Sink that records every datagram it accepts
#[derive(Clone)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<(Instant, String)>>>,
    readiness: Readiness,
    stop_after: Option<(usize, Shutdown)>,
    reject_every: Option<usize>,
    attempts: Arc<Mutex<usize>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            readiness: Readiness::Always,
            stop_after: None,
            reject_every: None,
            attempts: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Trigger `shutdown` once `count` datagrams have been accepted
    pub fn stop_after(mut self, count: usize, shutdown: Shutdown) -> Self {
        self.stop_after = Some((count, shutdown));
        self
    }

    /// Fail every `n`th send attempt
    pub fn reject_every(mut self, n: usize) -> Self {
        self.reject_every = Some(n);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, line)| line.clone()).collect()
    }

    pub fn timestamps(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

impl TelemetrySink for RecordingSink {
    async fn writable(&self) -> io::Result<()> {
        match self.readiness {
            Readiness::Always => Ok(()),
            Readiness::Never => std::future::pending().await,
            Readiness::Broken => Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed")),
        }
    }

    fn try_send(&self, datagram: &[u8]) -> io::Result<usize> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if let Some(n) = self.reject_every {
            if attempt % n == 0 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "send buffer full"));
            }
        }

        let line = String::from_utf8(datagram.to_vec()).unwrap();
        let count = {
            let mut sent = self.sent.lock().unwrap();
            sent.push((Instant::now(), line));
            sent.len()
        };

        if let Some((limit, shutdown)) = &self.stop_after {
            if count >= *limit {
                shutdown.trigger();
            }
        }
        Ok(datagram.len())
    }
}
