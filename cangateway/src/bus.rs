/*!
CAN bus input.

[`FrameSource`] is the seam between the ingestion worker and the bus. The
production source is a raw SocketCAN socket driven by tokio readiness, so the
worker sleeps until a frame arrives instead of polling on a timer.
*/

use std::io;
use std::os::fd::{AsFd, AsRawFd};

use socket2::SockRef;
use socketcan::{CanSocket, EmbeddedFrame, Frame, Socket};
use telemetry::CanFrame;
use tokio::io::unix::{AsyncFd, AsyncFdReadyGuard};
use tokio::io::Interest;
use tracing::{debug, info};

/// A failed interface raises only an error condition, never readability
const BUS_INTEREST: Interest = Interest::READABLE.add(Interest::ERROR);

/// Anything that yields bus frames
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    /// Wait for the next frame. Must be cancel safe: it is raced against shutdown.
    ///
    /// An `Err` means the bus can no longer be read.
    async fn recv(&mut self) -> io::Result<CanFrame>;
}

/// Raw SocketCAN socket bound to one interface
pub struct CanBus {
    interface: String,
    fd: AsyncFd<CanSocket>,
}

impl CanBus {
    /// Open and bind a raw CAN socket on `interface`.
    ///
    /// Must run inside the tokio runtime that will drive [`FrameSource::recv`],
    /// since the socket is registered with that runtime's reactor.
    pub fn open(interface: &str) -> io::Result<Self> {
        info!("🔌 Opening CAN socket on {}", interface);

        let socket = CanSocket::open(interface).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to open CAN interface {}: {}", interface, e))
        })?;
        socket.set_nonblocking(true)?;

        let fd = AsyncFd::with_interest(socket, BUS_INTEREST)?;
        info!("✅ CAN socket bound to {}", interface);

        Ok(Self {
            interface: interface.to_string(),
            fd,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl FrameSource for CanBus {
    async fn recv(&mut self) -> io::Result<CanFrame> {
        loop {
            let mut guard = wait_for_frame(&self.fd).await?;

            match guard.try_io(|inner| inner.get_ref().read_frame()) {
                Ok(result) => match data_frame(result?) {
                    Some(frame) => return Ok(frame),
                    None => continue,
                },
                // Spurious wakeup, readiness has been cleared
                Err(_would_block) => continue,
            }
        }
    }
}

/// Wait until `fd` has a frame to read.
///
/// A pending socket error (interface down or removed) is returned as the
/// receive error.
async fn wait_for_frame<T>(fd: &AsyncFd<T>) -> io::Result<AsyncFdReadyGuard<'_, T>>
where
    T: AsRawFd + AsFd,
{
    let guard = fd.ready(BUS_INTEREST).await?;
    if guard.ready().is_error() {
        let pending = SockRef::from(guard.get_inner()).take_error()?;
        return Err(pending.unwrap_or_else(|| io::Error::other("CAN socket error condition")));
    }
    Ok(guard)
}

/// Payload-carrying frames only. A remote request has no data and must not
/// clear the slot of its identifier.
fn data_frame(frame: socketcan::CanFrame) -> Option<CanFrame> {
    match frame {
        socketcan::CanFrame::Data(data) => Some(CanFrame::new(
            Frame::raw_id(&data),
            EmbeddedFrame::data(&data),
        )),
        other => {
            debug!("Skipped non-data frame 0x{:X}", Frame::raw_id(&other));
            None
        }
    }
}
