/*!
UDP telemetry output.

[`TelemetrySink`] is the seam between the transmission loop and the network:
wait for write readiness, then hand over one datagram without blocking.
*/

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::info;

/// Destination for telemetry datagrams
#[allow(async_fn_in_trait)]
pub trait TelemetrySink {
    /// Wait until a datagram can be handed over. Must be cancel safe.
    ///
    /// An `Err` means the sink is unusable.
    async fn writable(&self) -> io::Result<()>;

    /// Send one datagram without blocking. Failures are not retried by callers.
    fn try_send(&self, datagram: &[u8]) -> io::Result<usize>;
}

/// Unconnected UDP socket sending to a fixed destination
#[derive(Debug)]
pub struct UdpTelemetry {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpTelemetry {
    /// Create the output socket.
    ///
    /// Must run inside the tokio runtime that drives the transmission loop.
    pub fn open(destination: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(
            Domain::for_address(destination),
            Type::DGRAM,
            Some(Protocol::UDP),
        )?;

        let local: SocketAddr = match destination {
            SocketAddr::V4(_) => {
                // Subnet broadcast addresses look like unicast, so always allow it
                socket.set_broadcast(true)?;
                (Ipv4Addr::UNSPECIFIED, 0).into()
            }
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        socket.bind(&local.into())?;
        socket.set_nonblocking(true)?;

        let socket = UdpSocket::from_std(socket.into())?;
        info!("📡 Telemetry output to {}", destination);

        Ok(Self { socket, destination })
    }
}

impl TelemetrySink for UdpTelemetry {
    async fn writable(&self) -> io::Result<()> {
        self.socket.writable().await
    }

    fn try_send(&self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.try_send_to(datagram, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_datagram_reaches_loopback_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let destination = listener.local_addr().unwrap();

        let sink = UdpTelemetry::open(destination).unwrap();

        sink.writable().await.unwrap();
        let sent = sink.try_send(b"179,4096.000\n").unwrap();
        assert_eq!(sent, 13);

        let mut buf = [0u8; 64];
        let len = tokio::time::timeout(Duration::from_secs(1), listener.recv(&mut buf))
            .await
            .expect("no datagram received")
            .unwrap();

        assert_eq!(&buf[..len], b"179,4096.000\n");
    }
}
