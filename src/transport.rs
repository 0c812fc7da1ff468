//! Outbound datagram transport.
//!
//! The lookup engine never waits on the network: queries go out
//! fire-and-forget and responses arrive whenever the socket delivers them.
//! The [`Transport`] trait is the seam between the engine and the socket,
//! which also makes the engine testable with an in-memory stub.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::lookup::LookupError;

/// Fire-and-forget datagram sender.
///
/// Implementations must not block: a send that cannot complete right now
/// is dropped, exactly like a datagram lost in flight.
pub trait Transport: Send + Sync {
    fn send_to(&self, payload: &[u8], addr: SocketAddr);
}

/// [`Transport`] over a tokio UDP socket.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    /// Binds a UDP socket on all interfaces. Port 0 picks an ephemeral
    /// port.
    pub async fn bind(port: u16) -> Result<Self, LookupError> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// The underlying socket, for driving a receive loop.
    pub fn socket(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.socket)
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LookupError> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, payload: &[u8], addr: SocketAddr) {
        // Best effort: UDP gives no delivery guarantee anyway, so a socket
        // that is not ready is treated the same as a lost packet.
        if let Err(e) = self.socket.try_send_to(payload, addr) {
            debug!(%addr, error = %e, "udp send failed");
        }
    }
}
