//! UDP transport for frame packets.
//!
//! One datagram per [`Packet`], fire-and-forget. Nothing here orders,
//! acknowledges or retries; the receiver copes with whatever arrives.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tracing::trace;

use crate::error::FrameError;
use crate::header::MAX_DATAGRAM_SIZE;
use crate::packet::Packet;

// ── TransportStats ───────────────────────────────────────────────

/// Datagram and byte counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub datagrams_sent: u64,
    pub bytes_sent: u64,
    pub datagrams_received: u64,
    pub bytes_received: u64,
}

// ── FrameTransport ───────────────────────────────────────────────

/// Thin wrapper over a `UdpSocket` that speaks framecast packets.
///
/// A sending transport targets one `remote` address. A receiving
/// transport accepts datagrams from anyone; exactly one sender per
/// endpoint is supported.
pub struct FrameTransport {
    socket: UdpSocket,
    remote: Option<SocketAddr>,
    datagrams_sent: AtomicU64,
    bytes_sent: AtomicU64,
    datagrams_received: AtomicU64,
    bytes_received: AtomicU64,
}

impl FrameTransport {
    /// Wrap an already-bound socket that sends to `remote`.
    pub fn sender(socket: UdpSocket, remote: SocketAddr) -> Self {
        Self::wrap(socket, Some(remote))
    }

    /// Wrap an already-bound socket that only receives.
    pub fn receiver(socket: UdpSocket) -> Self {
        Self::wrap(socket, None)
    }

    /// Bind an ephemeral local port and target `remote`.
    pub async fn connect(remote: SocketAddr) -> Result<Self, FrameError> {
        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::sender(socket, remote))
    }

    /// Bind `local` for receiving.
    pub async fn bind(local: SocketAddr) -> Result<Self, FrameError> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::receiver(socket))
    }

    fn wrap(socket: UdpSocket, remote: Option<SocketAddr>) -> Self {
        Self {
            socket,
            remote,
            datagrams_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            datagrams_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    /// Send one packet as one datagram.
    pub async fn send_packet(&self, packet: &Packet) -> Result<(), FrameError> {
        let remote = self
            .remote
            .ok_or_else(|| FrameError::Other("transport has no remote address".into()))?;
        let datagram = packet.to_datagram();
        self.socket.send_to(&datagram, remote).await?;

        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(datagram.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Send every packet of a frame in index order.
    pub async fn send_frame(&self, packets: &[Packet]) -> Result<(), FrameError> {
        for packet in packets {
            self.send_packet(packet).await?;
        }
        if let Some(first) = packets.first() {
            trace!(seq = %first.sequence(), parts = packets.len(), "frame sent");
        }
        Ok(())
    }

    /// Wait for the next datagram and copy it into `buf`.
    ///
    /// Use [`recv_buffer`](Self::recv_buffer); datagrams longer than
    /// `buf` are truncated by the OS.
    pub async fn recv_datagram(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), FrameError> {
        let (len, from) = self.socket.recv_from(buf).await?;
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
        Ok((len, from))
    }

    /// A receive buffer one byte longer than any valid framecast datagram.
    ///
    /// An oversized datagram then keeps a payload longer than the protocol
    /// maximum after OS truncation, and the reassembler drops it instead of
    /// mistaking it for a full-size part.
    pub fn recv_buffer() -> Vec<u8> {
        vec![0u8; MAX_DATAGRAM_SIZE + 1]
    }

    pub fn stats(&self) -> TransportStats {
        TransportStats {
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, FrameError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }
}

// ── Tests ────────────────────────────────────────────────────────
