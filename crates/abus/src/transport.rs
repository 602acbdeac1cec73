// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Transport drivers: UDP broadcast and in-memory.

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use log::debug;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Datagram driver underneath an [`crate::Endpoint`].
///
/// One datagram carries exactly one frame. Receiving must never block.
pub trait AbusTransport: Send {
    /// Send one datagram to `dest`.
    fn send_to(&mut self, dest: SocketAddr, data: &[u8]) -> Result<()>;

    /// Receive one datagram into `buf` if one is pending.
    ///
    /// Returns `Ok(None)` when nothing is available.
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>>;

    /// Re-initialise the binding after the stream of input looked corrupt.
    fn reset(&mut self) -> Result<()>;

    /// Locally bound address, if any
    fn local_addr(&self) -> Option<SocketAddr>;
}

// ---------------------------------------------------------------------------
// UDP transport
// ---------------------------------------------------------------------------

/// Non-blocking UDP socket with broadcast enabled.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    port: u16,
}

impl UdpTransport {
    /// Bind `0.0.0.0:<port>`; port 0 lets the OS pick one.
    pub fn bind(port: u16) -> Result<Self> {
        let socket = open_socket(port)?;
        let port = socket.local_addr()?.port();
        debug!("[abus] UDP transport bound on port {}", port);
        Ok(Self { socket, port })
    }

    /// Bound port
    pub fn port(&self) -> u16 {
        self.port
    }

    // The replacement is bound while the old socket still holds the port
    // (both set SO_REUSEADDR); on failure the old socket stays in place.
    fn rebind<F>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce(u16) -> io::Result<UdpSocket>,
    {
        let socket = open(self.port)?;
        self.socket = socket;
        debug!("[abus] UDP transport rebound on port {}", self.port);
        Ok(())
    }
}

fn open_socket(port: u16) -> io::Result<UdpSocket> {
    let addr: SocketAddr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into();
    let socket = socket2::Socket::new(
        socket2::Domain::IPV4,
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.bind(&addr.into())?;
    // Non-blocking so poll() never stalls the control loop
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

impl AbusTransport for UdpTransport {
    fn send_to(&mut self, dest: SocketAddr, data: &[u8]) -> Result<()> {
        let sent = self.socket.send_to(data, dest)?;
        if sent != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {} of {} bytes", sent, data.len()),
            )
            .into());
        }
        Ok(())
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, peer)) => Ok(Some((len, peer))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.rebind(open_socket)
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }
}

// ---------------------------------------------------------------------------
// In-memory transport
// ---------------------------------------------------------------------------

/// In-process transport: queued inbound datagrams and a log of sent ones.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<(Vec<u8>, SocketAddr)>,
    sent: Vec<(SocketAddr, Vec<u8>)>,
    resets: usize,
    fail_sends: bool,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram for the next `try_recv`
    pub fn push_inbound(&mut self, data: impl Into<Vec<u8>>) {
        self.push_inbound_from(data, SocketAddr::from((Ipv4Addr::LOCALHOST, 0)));
    }

    /// Queue a datagram from a specific peer
    pub fn push_inbound_from(&mut self, data: impl Into<Vec<u8>>, peer: SocketAddr) {
        self.inbound.push_back((data.into(), peer));
    }

    /// Datagrams still waiting to be received
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Everything sent so far
    pub fn sent(&self) -> &[(SocketAddr, Vec<u8>)] {
        &self.sent
    }

    /// Drain the sent log
    pub fn take_sent(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        std::mem::take(&mut self.sent)
    }

    /// Number of `reset` calls
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Make every subsequent send fail (or succeed again)
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }
}

impl AbusTransport for MemoryTransport {
    fn send_to(&mut self, dest: SocketAddr, data: &[u8]) -> Result<()> {
        if self.fail_sends {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport down").into());
        }
        self.sent.push((dest, data.to_vec()));
        Ok(())
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        Ok(self.inbound.pop_front().map(|(data, peer)| {
            // Datagram semantics: excess bytes are lost
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            (len, peer)
        }))
    }

    fn reset(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let mut transport = MemoryTransport::new();
        transport.push_inbound(vec![1, 2, 3]);
        assert_eq!(transport.pending(), 1);

        let mut buf = [0u8; 2];
        let (len, _) = transport.try_recv(&mut buf).unwrap().unwrap();
        assert_eq!(len, 2);
        assert_eq!(buf, [1, 2]);
        assert!(transport.try_recv(&mut buf).unwrap().is_none());

        let dest: SocketAddr = "127.0.0.1:8442".parse().unwrap();
        transport.send_to(dest, &[9]).unwrap();
        transport.set_fail_sends(true);
        assert!(transport.send_to(dest, &[10]).is_err());
        assert_eq!(transport.take_sent(), vec![(dest, vec![9])]);
        assert!(transport.sent().is_empty());

        transport.reset().unwrap();
        assert_eq!(transport.resets(), 1);
    }

    #[test]
    fn test_udp_loopback() {
        let mut rx = UdpTransport::bind(0).unwrap();
        let mut tx = UdpTransport::bind(0).unwrap();
        let dest: SocketAddr = (Ipv4Addr::LOCALHOST, rx.port()).into();

        let mut buf = [0u8; 64];
        assert!(rx.try_recv(&mut buf).unwrap().is_none());

        tx.send_to(dest, &[0xAA, 0x55, 0x01]).unwrap();

        let mut received = None;
        for _ in 0..200 {
            if let Some(got) = rx.try_recv(&mut buf).unwrap() {
                received = Some(got);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let (len, _) = received.expect("datagram not received");
        assert_eq!(buf[..len], [0xAA, 0x55, 0x01]);
    }

    #[test]
    fn test_udp_reset_keeps_port() {
        let mut transport = UdpTransport::bind(0).unwrap();
        let port = transport.port();
        transport.reset().unwrap();
        assert_eq!(transport.local_addr().map(|a| a.port()), Some(port));
    }

    #[test]
    fn test_udp_failed_rebind_keeps_socket() {
        let mut rx = UdpTransport::bind(0).unwrap();
        let mut tx = UdpTransport::bind(0).unwrap();
        let port = rx.port();

        let result = rx.rebind(|_| Err(io::Error::new(io::ErrorKind::AddrInUse, "busy")));
        assert!(matches!(result, Err(crate::AbusError::Io(_))));
        assert_eq!(rx.local_addr().map(|a| a.port()), Some(port));

        // Still reachable on the original port
        let dest: SocketAddr = (Ipv4Addr::LOCALHOST, port).into();
        tx.send_to(dest, &[0xAA, 0x55]).unwrap();
        let mut buf = [0u8; 8];
        let mut received = None;
        for _ in 0..200 {
            if let Some(got) = rx.try_recv(&mut buf).unwrap() {
                received = Some(got);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(received.map(|(len, _)| len), Some(2));
    }
}
