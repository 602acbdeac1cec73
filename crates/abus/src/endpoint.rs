// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Abus endpoint
//!
//! Owns a transport, the dispatch registry and the counters. The host drives
//! it by calling [`Endpoint::poll`] from its control loop; each call handles
//! at most one datagram and never blocks.

use log::{debug, trace, warn};

use crate::codec::encode_frame;
use crate::config::AbusConfig;
use crate::error::{AbusError, Result};
use crate::frame::check_frame;
use crate::header::Header;
use crate::record::{Record, Shape};
use crate::registry::{Handle, RecordHandler, Registry};
use crate::stats::{DispatchReport, EndpointStats};
use crate::transport::{AbusTransport, UdpTransport};
use crate::MAX_FRAME_LEN;

/// Abus socket endpoint over transport `T`
pub struct Endpoint<T: AbusTransport> {
    config: AbusConfig,
    transport: T,
    registry: Registry,
    stats: EndpointStats,
    next_timestamp: u16,
}

impl Endpoint<UdpTransport> {
    /// Open a UDP endpoint on `config.local_port` with broadcast enabled.
    pub fn bind(config: AbusConfig) -> Result<Self> {
        let transport = UdpTransport::bind(config.local_port)?;
        Self::new(config, transport)
    }
}

impl<T: AbusTransport> Endpoint<T> {
    /// Create an endpoint over an already opened transport.
    pub fn new(config: AbusConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            registry: Registry::new(),
            stats: EndpointStats::default(),
            next_timestamp: 0,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AbusConfig {
        &self.config
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Subscription table
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> EndpointStats {
        self.stats
    }

    /// Subscribe `handler` to records of `shape`.
    pub fn subscribe<H>(&mut self, shape: Shape, handler: H) -> Result<Handle>
    where
        H: RecordHandler + 'static,
    {
        self.registry.register(shape, handler)
    }

    /// Subscribe with the shape given as individual field counts.
    pub fn subscribe_counts<H>(
        &mut self,
        socket_id: u8,
        bits: u8,
        ints: u8,
        longs: u8,
        reals: u8,
        handler: H,
    ) -> Result<Handle>
    where
        H: RecordHandler + 'static,
    {
        self.subscribe(Shape::new(socket_id, bits, ints, longs, reals), handler)
    }

    /// Remove a subscription. Takes effect from the next received frame.
    pub fn unsubscribe(&mut self, handle: Handle) -> bool {
        self.registry.unregister(handle)
    }

    /// Handle at most one pending datagram.
    ///
    /// # Returns
    ///
    /// `true` if a datagram was consumed, `false` if none was pending
    pub fn poll(&mut self) -> Result<bool> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        match self.transport.try_recv(&mut buf)? {
            Some((len, peer)) => {
                trace!("[abus] {} bytes from {}", len, peer);
                self.on_frame_received(&buf[..len]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Receive path for one datagram.
    ///
    /// Returns the dispatch outcome for socket frames, `None` for rejected
    /// and non-socket frames.
    pub fn on_frame_received(&mut self, frame: &[u8]) -> Option<DispatchReport> {
        self.stats.frames_received += 1;

        if let Err(err) = check_frame(frame) {
            self.stats.frames_malformed += 1;
            warn!("[abus] dropping frame: {}", err);
            if self.config.reset_on_malformed {
                self.reset_transport();
            }
            return None;
        }

        let header = Header::decode(frame);
        if !header.is_socket() {
            self.stats.frames_non_socket += 1;
            debug!(
                "[abus] non-socket frame from {} (direction {}, type {}): {}",
                header.from,
                header.direction,
                header.type_id,
                hex(frame)
            );
            return None;
        }

        let report = self.registry.dispatch(frame, &header);
        if report.matched == 0 {
            debug!(
                "[abus] no subscription for socket {} from {}",
                header.type_id, header.from
            );
        }
        self.stats.record_dispatch(&report);
        Some(report)
    }

    fn reset_transport(&mut self) {
        match self.transport.reset() {
            Ok(()) => {
                self.stats.transport_resets += 1;
                warn!("[abus] transport reset after malformed frame");
            }
            Err(e) => warn!("[abus] transport reset failed: {}", e),
        }
    }

    /// Encode and send a record to the configured destination.
    ///
    /// A record with sender 0 is sent as `own_nad`. Nothing is transmitted
    /// when a construction check fails.
    ///
    /// # Returns
    ///
    /// Frame length
    pub fn send_record(&mut self, record: &Record) -> Result<usize> {
        let frame = match self.build_frame(record) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("[abus] not sending socket {}: {}", record.socket_id(), e);
                return Err(e);
            }
        };
        self.send_raw(&frame)?;
        // Correlation ids are only used up by frames that left
        self.next_timestamp = self.next_timestamp.wrapping_add(1);
        Ok(frame.len())
    }

    fn build_frame(&self, record: &Record) -> Result<Vec<u8>> {
        if record.socket_id() == 0 {
            return Err(AbusError::MissingSocketId);
        }
        let sender = match (record.sender, self.config.own_nad) {
            (0, 0) => return Err(AbusError::MissingSender),
            (0, own) => own,
            (sender, _) => sender,
        };
        if record.field_count() == 0 {
            return Err(AbusError::EmptyRecord);
        }

        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = if sender == record.sender {
            encode_frame(&mut buf, record, 0, self.next_timestamp)?
        } else {
            let record = record.clone().with_sender(sender);
            encode_frame(&mut buf, &record, 0, self.next_timestamp)?
        };
        Ok(buf[..len].to_vec())
    }

    /// Send pre-built bytes to the configured destination. Not retried.
    pub fn send_raw(&mut self, frame: &[u8]) -> Result<()> {
        let dest = self.config.destination();
        trace!("[abus] -> {} {}", dest, hex(frame));
        match self.transport.send_to(dest, frame) {
            Ok(()) => {
                self.stats.frames_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.send_failures += 1;
                warn!("[abus] send to {} failed: {}", dest, e);
                Err(e)
            }
        }
    }
}

impl<T: AbusTransport + core::fmt::Debug> core::fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Endpoint")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("registry", &self.registry)
            .field("stats", &self.stats)
            .finish()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
