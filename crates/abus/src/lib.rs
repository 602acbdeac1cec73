// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Abus - typed socket records over UDP
//!
//! Compact binary protocol for exchanging fixed-layout records between a
//! controller and embedded peripheral nodes. Each datagram carries one frame;
//! each frame carries one record ("socket") whose layout is agreed
//! out-of-band per socket id.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  Application handlers (RecordHandler)   |
//! +-----------------------------------------+
//!           ^                    v
//! +-----------------------------------------+
//! |  Endpoint (poll / send_record / stats)  |
//! +-----------------------------------------+
//!           ^                    v
//! +-----------------------------------------+
//! |  Registry (32 slots, fan-out dispatch)  |
//! +-----------------------------------------+
//!           ^                    v
//! +-----------------------------------------+
//! |  Record codec / Header / Frame checks   |
//! +-----------------------------------------+
//!           ^                    v
//! +-----------------------------------------+
//! |  Wire codec (LE accessors, checksum)    |
//! +-----------------------------------------+
//!           ^                    v
//! +-----------------------------------------+
//! |  Transport (UDP broadcast / in-memory)  |
//! +-----------------------------------------+
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use abus::{AbusConfig, Endpoint, Record, Shape};
//!
//! # fn main() -> abus::Result<()> {
//! let mut endpoint = Endpoint::bind(AbusConfig::default().with_nad(8266))?;
//! endpoint.subscribe(Shape::new(5, 1, 0, 0, 0), |record: Record| {
//!     println!("socket 5 from {}: {:?}", record.sender, record.bits);
//! })?;
//!
//! let mut record = Record::new(5);
//! record.append_bit(true);
//! endpoint.send_record(&record)?;
//!
//! loop {
//!     while endpoint.poll()? {}
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Positional record encode/decode
pub mod codec;

/// Endpoint configuration
pub mod config;

/// Abus endpoint: receive loop and send path
pub mod endpoint;

/// Error types for Abus
pub mod error;

/// Frame layout and validation
pub mod frame;

/// Frame header
pub mod header;

/// Shapes and records
pub mod record;

/// Subscription table and dispatch
pub mod registry;

/// Endpoint counters
pub mod stats;

/// Datagram drivers
pub mod transport;

/// Little-endian accessors and checksum
pub mod wire;

// Re-exports for convenience
pub use crate::codec::{decode_record, encode_frame, encode_record};
pub use crate::config::{AbusConfig, ConfigError};
pub use crate::endpoint::Endpoint;
pub use crate::error::{AbusError, FrameError, Result};
pub use crate::frame::{check_frame, is_valid_frame};
pub use crate::header::Header;
pub use crate::record::{Record, Shape};
pub use crate::registry::{Handle, RecordHandler, Registry};
pub use crate::stats::{DispatchReport, EndpointStats};
pub use crate::transport::{AbusTransport, MemoryTransport, UdpTransport};
pub use crate::wire::calc_crc;

/// Largest frame sent or accepted (one datagram)
pub const MAX_FRAME_LEN: usize = 255;

/// Capacity of the subscription table
pub const MAX_SUBSCRIPTIONS: usize = 32;

/// UDP port used by Abus peers
pub const DEFAULT_PORT: u16 = 8442;

/// Version of the Abus crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
