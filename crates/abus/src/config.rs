// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint configuration.
//!
//! Supports both programmatic and TOML file configuration.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use thiserror::Error;

use crate::record::Shape;
use crate::{DEFAULT_PORT, MAX_FRAME_LEN, MAX_SUBSCRIPTIONS};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for [`AbusConfig`].
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration parsed but failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Abus endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbusConfig {
    /// UDP port to listen on and send to (0 = OS assigned listen port).
    pub local_port: u16,

    /// Destination address of every outbound frame.
    pub broadcast_addr: Ipv4Addr,

    /// NAD used as sender for records that carry none (0 = unset).
    pub own_nad: u32,

    /// Re-initialise the transport after a malformed frame.
    pub reset_on_malformed: bool,

    /// Socket layouts agreed with the peers.
    pub sockets: Vec<Shape>,
}

impl Default for AbusConfig {
    fn default() -> Self {
        Self {
            local_port: DEFAULT_PORT,
            broadcast_addr: Ipv4Addr::BROADCAST,
            own_nad: 0,
            reset_on_malformed: true,
            sockets: Vec::new(),
        }
    }
}

impl AbusConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the UDP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }

    /// Set the destination address.
    pub fn with_broadcast(mut self, addr: Ipv4Addr) -> Self {
        self.broadcast_addr = addr;
        self
    }

    /// Set the default sender NAD.
    pub fn with_nad(mut self, nad: u32) -> Self {
        self.own_nad = nad;
        self
    }

    /// Where outbound frames go: peers listen on the same port.
    pub fn destination(&self) -> SocketAddr {
        SocketAddrV4::new(self.broadcast_addr, self.local_port).into()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sockets.len() > MAX_SUBSCRIPTIONS {
            return Err(ConfigError::Invalid(format!(
                "{} sockets declared, at most {} supported",
                self.sockets.len(),
                MAX_SUBSCRIPTIONS
            )));
        }

        for (i, shape) in self.sockets.iter().enumerate() {
            if shape.socket_id == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Socket {} has socket_id 0",
                    i
                )));
            }
            if shape.field_count() == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Socket {} (id {}) declares no fields",
                    i, shape.socket_id
                )));
            }
            if shape.frame_len() > MAX_FRAME_LEN {
                return Err(ConfigError::Invalid(format!(
                    "Socket {} (id {}) needs {} byte frames, maximum is {}",
                    i,
                    shape.socket_id,
                    shape.frame_len(),
                    MAX_FRAME_LEN
                )));
            }
        }

        Ok(())
    }
}
