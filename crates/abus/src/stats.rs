// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Endpoint counters.

use std::fmt;

/// Outcome of dispatching one socket frame through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Subscriptions whose socket id matched the frame
    pub matched: usize,
    /// Handlers invoked with a valid record
    pub delivered: usize,
    /// Matching subscriptions skipped because the shape did not fit
    pub mismatched: usize,
}

/// Running counters of an [`crate::Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndpointStats {
    /// Datagrams handed to the receive path
    pub frames_received: u64,
    /// Datagrams rejected by the frame validator
    pub frames_malformed: u64,
    /// Valid frames that are not socket records
    pub frames_non_socket: u64,
    /// Socket frames with no subscription for their id
    pub frames_unmatched: u64,
    /// Handler invocations
    pub records_dispatched: u64,
    /// Subscriptions skipped on a length/shape mismatch
    pub shape_mismatches: u64,
    /// Frames handed to the transport successfully
    pub frames_sent: u64,
    /// Transport send failures
    pub send_failures: u64,
    /// Transport re-initialisations after malformed input
    pub transport_resets: u64,
}

impl EndpointStats {
    /// Fold a dispatch outcome into the counters
    pub fn record_dispatch(&mut self, report: &DispatchReport) {
        if report.matched == 0 {
            self.frames_unmatched += 1;
        }
        self.records_dispatched += report.delivered as u64;
        self.shape_mismatches += report.mismatched as u64;
    }
}

impl fmt::Display for EndpointStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rx={} malformed={} non_socket={} unmatched={} dispatched={} mismatches={} tx={} tx_fail={} resets={}",
            self.frames_received,
            self.frames_malformed,
            self.frames_non_socket,
            self.frames_unmatched,
            self.records_dispatched,
            self.shape_mismatches,
            self.frames_sent,
            self.send_failures,
            self.transport_resets,
        )
    }
}
