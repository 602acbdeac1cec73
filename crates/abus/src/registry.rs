// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch registry
//!
//! Fixed table of [`MAX_SUBSCRIPTIONS`] slots, each holding a shape and the
//! handler that receives records decoded with it. Handles are `slot + 1` and
//! the first free slot is always taken, so a released handle is handed out
//! again by the next registration.
//!
//! A socket frame is offered to every slot whose socket id equals the frame
//! type, in ascending slot order. Slots whose shape does not fit the frame
//! length are skipped.

use core::fmt;

use log::debug;

use crate::codec::decode_record;
use crate::error::{AbusError, FrameError, Result};
use crate::frame::check_frame;
use crate::header::Header;
use crate::record::{Record, Shape};
use crate::stats::DispatchReport;
use crate::MAX_SUBSCRIPTIONS;

/// Receiver of decoded records.
///
/// Implemented for any `FnMut(Record) + Send` closure.
pub trait RecordHandler: Send {
    /// Called once per valid record decoded for this subscription
    fn on_record(&mut self, record: Record);
}

impl<F> RecordHandler for F
where
    F: FnMut(Record) + Send,
{
    fn on_record(&mut self, record: Record) {
        self(record)
    }
}

/// Subscription handle, `1..=MAX_SUBSCRIPTIONS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u8);

impl Handle {
    /// Wrap a raw handle value; `None` for 0 or values past the table
    pub fn new(raw: u8) -> Option<Self> {
        (1..=MAX_SUBSCRIPTIONS)
            .contains(&usize::from(raw))
            .then_some(Self(raw))
    }

    /// Raw handle value
    pub const fn get(self) -> u8 {
        self.0
    }

    fn slot(self) -> usize {
        usize::from(self.0) - 1
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscription {
    shape: Shape,
    handler: Box<dyn RecordHandler>,
}

/// Subscription table
pub struct Registry {
    slots: Vec<Option<Subscription>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_SUBSCRIPTIONS);
        slots.resize_with(MAX_SUBSCRIPTIONS, || None);
        Self { slots }
    }

    /// Add a subscription in the first free slot.
    ///
    /// # Errors
    ///
    /// [`AbusError::RegistryFull`] when all slots are taken.
    pub fn register<H>(&mut self, shape: Shape, handler: H) -> Result<Handle>
    where
        H: RecordHandler + 'static,
    {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(AbusError::RegistryFull)?;

        self.slots[slot] = Some(Subscription {
            shape,
            handler: Box::new(handler),
        });
        let handle = Handle((slot + 1) as u8);
        debug!(
            "[abus] subscribed {} to socket {} ({}b {}i {}l {}r)",
            handle,
            shape.socket_id,
            shape.bit_count,
            shape.int_count,
            shape.long_count,
            shape.real_count
        );
        Ok(handle)
    }

    /// Remove a subscription. Returns `false` if the handle was not active.
    pub fn unregister(&mut self, handle: Handle) -> bool {
        match self.slots.get_mut(handle.slot()).and_then(Option::take) {
            Some(sub) => {
                debug!(
                    "[abus] unsubscribed {} from socket {}",
                    handle, sub.shape.socket_id
                );
                true
            }
            None => false,
        }
    }

    /// Shape registered under `handle`
    pub fn shape(&self, handle: Handle) -> Option<Shape> {
        self.slots
            .get(handle.slot())
            .and_then(Option::as_ref)
            .map(|sub| sub.shape)
    }

    /// Number of active subscriptions
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no subscription is active
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Offer a socket frame to every matching subscription.
    ///
    /// `frame` must already have passed validation and `header` must be its
    /// decoded header. Non-socket headers match nothing.
    pub fn dispatch(&mut self, frame: &[u8], header: &Header) -> DispatchReport {
        let mut report = DispatchReport::default();
        if !header.is_socket() {
            return report;
        }

        for (slot, sub) in self.slots.iter_mut().enumerate() {
            let Some(sub) = sub else { continue };
            if sub.shape.socket_id != header.type_id {
                continue;
            }
            report.matched += 1;

            let record = decode_record(frame, header, &sub.shape);
            if !record.valid {
                debug!(
                    "[abus] socket {} from {}: length {} does not fit shape of #{} (expects {})",
                    header.type_id,
                    header.from,
                    header.length,
                    slot + 1,
                    sub.shape.payload_len()
                );
                report.mismatched += 1;
                continue;
            }

            debug!(
                "[abus] socket {} from {} -> #{}",
                header.type_id,
                header.from,
                slot + 1
            );
            sub.handler.on_record(record);
            report.delivered += 1;
        }
        report
    }

    /// Validate a raw frame, decode its header and dispatch it.
    pub fn dispatch_frame(
        &mut self,
        frame: &[u8],
    ) -> core::result::Result<DispatchReport, FrameError> {
        check_frame(frame)?;
        let header = Header::decode(frame);
        Ok(self.dispatch(frame, &header))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shapes: Vec<(usize, Shape)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, sub)| sub.as_ref().map(|sub| (slot + 1, sub.shape)))
            .collect();
        f.debug_struct("Registry").field("active", &shapes).finish()
    }
}
