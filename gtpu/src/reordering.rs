//! reordering - bounded-delay in-order delivery for the NG-U receive path
//!
//! The engine is synchronous and owns no timer of its own.  When it needs a
//! timeout it hands back a `TimerRequest` carrying an opaque token; the owner
//! schedules it however it likes and calls `handle_expiry` with the token
//! when it fires.  Tokens increase monotonically, so an expiry that arrives
//! after the engine has moved on (or after teardown began) is ignored.

use crate::GtpuError;
use std::collections::BTreeMap;
use std::time::Duration;

/// Half of the 16-bit sequence number space.  An arrival within this distance
/// ahead of the expected SN is "early"; anything else is late or duplicate.
const REORDER_WINDOW: u16 = 0x8000;

/// Hard cap on buffered entries.  A peer that opens gaps faster than the
/// timer closes them forces delivery instead of growing the buffer.
const MAX_BUFFERED: usize = 4096;

/// Ask the owner to fire `ReorderingExpired(token)` after `delay`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerRequest {
    pub token: u64,
    pub delay: Duration,
}

pub struct ReorderingEngine<T> {
    t_reordering: Duration,
    /// Next SN owed to the upper layer.  Latched from the first arrival.
    next_sn: Option<u16>,
    buffer: BTreeMap<u16, T>,
    /// Token of the running timer, if one is armed.
    armed: Option<u64>,
    next_token: u64,
}

impl<T> ReorderingEngine<T> {
    pub fn new(t_reordering: Duration) -> Self {
        ReorderingEngine {
            t_reordering,
            next_sn: None,
            buffer: BTreeMap::new(),
            armed: None,
            next_token: 0,
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Absorb the arrival of `sdu` with sequence number `sn`.  Everything now
    /// deliverable in order is appended to `delivered`.  Returns a timer
    /// request when a timer must be armed, or `DuplicateOrLateSequence` when
    /// the SDU must be discarded.
    pub fn submit(
        &mut self,
        sn: u16,
        sdu: T,
        delivered: &mut Vec<T>,
    ) -> Result<Option<TimerRequest>, GtpuError> {
        let expected = *self.next_sn.get_or_insert(sn);
        let distance = sn.wrapping_sub(expected);
        if distance == 0 {
            delivered.push(sdu);
            self.advance_from(expected.wrapping_add(1), delivered);
            if self.buffer.is_empty() {
                self.armed = None;
            }
            return Ok(None);
        }
        if distance >= REORDER_WINDOW || self.buffer.contains_key(&sn) {
            return Err(GtpuError::DuplicateOrLateSequence(sn));
        }
        self.buffer.insert(sn, sdu);
        if self.buffer.len() > MAX_BUFFERED {
            self.skip_gap(delivered);
        }
        if self.armed.is_none() {
            Ok(Some(self.arm()))
        } else {
            Ok(None)
        }
    }

    /// Timer fired.  Stale tokens are ignored, which also covers a callback
    /// racing tunnel teardown.  Gives up waiting for the current gap, and
    /// re-arms only while entries remain buffered.
    pub fn handle_expiry(&mut self, token: u64, delivered: &mut Vec<T>) -> Option<TimerRequest> {
        if self.armed != Some(token) {
            return None;
        }
        self.armed = None;
        self.skip_gap(delivered);
        (!self.buffer.is_empty()).then(|| self.arm())
    }

    fn arm(&mut self) -> TimerRequest {
        self.next_token += 1;
        self.armed = Some(self.next_token);
        TimerRequest {
            token: self.next_token,
            delay: self.t_reordering,
        }
    }

    /// Advance the expected SN to the closest buffered one and deliver the
    /// contiguous run from there.
    fn skip_gap(&mut self, delivered: &mut Vec<T>) {
        let Some(expected) = self.next_sn else {
            return;
        };
        let Some(lowest) = self
            .buffer
            .keys()
            .copied()
            .min_by_key(|sn| sn.wrapping_sub(expected))
        else {
            return;
        };
        self.advance_from(lowest, delivered);
    }

    fn advance_from(&mut self, start: u16, delivered: &mut Vec<T>) {
        let mut sn = start;
        while let Some(sdu) = self.buffer.remove(&sn) {
            delivered.push(sdu);
            sn = sn.wrapping_add(1);
        }
        self.next_sn = Some(sn);
    }
}
