//! demux - routes inbound datagrams to the owning tunnel by TEID

use crate::pdu::GTPU_BASE_HEADER_LEN;
use crate::{GtpTeid, GtpuError};
use async_channel::Sender;
use atomic_counter::{AtomicCounter, RelaxedCounter};
use dashmap::DashMap;
use slog::{debug, Logger};

/// Events consumed by a tunnel's worker.
#[derive(Debug)]
pub enum TunnelEvent {
    /// A raw datagram for this tunnel's local TEID.
    Pdu(Vec<u8>),
    /// The reordering timer with this token fired.
    ReorderingExpired(u64),
}

/// Non-owning TEID index over tunnels owned by their bearer contexts.  The
/// network receive path and the bearer-lifecycle path both touch it, hence
/// the concurrent map; everything downstream of the lookup runs on the
/// tunnel's own context.
pub struct GtpuDemux {
    tunnels: DashMap<u32, Sender<TunnelEvent>>,
    unknown_teid_drops: RelaxedCounter,
    malformed_drops: RelaxedCounter,
    logger: Logger,
}

impl GtpuDemux {
    pub fn new(logger: Logger) -> Self {
        GtpuDemux {
            tunnels: DashMap::new(),
            unknown_teid_drops: RelaxedCounter::new(0),
            malformed_drops: RelaxedCounter::new(0),
            logger,
        }
    }

    /// Associate a local TEID with a tunnel.  Two tunnels under one TEID is
    /// a bearer-management bug, not network input, so it panics.
    pub fn register(&self, local_teid: &GtpTeid, events: Sender<TunnelEvent>) {
        let previous = self.tunnels.insert(local_teid.to_u32(), events);
        assert!(
            previous.is_none(),
            "TEID {local_teid} registered twice on this endpoint"
        );
    }

    /// Called on bearer release.  Safe against in-flight lookups: a datagram
    /// racing the removal is either routed to the still-draining tunnel or
    /// dropped as unknown.
    pub fn deregister(&self, local_teid: &GtpTeid) {
        self.tunnels.remove(&local_teid.to_u32());
    }

    pub fn unknown_teid_drops(&self) -> usize {
        self.unknown_teid_drops.get()
    }

    /// Route one inbound datagram.  Only the TEID octets are peeked here;
    /// full validation happens on the tunnel's own context.  A routing
    /// failure is counted and logged before it is returned, so the network
    /// receive path may discard the error.
    pub async fn handle_datagram(&self, datagram: Vec<u8>) -> Result<(), GtpuError> {
        if datagram.len() < GTPU_BASE_HEADER_LEN {
            self.malformed_drops.inc();
            debug!(
                self.logger,
                "Dropped short datagram. len={}",
                datagram.len()
            );
            return Err(GtpuError::MalformedHeader("shorter than fixed header"));
        }
        let teid = GtpTeid([datagram[4], datagram[5], datagram[6], datagram[7]]);
        let Some(events) = self.tunnels.get(&teid.to_u32()).map(|e| e.value().clone()) else {
            self.unknown_teid_drops.inc();
            debug!(self.logger, "Dropped datagram for unknown TEID {teid}");
            return Err(GtpuError::UnknownTeid(teid));
        };
        // A closed channel means the tunnel is tearing down - same as unknown.
        let _ = events.send(TunnelEvent::Pdu(datagram)).await;
        Ok(())
    }
}
