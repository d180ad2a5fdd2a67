//! rx - decodes, validates and delivers inbound GTP-U PDUs for one bearer

use crate::capture::PacketCapture;
use crate::config::TunnelVariant;
use crate::ext::{self, DecodedExtension, DeliveryStatus, NrRanContainer};
use crate::pdu::{self, GTPU_MSG_DATA_PDU};
use crate::reordering::{ReorderingEngine, TimerRequest};
use crate::GtpTeid;
use atomic_counter::{AtomicCounter, RelaxedCounter};
use slog::{debug, Logger};
use std::sync::Arc;
use std::time::Duration;

/// Upper-layer SDU notifier collaborator.
pub trait SduNotifier: Send + Sync {
    fn on_sdu(&self, sdu: Vec<u8>, delivery_status: Option<DeliveryStatus>);
}

/// Out-of-band handler for non-data message types (echo, error indication,
/// end marker).  Responding to them is control-plane business, not ours.
pub trait ControlRx: Send + Sync {
    fn on_control_pdu(&self, message_type: u8, pdu: Vec<u8>);
}

pub struct RxCounters {
    pub rx_pdus: RelaxedCounter,
    pub rx_bytes: RelaxedCounter,
    pub delivered_sdus: RelaxedCounter,
    pub control_pdus: RelaxedCounter,
    pub dropped_malformed: RelaxedCounter,
    pub dropped_malformed_ext: RelaxedCounter,
    pub dropped_late_sn: RelaxedCounter,
}

impl RxCounters {
    fn new() -> Self {
        RxCounters {
            rx_pdus: RelaxedCounter::new(0),
            rx_bytes: RelaxedCounter::new(0),
            delivered_sdus: RelaxedCounter::new(0),
            control_pdus: RelaxedCounter::new(0),
            dropped_malformed: RelaxedCounter::new(0),
            dropped_malformed_ext: RelaxedCounter::new(0),
            dropped_late_sn: RelaxedCounter::new(0),
        }
    }
}

/// Receive half of a tunnel.  Single-context: the owner feeds `handle_pdu`
/// and `handle_reordering_expiry` from one execution context, so no locking
/// happens here.  Dropping the entity discards anything still buffered.
pub struct GtpuTunnelRx {
    variant: TunnelVariant,
    local_teid: GtpTeid,
    reordering: Option<ReorderingEngine<Vec<u8>>>,
    notifier: Arc<dyn SduNotifier>,
    control: Arc<dyn ControlRx>,
    capture: Arc<dyn PacketCapture>,
    counters: Arc<RxCounters>,
    logger: Logger,
}

impl GtpuTunnelRx {
    pub fn new(
        variant: TunnelVariant,
        local_teid: GtpTeid,
        t_reordering: Option<Duration>,
        notifier: Arc<dyn SduNotifier>,
        control: Arc<dyn ControlRx>,
        capture: Arc<dyn PacketCapture>,
        logger: Logger,
    ) -> Self {
        GtpuTunnelRx {
            variant,
            local_teid,
            reordering: t_reordering.map(ReorderingEngine::new),
            notifier,
            control,
            capture,
            counters: Arc::new(RxCounters::new()),
            logger,
        }
    }

    pub fn counters(&self) -> Arc<RxCounters> {
        self.counters.clone()
    }

    /// Process one inbound PDU.  Returns a timer request when the reordering
    /// engine needs one armed.
    pub fn handle_pdu(&mut self, buf: &[u8]) -> Option<TimerRequest> {
        self.capture.capture(buf);
        self.counters.rx_pdus.inc();
        self.counters.rx_bytes.add(buf.len());

        let pdu = match pdu::decode(buf) {
            Ok(pdu) => pdu,
            Err(e) => {
                self.counters.dropped_malformed.inc();
                debug!(self.logger, "Dropped PDU. teid={} {e}", self.local_teid);
                return None;
            }
        };

        if pdu.message_type != GTPU_MSG_DATA_PDU {
            self.counters.control_pdus.inc();
            self.control.on_control_pdu(pdu.message_type, buf.to_vec());
            return None;
        }

        let mut delivery_status = None;
        for ext in &pdu.extensions {
            match ext::decode_extension(ext) {
                Ok(DecodedExtension::NrRanContainer(NrRanContainer::DeliveryStatus(ds))) => {
                    delivery_status = Some(ds);
                }
                // DL user data sequencing and QoS flow marking are consumed
                // by the upper layer, not here.
                Ok(DecodedExtension::NrRanContainer(NrRanContainer::UserData(_)))
                | Ok(DecodedExtension::PduSessionInfo(_))
                | Ok(DecodedExtension::Unknown { .. }) => {}
                Err(e) => {
                    self.counters.dropped_malformed_ext.inc();
                    debug!(self.logger, "Dropped SDU. teid={} {e}", self.local_teid);
                    return None;
                }
            }
        }

        match (self.variant, pdu.sequence_number, &mut self.reordering) {
            // NG-U with a sequence number goes through the reordering engine.
            (TunnelVariant::NgU, Some(sn), Some(engine)) => {
                let mut delivered = Vec::new();
                let timer = match engine.submit(sn, pdu.payload, &mut delivered) {
                    Ok(timer) => timer,
                    Err(e) => {
                        self.counters.dropped_late_sn.inc();
                        debug!(self.logger, "Dropped SDU. teid={} {e}", self.local_teid);
                        None
                    }
                };
                for sdu in delivered {
                    self.deliver(sdu, None);
                }
                timer
            }
            // NR-U never reorders at this layer; without a sequence number
            // (or without an engine) NG-U delivers in arrival order too.
            _ => {
                self.deliver(pdu.payload, delivery_status);
                None
            }
        }
    }

    /// Reordering timer fired.  Stale tokens are ignored by the engine.
    pub fn handle_reordering_expiry(&mut self, token: u64) -> Option<TimerRequest> {
        let engine = self.reordering.as_mut()?;
        let mut delivered = Vec::new();
        let timer = engine.handle_expiry(token, &mut delivered);
        if !delivered.is_empty() {
            debug!(
                self.logger,
                "Reordering timeout released {} SDU(s). teid={}",
                delivered.len(),
                self.local_teid
            );
        }
        for sdu in delivered {
            self.deliver(sdu, None);
        }
        timer
    }

    pub fn buffered(&self) -> usize {
        self.reordering.as_ref().map_or(0, ReorderingEngine::buffered)
    }

    fn deliver(&self, sdu: Vec<u8>, delivery_status: Option<DeliveryStatus>) {
        self.counters.delivered_sdus.inc();
        self.notifier.on_sdu(sdu, delivery_status);
    }
}
