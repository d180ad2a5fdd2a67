//! tx - builds and sends outbound GTP-U PDUs for one bearer

use crate::capture::PacketCapture;
use crate::config::{TunnelTxConfig, TunnelVariant};
use crate::ext::{self, DeliveryStatus, NrRanContainer, PduSessionInfo};
use crate::pdu::{
    self, ExtensionHeader, GtpuPdu, GTPU_EXT_NR_RAN_CONTAINER, GTPU_EXT_PDU_SESSION_CONTAINER,
    GTPU_MSG_DATA_PDU,
};
use crate::GtpuError;
use slog::{debug, info, warn, Logger};
use std::net::SocketAddr;
use std::sync::Arc;

/// Network sender collaborator.  Fire and forget; implementations queue or
/// drop under load rather than block the caller.
pub trait TransportTx: Send + Sync {
    fn send_pdu(&self, pdu: &[u8], dest: SocketAddr);
}

/// One outbound SDU plus the control fields the upper layer may attach.
#[derive(Clone, Debug, Default)]
pub struct TxSdu {
    /// The T-PDU.  May be absent on NR-U, where a status-only PDU is legal.
    pub t_pdu: Option<Vec<u8>>,
    /// Caller-assigned GTP-U sequence number (NG-U).
    pub sequence_number: Option<u16>,
    /// Delivery status feedback (mandatory on NR-U).
    pub delivery_status: Option<DeliveryStatus>,
    /// QoS flow marking (NG-U).
    pub pdu_session: Option<PduSessionInfo>,
}

/// Transmit half of a tunnel.  Stateless apart from configuration: a failed
/// SDU is dropped and reported, never retried here.
pub struct GtpuTunnelTx {
    variant: TunnelVariant,
    cfg: TunnelTxConfig,
    peer_sockaddr: SocketAddr,
    transport: Arc<dyn TransportTx>,
    capture: Arc<dyn PacketCapture>,
    logger: Logger,
}

impl GtpuTunnelTx {
    pub fn new(
        variant: TunnelVariant,
        cfg: TunnelTxConfig,
        transport: Arc<dyn TransportTx>,
        capture: Arc<dyn PacketCapture>,
        logger: Logger,
    ) -> Self {
        let peer_sockaddr = cfg.peer_sockaddr();
        info!(logger, "GTPU {} Tx configured. {}", variant, cfg);
        GtpuTunnelTx {
            variant,
            cfg,
            peer_sockaddr,
            transport,
            capture,
            logger,
        }
    }

    pub fn transmit(&self, sdu: TxSdu) -> Result<(), GtpuError> {
        let mut extensions = Vec::new();
        match self.variant {
            TunnelVariant::NrU => {
                let Some(status) = sdu.delivery_status else {
                    warn!(
                        self.logger,
                        "Dropped SDU, missing delivery status. teid={}", self.cfg.peer_teid
                    );
                    return Err(GtpuError::MissingRequiredField("delivery status"));
                };
                let container = ext::pack_nr_ran_container(&NrRanContainer::DeliveryStatus(
                    status,
                ))
                .inspect_err(|e| {
                    warn!(
                        self.logger,
                        "Dropped SDU, error writing NR RAN container. teid={} {e}",
                        self.cfg.peer_teid
                    );
                })?;
                extensions.push(ExtensionHeader {
                    ext_type: GTPU_EXT_NR_RAN_CONTAINER,
                    container,
                });
            }
            TunnelVariant::NgU => {
                if let Some(info) = &sdu.pdu_session {
                    let container = ext::pack_pdu_session_info(info).inspect_err(|e| {
                        warn!(
                            self.logger,
                            "Dropped SDU, error writing PDU session container. teid={} {e}",
                            self.cfg.peer_teid
                        );
                    })?;
                    extensions.push(ExtensionHeader {
                        ext_type: GTPU_EXT_PDU_SESSION_CONTAINER,
                        container,
                    });
                }
            }
        }

        let pdu = GtpuPdu {
            message_type: GTPU_MSG_DATA_PDU,
            teid: self.cfg.peer_teid.clone(),
            sequence_number: sdu.sequence_number,
            n_pdu_number: None,
            extensions,
            payload: sdu.t_pdu.unwrap_or_default(),
        };
        let buf = pdu::encode(&pdu);
        debug!(
            self.logger,
            "TX PDU. pdu_len={} teid={}",
            buf.len(),
            self.cfg.peer_teid
        );
        self.transport.send_pdu(&buf, self.peer_sockaddr);
        self.capture.capture(&buf);
        Ok(())
    }
}
