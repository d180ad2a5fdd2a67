//! gtpu - GTP-U tunnel engine for NG-U and NR-U user-plane bearers
//!
//! Encapsulates and decapsulates T-PDUs per TS29.281, interprets the NR RAN
//! and PDU Session extension containers, reorders the NG-U receive path with
//! a bounded wait, and demultiplexes inbound datagrams to tunnels by TEID.
//! Socket I/O, timers above the token protocol, and everything upward of the
//! SDU boundary belong to the collaborators passed in at tunnel creation.

mod capture;
mod config;
mod demux;
mod error;
mod ext;
mod pdu;
mod reordering;
mod rx;
mod teid;
mod tunnel;
mod tx;

pub use capture::{NoCapture, PacketCapture};
pub use config::{
    GTPU_PORT, NguRxConfig, NguTunnelConfig, NruRxConfig, NruTunnelConfig, TunnelTxConfig,
    TunnelVariant,
};
pub use demux::{GtpuDemux, TunnelEvent};
pub use error::GtpuError;
pub use ext::{
    DecodedExtension, DeliveryStatus, NrRanContainer, NrUserData, PduSessionInfo,
    decode_extension, pack_nr_ran_container, pack_pdu_session_info, unpack_nr_ran_container,
    unpack_pdu_session_info,
};
pub use pdu::{
    ExtensionHeader, GTPU_BASE_HEADER_LEN, GTPU_EXT_LONG_PDCP_PDU_NUMBER, GTPU_EXT_NO_MORE,
    GTPU_EXT_NR_RAN_CONTAINER, GTPU_EXT_PDCP_PDU_NUMBER, GTPU_EXT_PDU_SESSION_CONTAINER,
    GTPU_EXT_UDP_PORT, GTPU_MSG_DATA_PDU, GTPU_MSG_ECHO_REQUEST, GTPU_MSG_ECHO_RESPONSE,
    GTPU_MSG_END_MARKER, GTPU_MSG_ERROR_INDICATION,
    GTPU_MSG_SUPPORTED_EXTENSION_HEADERS_NOTIFICATION, GtpuPdu, decode, encode,
};
pub use reordering::{ReorderingEngine, TimerRequest};
pub use rx::{ControlRx, GtpuTunnelRx, RxCounters, SduNotifier};
pub use teid::GtpTeid;
pub use tunnel::{GtpuTunnel, TunnelHooks};
pub use tx::{GtpuTunnelTx, TransportTx, TxSdu};
