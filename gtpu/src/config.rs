//! config - immutable per-tunnel configuration

use crate::GtpTeid;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Port specified for encapsulated T-PDUs - TS29.281, 4.4.2.3
pub const GTPU_PORT: u16 = 2152;

/// The two GTP-U tunnelling flavours: NG-U between the UPF and the CU-UP,
/// NR-U between the CU-UP and the DU (F1-U reference point).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TunnelVariant {
    NgU,
    NrU,
}

impl std::fmt::Display for TunnelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TunnelVariant::NgU => write!(f, "NG-U"),
            TunnelVariant::NrU => write!(f, "NR-U"),
        }
    }
}

/// Transmit side of a tunnel - the peer's endpoint.
#[derive(Clone, Debug)]
pub struct TunnelTxConfig {
    pub peer_teid: GtpTeid,
    pub peer_addr: IpAddr,
    pub peer_port: u16,
}

impl TunnelTxConfig {
    pub fn peer_sockaddr(&self) -> SocketAddr {
        SocketAddr::new(self.peer_addr, self.peer_port)
    }
}

impl std::fmt::Display for TunnelTxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "peer_teid={} peer_addr={} peer_port={}",
            self.peer_teid, self.peer_addr, self.peer_port
        )
    }
}

/// NG-U tunnel parameters.  Only the NG-U receive path reorders, hence
/// t_reordering lives here and not on NR-U.
#[derive(Clone, Debug)]
pub struct NguTunnelConfig {
    pub rx: NguRxConfig,
    pub tx: TunnelTxConfig,
}

#[derive(Clone, Debug)]
pub struct NguRxConfig {
    pub local_teid: GtpTeid,
    pub t_reordering: Duration,
}

impl std::fmt::Display for NguTunnelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "local_teid={} t_reordering={:?} {}",
            self.rx.local_teid, self.rx.t_reordering, self.tx
        )
    }
}

/// NR-U tunnel parameters.
#[derive(Clone, Debug)]
pub struct NruTunnelConfig {
    pub rx: NruRxConfig,
    pub tx: TunnelTxConfig,
}

#[derive(Clone, Debug)]
pub struct NruRxConfig {
    pub local_teid: GtpTeid,
}

impl std::fmt::Display for NruTunnelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "local_teid={} {}", self.rx.local_teid, self.tx)
    }
}
