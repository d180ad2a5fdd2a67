//! framework - shared setup for the tunnel integration tests

use crate::{MockControl, MockNotifier, MockTransport, RecordingCapture};
use gtpu::{
    GtpTeid, GtpuTunnel, NguRxConfig, NguTunnelConfig, NruRxConfig, NruTunnelConfig,
    TunnelHooks, TunnelTxConfig, GTPU_PORT,
};
use slog::{o, Drain, Logger};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

pub fn init_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

pub struct TestTunnel {
    pub tunnel: GtpuTunnel,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<MockNotifier>,
    pub control: Arc<MockControl>,
    pub capture: Arc<RecordingCapture>,
}

fn hooks() -> (
    TunnelHooks,
    Arc<MockTransport>,
    Arc<MockNotifier>,
    Arc<MockControl>,
    Arc<RecordingCapture>,
) {
    let transport = Arc::new(MockTransport::new());
    let notifier = Arc::new(MockNotifier::new());
    let control = Arc::new(MockControl::new());
    let capture = Arc::new(RecordingCapture::new());
    (
        TunnelHooks {
            transport: transport.clone(),
            notifier: notifier.clone(),
            control: control.clone(),
            capture: capture.clone(),
        },
        transport,
        notifier,
        control,
        capture,
    )
}

fn tx_config(peer_teid: u32) -> TunnelTxConfig {
    TunnelTxConfig {
        peer_teid: GtpTeid::from(peer_teid),
        peer_addr: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)),
        peer_port: GTPU_PORT,
    }
}

pub fn ngu_tunnel(
    local_teid: u32,
    peer_teid: u32,
    t_reordering: Duration,
    logger: &Logger,
) -> TestTunnel {
    let (hooks, transport, notifier, control, capture) = hooks();
    let tunnel = GtpuTunnel::new_ngu(
        NguTunnelConfig {
            rx: NguRxConfig {
                local_teid: GtpTeid::from(local_teid),
                t_reordering,
            },
            tx: tx_config(peer_teid),
        },
        hooks,
        logger,
    );
    TestTunnel {
        tunnel,
        transport,
        notifier,
        control,
        capture,
    }
}

pub fn nru_tunnel(local_teid: u32, peer_teid: u32, logger: &Logger) -> TestTunnel {
    let (hooks, transport, notifier, control, capture) = hooks();
    let tunnel = GtpuTunnel::new_nru(
        NruTunnelConfig {
            rx: NruRxConfig {
                local_teid: GtpTeid::from(local_teid),
            },
            tx: tx_config(peer_teid),
        },
        hooks,
        logger,
    );
    TestTunnel {
        tunnel,
        transport,
        notifier,
        control,
        capture,
    }
}

/// Build an NG-U data PDU as the peer would send it.
pub fn peer_data_pdu(teid: u32, sn: Option<u16>, payload: &[u8]) -> Vec<u8> {
    gtpu::encode(&gtpu::GtpuPdu {
        message_type: gtpu::GTPU_MSG_DATA_PDU,
        teid: GtpTeid::from(teid),
        sequence_number: sn,
        n_pdu_number: None,
        extensions: Vec::new(),
        payload: payload.to_vec(),
    })
}
