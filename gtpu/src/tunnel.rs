//! tunnel - one bearer's tunnel: TX half plus a worker task owning the RX half
//!
//! Every tunnel is processed on its own task.  The demux (or any caller)
//! posts `TunnelEvent`s into the tunnel's channel; the worker feeds them to
//! the RX entity in order, so the RX state needs no locking.  Reordering
//! timeouts are sleep tasks that post back into the same channel, which is
//! what lets an expiry racing teardown be ignored safely.

use crate::capture::PacketCapture;
use crate::config::{NguTunnelConfig, NruTunnelConfig, TunnelVariant};
use crate::demux::TunnelEvent;
use crate::reordering::TimerRequest;
use crate::rx::{ControlRx, GtpuTunnelRx, RxCounters, SduNotifier};
use crate::tx::{GtpuTunnelTx, TransportTx, TxSdu};
use crate::{GtpTeid, GtpuError};
use async_channel::{Receiver, Sender};
use async_std::prelude::*;
use async_std::task::{self, JoinHandle};
use slog::{o, Logger};
use std::sync::Arc;
use std::time::Duration;
use stop_token::prelude::*;
use stop_token::{StopSource, StopToken};

/// The collaborators a tunnel is wired to at creation.
pub struct TunnelHooks {
    pub transport: Arc<dyn TransportTx>,
    pub notifier: Arc<dyn SduNotifier>,
    pub control: Arc<dyn ControlRx>,
    pub capture: Arc<dyn PacketCapture>,
}

pub struct GtpuTunnel {
    local_teid: GtpTeid,
    tx: GtpuTunnelTx,
    events: Sender<TunnelEvent>,
    counters: Arc<RxCounters>,
    // Dropping the source cancels the worker and any sleeping timer task.
    stop_source: StopSource,
    worker: JoinHandle<()>,
}

impl GtpuTunnel {
    pub fn new_ngu(cfg: NguTunnelConfig, hooks: TunnelHooks, logger: &Logger) -> Self {
        Self::spawn(
            TunnelVariant::NgU,
            cfg.rx.local_teid.clone(),
            Some(cfg.rx.t_reordering),
            cfg.tx,
            hooks,
            logger,
        )
    }

    pub fn new_nru(cfg: NruTunnelConfig, hooks: TunnelHooks, logger: &Logger) -> Self {
        Self::spawn(
            TunnelVariant::NrU,
            cfg.rx.local_teid.clone(),
            None,
            cfg.tx,
            hooks,
            logger,
        )
    }

    fn spawn(
        variant: TunnelVariant,
        local_teid: GtpTeid,
        t_reordering: Option<Duration>,
        tx_cfg: crate::config::TunnelTxConfig,
        hooks: TunnelHooks,
        logger: &Logger,
    ) -> Self {
        let logger = logger.new(o!("teid" => local_teid.to_string()));
        let tx = GtpuTunnelTx::new(
            variant,
            tx_cfg,
            hooks.transport,
            hooks.capture.clone(),
            logger.clone(),
        );
        let rx = GtpuTunnelRx::new(
            variant,
            local_teid.clone(),
            t_reordering,
            hooks.notifier,
            hooks.control,
            hooks.capture,
            logger.clone(),
        );
        let counters = rx.counters();
        let (events, event_rx) = async_channel::unbounded();
        let stop_source = StopSource::new();
        let worker = task::spawn(tunnel_worker(
            rx,
            event_rx,
            events.clone(),
            stop_source.token(),
        ));
        GtpuTunnel {
            local_teid,
            tx,
            events,
            counters,
            stop_source,
            worker,
        }
    }

    pub fn local_teid(&self) -> &GtpTeid {
        &self.local_teid
    }

    /// Sender to register with the demux.
    pub fn events(&self) -> Sender<TunnelEvent> {
        self.events.clone()
    }

    pub fn rx_counters(&self) -> Arc<RxCounters> {
        self.counters.clone()
    }

    pub fn transmit(&self, sdu: TxSdu) -> Result<(), GtpuError> {
        self.tx.transmit(sdu)
    }

    /// Tear the tunnel down: cancels the worker and the outstanding
    /// reordering timer, discarding buffered entries without delivering
    /// them.  Deregister the TEID first.
    pub async fn shutdown(self) {
        drop(self.stop_source);
        self.worker.await;
    }
}

async fn tunnel_worker(
    mut rx: GtpuTunnelRx,
    events: Receiver<TunnelEvent>,
    loopback: Sender<TunnelEvent>,
    stop_token: StopToken,
) {
    // The receiver is !Unpin once wrapped by timeout_at, so pin it on the
    // stack before polling.
    let mut events = std::pin::pin!(events.timeout_at(stop_token.clone()));
    while let Some(Ok(event)) = events.next().await {
        let timer = match event {
            TunnelEvent::Pdu(datagram) => rx.handle_pdu(&datagram),
            TunnelEvent::ReorderingExpired(token) => rx.handle_reordering_expiry(token),
        };
        if let Some(request) = timer {
            start_reordering_timer(request, loopback.clone(), stop_token.clone());
        }
    }
}

fn start_reordering_timer(
    request: TimerRequest,
    events: Sender<TunnelEvent>,
    stop_token: StopToken,
) {
    task::spawn(async move {
        if task::sleep(request.delay)
            .timeout_at(stop_token)
            .await
            .is_ok()
        {
            let _ = events
                .send(TunnelEvent::ReorderingExpired(request.token))
                .await;
        }
    });
}
