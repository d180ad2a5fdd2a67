use gtpu::{GtpuDemux, GtpuError};
use gtpu_tests::framework::*;
use std::time::Duration;

#[async_std::test]
async fn datagrams_are_routed_by_teid() -> anyhow::Result<()> {
    let logger = init_logging();
    let demux = GtpuDemux::new(logger.clone());
    let t1 = ngu_tunnel(1, 101, Duration::from_secs(1), &logger);
    let t2 = ngu_tunnel(2, 102, Duration::from_secs(1), &logger);
    demux.register(t1.tunnel.local_teid(), t1.tunnel.events());
    demux.register(t2.tunnel.local_teid(), t2.tunnel.events());

    demux.handle_datagram(peer_data_pdu(2, Some(0), b"two")).await?;
    demux.handle_datagram(peer_data_pdu(1, Some(0), b"one")).await?;

    let (sdu, _) = t1.notifier.recv_sdu().await?;
    assert_eq!(sdu, b"one");
    let (sdu, _) = t2.notifier.recv_sdu().await?;
    assert_eq!(sdu, b"two");
    t1.tunnel.shutdown().await;
    t2.tunnel.shutdown().await;
    Ok(())
}

#[async_std::test]
async fn unknown_teid_is_dropped_without_disturbing_other_tunnels() -> anyhow::Result<()> {
    let logger = init_logging();
    let demux = GtpuDemux::new(logger.clone());
    let t = ngu_tunnel(1, 101, Duration::from_secs(1), &logger);
    demux.register(t.tunnel.local_teid(), t.tunnel.events());

    let stray = demux.handle_datagram(peer_data_pdu(9, Some(0), b"stray")).await;
    assert!(matches!(stray, Err(GtpuError::UnknownTeid(_))));
    demux.handle_datagram(peer_data_pdu(1, Some(0), b"mine")).await?;

    let (sdu, _) = t.notifier.recv_sdu().await?;
    assert_eq!(sdu, b"mine");
    assert_eq!(demux.unknown_teid_drops(), 1);
    t.tunnel.shutdown().await;
    Ok(())
}

#[async_std::test]
async fn deregistered_teid_no_longer_receives() -> anyhow::Result<()> {
    let logger = init_logging();
    let demux = GtpuDemux::new(logger.clone());
    let t = ngu_tunnel(1, 101, Duration::from_secs(1), &logger);
    demux.register(t.tunnel.local_teid(), t.tunnel.events());
    demux.deregister(t.tunnel.local_teid());

    let late = demux.handle_datagram(peer_data_pdu(1, Some(0), b"late")).await;
    assert!(matches!(late, Err(GtpuError::UnknownTeid(_))));

    assert_eq!(demux.unknown_teid_drops(), 1);
    t.notifier.expect_silence(Duration::from_millis(50)).await?;
    t.tunnel.shutdown().await;
    Ok(())
}
