use atomic_counter::AtomicCounter;
use gtpu::{GtpuDemux, TunnelEvent};
use gtpu_tests::framework::*;
use std::time::Duration;

#[async_std::test]
async fn in_order_pdus_pass_straight_through() -> anyhow::Result<()> {
    let logger = init_logging();
    let t = ngu_tunnel(1, 2, Duration::from_secs(1), &logger);

    for sn in [10u16, 11, 12] {
        t.tunnel
            .events()
            .send(TunnelEvent::Pdu(peer_data_pdu(1, Some(sn), &[sn as u8])))
            .await?;
    }

    for sn in [10u16, 11, 12] {
        let (sdu, status) = t.notifier.recv_sdu().await?;
        assert_eq!(sdu, vec![sn as u8]);
        assert!(status.is_none());
    }
    t.tunnel.shutdown().await;
    Ok(())
}

#[async_std::test]
async fn out_of_order_pdus_are_delivered_in_sequence() -> anyhow::Result<()> {
    let logger = init_logging();
    let t = ngu_tunnel(1, 2, Duration::from_secs(1), &logger);

    // 5 latches the expected SN, 7 is held back until 6 fills the gap.
    for sn in [5u16, 7, 6, 8] {
        t.tunnel
            .events()
            .send(TunnelEvent::Pdu(peer_data_pdu(1, Some(sn), &[sn as u8])))
            .await?;
    }

    for sn in [5u16, 6, 7, 8] {
        let (sdu, _) = t.notifier.recv_sdu().await?;
        assert_eq!(sdu, vec![sn as u8]);
    }
    t.tunnel.shutdown().await;
    Ok(())
}

#[async_std::test]
async fn gap_is_skipped_when_the_reordering_timer_fires() -> anyhow::Result<()> {
    let logger = init_logging();
    let t = ngu_tunnel(1, 2, Duration::from_millis(100), &logger);

    // 5 is in order; 8 opens a gap at 6 and arms the timer.
    for sn in [5u16, 8] {
        t.tunnel
            .events()
            .send(TunnelEvent::Pdu(peer_data_pdu(1, Some(sn), &[sn as u8])))
            .await?;
    }
    let (sdu, _) = t.notifier.recv_sdu().await?;
    assert_eq!(sdu, vec![5]);

    // 8 stays buffered until t_reordering expires, then comes out alone.
    t.notifier.expect_silence(Duration::from_millis(30)).await?;
    let (sdu, _) = t.notifier.recv_sdu().await?;
    assert_eq!(sdu, vec![8]);

    // 6 and 7 arrive after the skip and are discarded as late.
    for sn in [6u16, 7] {
        t.tunnel
            .events()
            .send(TunnelEvent::Pdu(peer_data_pdu(1, Some(sn), &[sn as u8])))
            .await?;
    }
    t.notifier.expect_silence(Duration::from_millis(30)).await?;
    assert_eq!(t.tunnel.rx_counters().dropped_late_sn.get(), 2);
    t.tunnel.shutdown().await;
    Ok(())
}

#[async_std::test]
async fn sequence_numbers_wrap_around_the_16_bit_space() -> anyhow::Result<()> {
    let logger = init_logging();
    let t = ngu_tunnel(1, 2, Duration::from_secs(1), &logger);

    // 0 arrives ahead of 65535 across the wrap.
    for (sn, tag) in [(65534u16, 1u8), (0, 3), (65535, 2), (1, 4)] {
        t.tunnel
            .events()
            .send(TunnelEvent::Pdu(peer_data_pdu(1, Some(sn), &[tag])))
            .await?;
    }

    for tag in 1u8..=4 {
        let (sdu, _) = t.notifier.recv_sdu().await?;
        assert_eq!(sdu, vec![tag]);
    }
    t.tunnel.shutdown().await;
    Ok(())
}

#[async_std::test]
async fn teardown_discards_buffered_pdus() -> anyhow::Result<()> {
    let logger = init_logging();
    let demux = GtpuDemux::new(logger.clone());
    let t = ngu_tunnel(1, 2, Duration::from_millis(100), &logger);
    demux.register(t.tunnel.local_teid(), t.tunnel.events());

    demux.handle_datagram(peer_data_pdu(1, Some(5), b"a")).await?;
    demux.handle_datagram(peer_data_pdu(1, Some(7), b"b")).await?;
    let (sdu, _) = t.notifier.recv_sdu().await?;
    assert_eq!(sdu, b"a");

    // Shut down while 7 is buffered behind the gap; the pending timer must
    // not deliver it afterwards.
    demux.deregister(t.tunnel.local_teid());
    t.tunnel.shutdown().await;
    t.notifier.expect_silence(Duration::from_millis(200)).await
}

#[async_std::test]
async fn control_pdus_go_to_the_control_receiver() -> anyhow::Result<()> {
    let logger = init_logging();
    let t = ngu_tunnel(1, 2, Duration::from_secs(1), &logger);

    let echo = gtpu::encode(&gtpu::GtpuPdu {
        message_type: gtpu::GTPU_MSG_ECHO_REQUEST,
        teid: gtpu::GtpTeid::from(1),
        sequence_number: Some(0),
        n_pdu_number: None,
        extensions: Vec::new(),
        payload: Vec::new(),
    });
    t.tunnel.events().send(TunnelEvent::Pdu(echo.clone())).await?;

    let (message_type, pdu) = t.control.recv_control().await?;
    assert_eq!(message_type, gtpu::GTPU_MSG_ECHO_REQUEST);
    assert_eq!(pdu, echo);
    t.tunnel.shutdown().await;
    Ok(())
}
