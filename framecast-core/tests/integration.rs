//! Integration tests: packetizer and reassembler behaviour under loss,
//! reordering, duplication and wraparound, plus a full sender/receiver
//! pipeline over localhost UDP.

use std::time::Duration;

use bytes::Bytes;
use tokio_test::assert_ok;

use framecast_core::{
    AssemblyView, CompletedFrame, FrameReceiver, FrameSender, FrameTransport, MAX_PAYLOAD_PER_PACKET,
    Packet, PatternSource, RawImage, Reassembler, SenderOptions, SequenceNumber, split,
};

// ── Helpers ──────────────────────────────────────────────────────

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) % 256) as u8).collect()
}

fn wire(packets: &[Packet]) -> Vec<Bytes> {
    packets.iter().map(Packet::to_datagram).collect()
}

/// Feed datagrams and collect every emitted frame.
fn feed<'a>(r: &mut Reassembler, datagrams: impl IntoIterator<Item = &'a Bytes>) -> Vec<CompletedFrame> {
    datagrams.into_iter().filter_map(|d| r.on_packet(d)).collect()
}

fn frame_datagrams(seq: i32, parts: usize) -> Vec<Bytes> {
    let data = payload(parts * MAX_PAYLOAD_PER_PACKET - 10);
    let datagrams = wire(&split(data, SequenceNumber::new(seq)).unwrap());
    assert_eq!(datagrams.len(), parts);
    datagrams
}

// ── Round trip ───────────────────────────────────────────────────

#[test]
fn test_round_trip_lengths() {
    let max = MAX_PAYLOAD_PER_PACKET;
    let mut r = Reassembler::new();

    for (seq, len) in [0, 1, max, max + 1, 3 * max + 7].into_iter().enumerate() {
        let data = payload(len);
        let datagrams = wire(&split(data.clone(), SequenceNumber::new(seq as i32)).unwrap());

        let frames = feed(&mut r, &datagrams);
        assert_eq!(frames.len(), 1, "length {len}");
        assert_eq!(frames[0].sequence.get(), seq as i32);
        assert_eq!(frames[0].data.len(), len);
        assert_eq!(frames[0].data.as_ref(), data.as_slice(), "length {len}");
        assert_eq!(r.view(), AssemblyView::Empty);
    }
}

#[test]
fn test_reordered_and_duplicated_delivery_completes_once() {
    let data = payload(3 * MAX_PAYLOAD_PER_PACKET + 7);
    let d = wire(&split(data.clone(), SequenceNumber::new(12)).unwrap());
    let mut r = Reassembler::new();

    let order = [&d[3], &d[1], &d[1], &d[0], &d[3], &d[2], &d[2], &d[0]];
    let frames = feed(&mut r, order);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data.as_ref(), data.as_slice());
    assert_eq!(r.stats().duplicates, 2);
    // Packets arriving after completion start a fresh cycle from scratch.
    assert_eq!(
        r.view(),
        AssemblyView::Assembling {
            sequence: SequenceNumber::new(12),
            part_count: 4,
            missing: 2,
        }
    );
}

// ── Duplicate idempotence ────────────────────────────────────────

#[test]
fn test_duplicate_idempotence() {
    let d = frame_datagrams(40, 3);
    let mut r = Reassembler::new();

    assert!(r.on_packet(&d[0]).is_none());
    assert!(r.on_packet(&d[2]).is_none());
    let before = r.view();
    for _ in 0..5 {
        assert!(r.on_packet(&d[2]).is_none());
        assert!(r.on_packet(&d[0]).is_none());
    }
    assert_eq!(r.view(), before);
    assert_eq!(r.stats().duplicates, 10);

    assert!(r.on_packet(&d[1]).is_some());
}

// ── Staleness ────────────────────────────────────────────────────

#[test]
fn test_staleness_rejection() {
    let mut r = Reassembler::new();
    let current = frame_datagrams(1_000, 2);
    r.on_packet(&current[0]);
    let before = r.view();

    for old in [999, 0, -5, 1_000 - i32::MAX] {
        for d in frame_datagrams(old, 2) {
            assert!(r.on_packet(&d).is_none());
        }
    }
    assert_eq!(r.view(), before);
    assert_eq!(r.stats().stale, 8);
    assert_eq!(r.stats().superseded, 0);
}

// ── Supersession ─────────────────────────────────────────────────

#[test]
fn test_supersession_drops_incomplete_frame() {
    let n = frame_datagrams(70, 3);
    let next = frame_datagrams(71, 3);
    let mut r = Reassembler::new();

    r.on_packet(&n[0]);
    r.on_packet(&n[1]);
    assert!(r.on_packet(&next[2]).is_none());
    assert_eq!(
        r.view(),
        AssemblyView::Assembling {
            sequence: SequenceNumber::new(71),
            part_count: 3,
            missing: 2,
        }
    );

    // The missing part of 70 arrives late: ignored.
    assert!(r.on_packet(&n[2]).is_none());

    let frames = feed(&mut r, [&next[0], &next[1]]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].sequence.get(), 71);
    assert_eq!(r.stats().superseded, 1);
    assert_eq!(r.stats().completed, 1);
}

// ── Wraparound ───────────────────────────────────────────────────

#[test]
fn test_wraparound_supersedes() {
    let before_wrap = frame_datagrams(i32::MAX, 2);
    let after_wrap = frame_datagrams(i32::MAX.wrapping_add(1), 2);
    assert_eq!(i32::MAX.wrapping_add(1), i32::MIN);

    let mut r = Reassembler::new();
    r.on_packet(&before_wrap[0]);
    r.on_packet(&after_wrap[0]);
    assert_eq!(r.stats().superseded, 1);

    // Late pre-wrap part is stale, post-wrap frame completes.
    assert!(r.on_packet(&before_wrap[1]).is_none());
    let frame = r.on_packet(&after_wrap[1]).unwrap();
    assert_eq!(frame.sequence.get(), i32::MIN);
}

// ── Malformed input ──────────────────────────────────────────────

#[test]
fn test_malformed_input_resilience() {
    let mut r = Reassembler::new();
    let good = frame_datagrams(3, 2);
    r.on_packet(&good[0]);

    let mut zero_count = vec![0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0];
    zero_count.extend_from_slice(b"data");
    let index_too_big: [u8; 12] = [0, 0, 0, 4, 0, 0, 0, 2, 0, 0, 0, 2];

    assert!(r.on_packet(&[1, 2, 3]).is_none());
    assert!(r.on_packet(&zero_count).is_none());
    assert!(r.on_packet(&index_too_big).is_none());
    assert_eq!(r.stats().malformed, 3);

    // The in-flight frame is untouched and still completes.
    let frame = r.on_packet(&good[1]).unwrap();
    assert_eq!(frame.sequence.get(), 3);
}

// ── End-to-end scenarios ─────────────────────────────────────────

#[test]
fn test_end_to_end_in_order() {
    let data = payload(2 * MAX_PAYLOAD_PER_PACKET + 100);
    let d = wire(&split(data.clone(), SequenceNumber::new(5)).unwrap());
    assert_eq!(d.len(), 3);

    let mut r = Reassembler::new();
    let frames = feed(&mut r, &d);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].sequence.get(), 5);
    assert_eq!(frames[0].data.as_ref(), data.as_slice());
}

#[test]
fn test_end_to_end_lost_part_then_newer_frame() {
    let five = frame_datagrams(5, 3);
    let six = wire(&split(b"six".to_vec(), SequenceNumber::new(6)).unwrap());
    assert_eq!(six.len(), 1);

    let mut r = Reassembler::new();
    assert!(feed(&mut r, [&five[0], &five[1]]).is_empty());

    let frame = r.on_packet(&six[0]).expect("frame 6 emitted on arrival");
    assert_eq!(frame.sequence.get(), 6);
    assert_eq!(frame.data.as_ref(), b"six");
    assert_eq!(r.stats().completed, 1);
    assert_eq!(r.view(), AssemblyView::Empty);
}

// ── Full pipeline over UDP ───────────────────────────────────────

#[tokio::test]
async fn test_sender_receiver_pipeline() {
    let recv_transport = assert_ok!(FrameTransport::bind("127.0.0.1:0".parse().unwrap()).await);
    let addr = assert_ok!(recv_transport.local_addr());
    let mut receiver = FrameReceiver::new(recv_transport);
    let mut frames = receiver.frame_receiver();
    let recv_handle = tokio::spawn(async move { receiver.run().await });

    let send_transport = assert_ok!(FrameTransport::connect(addr).await);
    let opts = SenderOptions {
        target_fps: 50,
        max_payload: 1200,
        ..SenderOptions::default()
    };
    let mut sender = assert_ok!(FrameSender::with_options(
        PatternSource::new(96, 54, 1),
        send_transport,
        opts,
    ));
    let stop = sender.stop_handle();
    let send_handle = tokio::spawn(async move {
        let result = sender.run().await;
        (result, sender.stats())
    });

    // Wait for a few frames to make it through.
    let mut seen = Vec::new();
    while seen.len() < 3 {
        tokio::time::timeout(Duration::from_secs(5), frames.changed())
            .await
            .expect("timeout waiting for frame")
            .unwrap();
        let frame = frames.borrow_and_update().clone().unwrap();
        let image = assert_ok!(RawImage::decode(&frame.data));
        assert_eq!((image.width, image.height), (96, 54));
        seen.push(frame.sequence);
    }
    for pair in seen.windows(2) {
        assert!(pair[1].is_newer_than(pair[0]));
    }

    stop.store(false, std::sync::atomic::Ordering::SeqCst);
    let (result, stats) = send_handle.await.unwrap();
    assert_ok!(result);
    assert!(stats.frames_sent >= 3);
    assert_eq!(stats.ticks_skipped, 0);

    recv_handle.abort();
    let _ = recv_handle.await;
}
