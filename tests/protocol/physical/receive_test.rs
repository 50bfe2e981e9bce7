//! Tests for frame reception: validation, counters and delivery to the link layer.
mod helpers {
    include!("../../helpers/mod.rs");
}

use helpers::{
    armed_event, build_frame, new_phy, receive_bytes, receive_frame, FixedRng, LineError,
    MockTimer, MockUart,
};
use jd_phy::{
    core::{Frame, FRAME_CAPACITY, FRAME_FLAG_VNEXT},
    protocol::{
        physical::{BusState, Physical, SharedPhysical, Status, StatusRegister},
        transport::{
            config::PhyConfig,
            traits::{link::Link, phy_timer::TimerEvent},
        },
    },
};
use embassy_time::Duration;
use std::collections::VecDeque;

/// Register shared with the link layer, as firmware keeps it in a `static`.
static REPLY_STATUS: StatusRegister = StatusRegister::new();

/// Link layer answering every delivered frame with a reply.
struct ReplyingLink {
    status: &'static StatusRegister,
    replies: VecDeque<Box<Frame>>,
    delivered: usize,
}

impl Link for ReplyingLink {
    type TxFrame = Box<Frame>;
    type Error = ();

    fn next_tx_frame(&mut self) -> Option<Box<Frame>> {
        self.replies.pop_front()
    }

    fn tx_frame_sent(&mut self, _frame: Box<Frame>) {}

    fn frame_received(&mut self, frame: &Frame) -> Result<(), ()> {
        self.delivered += 1;
        let reply = build_frame(0xAA, &frame.as_bytes()[16..18]);
        self.replies.push_back(Box::new(reply));
        // Inside the critical section: only the register is reachable.
        self.status.request_tx();
        Ok(())
    }
}

#[test]
/// A sealed frame with a 10-byte payload reaches the link layer intact.
fn test_valid_frame_forwarded() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(0x0102_0304_0506_0708, &[0xAB; 10]);

    receive_frame(&mut phy, &frame);

    let diagnostics = phy.diagnostics();
    assert_eq!(diagnostics.packets_received, 1);
    assert_eq!(diagnostics.bus_uart_error, 0);
    assert_eq!(diagnostics.packets_dropped, 0);

    let received = &phy.link().received;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].wire_bytes(), frame.wire_bytes());
    assert_eq!(received[0].device_identifier(), 0x0102_0304_0506_0708);
    assert_eq!(received[0].service_size(), 10);

    assert_eq!(status.state(), BusState::Idle);
    assert!(!phy.uart().reading);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::Tick));
}

#[test]
/// One corrupted byte fails the CRC check and counts as a UART error.
fn test_corrupted_frame_counted() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(7, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    let mut bytes = frame.wire_bytes().to_vec();
    bytes[20] ^= 0x01;

    receive_bytes(&mut phy, &bytes);

    let diagnostics = phy.diagnostics();
    assert_eq!(diagnostics.bus_uart_error, 1);
    assert_eq!(diagnostics.packets_received, 0);
    assert!(phy.link().received.is_empty());
}

#[test]
/// No bit flip anywhere in the covered span is ever delivered.
fn test_no_single_bit_flip_delivered() {
    let frame = build_frame(0xDEAD_BEEF, &[0x5A; 10]);
    let span = frame.wire_bytes().len();

    for index in 0..span {
        let status = StatusRegister::new();
        let mut phy = new_phy(&status);
        let mut bytes = frame.wire_bytes().to_vec();
        bytes[index] ^= 0x10;

        receive_bytes(&mut phy, &bytes);
        assert!(
            phy.link().received.is_empty(),
            "flip at byte {index} was delivered"
        );
    }
}

#[test]
/// An empty completion (size byte zero) is ignored silently.
fn test_zero_size_completion_ignored() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);

    phy.line_falling();
    phy.rx_completed(Ok(FRAME_CAPACITY));

    let diagnostics = phy.diagnostics();
    assert_eq!(diagnostics.bus_uart_error, 0);
    assert_eq!(diagnostics.packets_received, 0);
    assert_eq!(diagnostics.packets_dropped, 0);
    assert!(phy.link().received.is_empty());
    assert!(!status.flags().contains(Status::RX_ACTIVE));
}

#[test]
/// A UART error on an otherwise valid buffer is still a UART error.
fn test_hardware_error_counted() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(1, &[9; 4]);

    phy.line_falling();
    let buffer = phy.rx_buffer().expect("lease held");
    *buffer = frame;
    phy.rx_completed(Err(LineError));

    assert_eq!(phy.diagnostics().bus_uart_error, 1);
    assert!(phy.link().received.is_empty());
}

#[test]
/// Fewer bytes than the header declares: refused before any CRC check.
fn test_short_frame_refused() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(1, &[3; 16]);
    let bytes = frame.wire_bytes();

    receive_bytes(&mut phy, &bytes[..bytes.len() - 4]);

    assert_eq!(phy.diagnostics().bus_uart_error, 1);
    assert!(phy.link().received.is_empty());
}

#[test]
/// Frames from a future protocol generation are dropped, not rejected.
fn test_vnext_frame_dropped() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let mut frame = Frame::new();
    frame.set_flags(FRAME_FLAG_VNEXT);
    frame.push_packet(2, 0x0003, &[1, 2]).expect("fits");
    frame.seal();

    receive_frame(&mut phy, &frame);

    let diagnostics = phy.diagnostics();
    assert_eq!(diagnostics.packets_dropped, 1);
    assert_eq!(diagnostics.packets_received, 0);
    assert_eq!(diagnostics.bus_uart_error, 0);
    assert!(phy.link().received.is_empty());
}

#[test]
/// A frame the link layer refuses is received, then dropped.
fn test_link_refusal_counts_drop() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    phy.link_mut().reject = true;

    receive_frame(&mut phy, &build_frame(3, &[0; 8]));

    let diagnostics = phy.diagnostics();
    assert_eq!(diagnostics.packets_received, 1);
    assert_eq!(diagnostics.packets_dropped, 1);
}

#[test]
/// A transmission requested during reception is scheduled on completion.
fn test_completion_rearms_pending_transmission() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(5, &[1; 6]);

    phy.line_falling();
    phy.link_mut().queue.push_back(Box::new(build_frame(6, &[2; 2])));
    phy.packet_ready();
    assert!(status.tx_pending());
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::RxHeaderCheck));

    let buffer = phy.rx_buffer().expect("lease held");
    *buffer = frame;
    phy.rx_completed(Ok(FRAME_CAPACITY - frame.frame_len()));

    assert_eq!(phy.diagnostics().packets_received, 1);
    assert_eq!(status.flags(), Status::TX_QUEUED);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::Flush));
}

#[test]
/// Back-to-back frames reuse the single receive buffer.
fn test_consecutive_frames() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let first = build_frame(10, &[1; 12]);
    let second = build_frame(11, &[2; 3]);

    receive_frame(&mut phy, &first);
    receive_frame(&mut phy, &second);

    let received = &phy.link().received;
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].device_identifier(), 10);
    assert_eq!(received[1].device_identifier(), 11);
    // The buffer was wiped: nothing of the longer first frame leaks in.
    assert_eq!(received[1].wire_bytes(), second.wire_bytes());
    assert_eq!(phy.diagnostics().packets_received, 2);
}

#[test]
/// A reply queued from the delivery callback goes straight into the backoff.
fn test_reply_from_callback_arms_backoff() {
    let link = ReplyingLink {
        status: &REPLY_STATUS,
        replies: VecDeque::new(),
        delivered: 0,
    };
    let physical = Physical::new(
        &REPLY_STATUS,
        MockUart::default(),
        link,
        MockTimer::default(),
        FixedRng(0),
        PhyConfig::default(),
    )
    .expect("default config is valid");
    let shared = SharedPhysical::new(physical);
    shared.start();

    let frame = build_frame(0x10, &[5; 6]);
    shared.line_falling();
    shared.with(|phy| *phy.rx_buffer().expect("lease held") = frame);
    shared.rx_completed(Ok(FRAME_CAPACITY - frame.frame_len()));

    assert_eq!(shared.with(|phy| phy.link().delivered), 1);
    assert_eq!(REPLY_STATUS.flags(), Status::TX_QUEUED);
    assert_eq!(
        shared.with(|phy| phy.timer_mut().armed),
        Some((Duration::from_micros(78), TimerEvent::Flush))
    );

    shared.on_timer(TimerEvent::Flush);
    let sent = shared.with(|phy| phy.uart().sent.clone());
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], build_frame(0xAA, &[5, 5]).wire_bytes());
    assert_eq!(REPLY_STATUS.state(), BusState::TxActive);
}
