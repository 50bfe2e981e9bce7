//! Tests for the line monitor: start edge, header window and receive timeouts.
mod helpers {
    include!("../../helpers/mod.rs");
}

use helpers::{armed_event, build_frame, fire_timer, new_phy};
use jd_phy::{
    core::FRAME_CAPACITY,
    protocol::{
        physical::{BusState, Status, StatusRegister},
        transport::traits::phy_timer::TimerEvent,
    },
};
use embassy_time::Duration;

#[test]
/// The start edge claims the receive buffer and arms the header window.
fn test_line_falling_starts_reception() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);

    phy.line_falling();

    assert_eq!(status.state(), BusState::RxActive);
    assert!(phy.uart().reading);
    assert_eq!(phy.uart().rx_armed, Some(FRAME_CAPACITY));
    assert!(phy.rx_buffer().is_some());
    assert_eq!(
        phy.timer_mut().armed,
        Some((Duration::from_micros(250), TimerEvent::RxHeaderCheck))
    );
}

#[test]
/// Nothing arrived within the header window: the reception is abandoned.
fn test_missing_header_times_out() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);

    phy.line_falling();
    fire_timer(&mut phy);

    assert_eq!(phy.diagnostics().bus_timeout_error, 1);
    assert!(!status.flags().contains(Status::RX_ACTIVE));
    assert_eq!(phy.uart().disabled, 1);
    assert_eq!(phy.uart().rx_armed, None);
    assert!(!phy.uart().reading);
    assert!(phy.rx_buffer().is_none());
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::Tick));
}

#[test]
/// A header in the window bounds the reception by the declared length.
fn test_header_arms_frame_timeout() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(0x42, &[7; 20]);
    phy.uart_mut().pending_rx = frame.wire_bytes()[..8].to_vec();

    phy.line_falling();
    fire_timer(&mut phy);

    let expected = frame.frame_len() as u64 * 12 + 60;
    assert_eq!(
        phy.timer_mut().armed,
        Some((Duration::from_micros(expected), TimerEvent::RxTimeout))
    );
    assert_eq!(phy.diagnostics().bus_timeout_error, 0);
    assert_eq!(status.state(), BusState::RxActive);

    // The frame never finishes.
    fire_timer(&mut phy);
    assert_eq!(phy.diagnostics().bus_timeout_error, 1);
    assert_eq!(status.state(), BusState::Idle);
    assert_eq!(phy.uart().disabled, 1);
}

#[test]
/// A header followed by a completion in time delivers the frame.
fn test_header_then_completion() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(0x42, &[7; 20]);
    phy.uart_mut().pending_rx = frame.wire_bytes().to_vec();

    phy.line_falling();
    fire_timer(&mut phy);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::RxTimeout));
    phy.rx_completed(Ok(FRAME_CAPACITY - frame.frame_len()));

    assert_eq!(phy.link().received.len(), 1);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::Tick));

    // Late RxTimeout: already superseded in hardware, ignored here.
    phy.on_timer(TimerEvent::RxTimeout);
    assert_eq!(phy.diagnostics().bus_timeout_error, 0);
}

#[test]
/// Line held low after the start pulse: timeout without arming the UART.
fn test_line_stuck_low() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    phy.uart_mut().line_stuck_low = true;

    phy.line_falling();

    assert_eq!(phy.diagnostics().bus_timeout_error, 1);
    assert_eq!(phy.uart().rx_armed, None);
    assert_eq!(status.state(), BusState::Idle);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::Tick));

    // The bus recovers on the next edge.
    phy.uart_mut().line_stuck_low = false;
    phy.line_falling();
    assert_eq!(status.state(), BusState::RxActive);
}

#[test]
#[should_panic(expected = "reception is active")]
/// Two start edges without completion in between is a driver fault.
fn test_overlapping_start_panics() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    phy.line_falling();
    phy.line_falling();
}

#[test]
/// A header check firing after the reception completed only retimes.
fn test_stale_header_check() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);

    phy.line_falling();
    phy.rx_completed(Ok(FRAME_CAPACITY));
    phy.on_timer(TimerEvent::RxHeaderCheck);

    assert_eq!(phy.diagnostics().bus_timeout_error, 0);
    assert_eq!(phy.uart().disabled, 0);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::Tick));
}

#[test]
/// The receive buffer is only lent out between edge and completion.
fn test_rx_buffer_only_during_reception() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    assert!(phy.rx_buffer().is_none());

    phy.line_falling();
    assert!(phy.rx_buffer().is_some());

    phy.rx_completed(Ok(FRAME_CAPACITY));
    assert!(phy.rx_buffer().is_none());
}

#[test]
/// A UART writing straight into the leased buffer needs no access to `rx_buffer`.
fn test_reception_into_armed_buffer() {
    let status = StatusRegister::new();
    let mut phy = new_phy(&status);
    let frame = build_frame(0x99, &[6; 30]);
    phy.uart_mut().dma_rx = frame.wire_bytes().to_vec();

    phy.line_falling();
    assert_eq!(phy.uart().rx_armed, Some(FRAME_CAPACITY));

    // Header probe sees the bytes already in the buffer.
    fire_timer(&mut phy);
    assert_eq!(armed_event(&mut phy), Some(TimerEvent::RxTimeout));

    phy.rx_completed(Ok(FRAME_CAPACITY - frame.frame_len()));
    let received = &phy.link().received;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].wire_bytes(), frame.wire_bytes());
}
