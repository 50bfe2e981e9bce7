//! One-shot timer abstraction. A single slot serves the receive timeouts, the
//! transmit backoff and the idle heartbeat.
use embassy_time::Duration;

/// Work scheduled on the timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerEvent {
    /// Check that header bytes arrived after the start pulse.
    RxHeaderCheck,
    /// Abandon a stalled reception.
    RxTimeout,
    /// Backoff elapsed: try to claim the bus.
    Flush,
    /// Idle heartbeat.
    Tick,
}

/// Timer contract; scheduling always supersedes the previously armed event.
pub trait PhyTimer {
    /// Fire `event` after `delay`, replacing whatever was armed.
    fn schedule(&mut self, delay: Duration, event: TimerEvent);
}

impl<T: PhyTimer + ?Sized> PhyTimer for &mut T {
    fn schedule(&mut self, delay: Duration, event: TimerEvent) {
        (**self).schedule(delay, event)
    }
}
