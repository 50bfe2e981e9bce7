//! Single-slot one-shot timer backed by `embassy-time`.
//!
//! Firmware without a dedicated hardware timer callback can share one
//! [`TimerSlot`] between the physical layer (which arms it through
//! [`PhyTimer`]) and an async task running
//! [`SharedPhysical::run`](crate::protocol::physical::SharedPhysical::run),
//! which waits for the deadline and dispatches the event.
use core::cell::Cell;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, blocking_mutex::Mutex, signal::Signal};
use embassy_time::{Duration, Instant, Timer};
use futures_util::{future::select, future::Either, pin_mut};

use crate::protocol::transport::traits::phy_timer::{PhyTimer, TimerEvent};

/// Armed deadline and the event it fires.
type Armed = Option<(Instant, TimerEvent)>;

/// One outstanding timer at most; arming again replaces the previous deadline.
pub struct TimerSlot {
    armed: Mutex<CriticalSectionRawMutex, Cell<Armed>>,
    rearmed: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for TimerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSlot {
    pub const fn new() -> Self {
        Self {
            armed: Mutex::new(Cell::new(None)),
            rearmed: Signal::new(),
        }
    }

    /// Arm `event` at an absolute deadline.
    pub fn schedule_at(&self, deadline: Instant, event: TimerEvent) {
        self.armed.lock(|armed| armed.set(Some((deadline, event))));
        self.rearmed.signal(());
    }

    /// Disarm the slot.
    pub fn cancel(&self) {
        self.armed.lock(|armed| armed.set(None));
        self.rearmed.signal(());
    }

    /// Event currently armed, if any.
    pub fn pending(&self) -> Option<TimerEvent> {
        self.armed.lock(|armed| armed.get().map(|(_, event)| event))
    }

    /// Wait until the armed deadline elapses and return its event.
    ///
    /// Rearming while waiting restarts the wait on the new deadline; a
    /// superseded event is never returned.
    pub async fn next(&self) -> TimerEvent {
        loop {
            let Some((deadline, event)) = self.armed.lock(|armed| armed.get()) else {
                self.rearmed.wait().await;
                continue;
            };

            let expired = {
                let timer = Timer::at(deadline);
                let rearmed = self.rearmed.wait();
                pin_mut!(timer);
                pin_mut!(rearmed);
                matches!(select(timer, rearmed).await, Either::Left(_))
            };
            if !expired {
                continue;
            }

            // Only fire if nobody rearmed between the wake-up and this check.
            let fired = self.armed.lock(|armed| {
                if armed.get() == Some((deadline, event)) {
                    armed.set(None);
                    true
                } else {
                    false
                }
            });
            if fired {
                return event;
            }
        }
    }
}

impl PhyTimer for &TimerSlot {
    fn schedule(&mut self, delay: Duration, event: TimerEvent) {
        self.schedule_at(Instant::now() + delay, event);
    }
}
