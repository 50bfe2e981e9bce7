//! Interrupt-safe wrapper around [`Physical`].
//!
//! Each entry point borrows the state machine inside a critical section, so
//! the line-edge interrupt, the UART interrupts, the timer and normal-context
//! code can all call in without racing. Firmware typically keeps one instance
//! in a `static` and calls it from its interrupt handlers.
//!
//! Link callbacks run inside that critical section: they must not call back
//! into the wrapper (the `RefCell` would panic). To flag a new frame from a
//! callback, use [`StatusRegister::request_tx`]; the backoff is armed as soon
//! as the callback returns.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use rand::RngCore;

use super::{BusEvent, Diagnostics, Physical, StatusRegister};
use crate::protocol::transport::{
    timer_slot::TimerSlot,
    traits::{
        link::Link,
        phy_timer::{PhyTimer, TimerEvent},
        uart::Uart,
    },
};

/// [`Physical`] behind a critical-section mutex.
pub struct SharedPhysical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    status: &'a StatusRegister,
    inner: Mutex<CriticalSectionRawMutex, RefCell<Physical<'a, U, L, T, R>>>,
}

impl<'a, U, L, T, R> SharedPhysical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    pub fn new(physical: Physical<'a, U, L, T, R>) -> Self {
        Self {
            status: physical.status(),
            inner: Mutex::new(RefCell::new(physical)),
        }
    }

    /// Run `f` with exclusive access to the state machine.
    pub fn with<F, Ret>(&self, f: F) -> Ret
    where
        F: FnOnce(&mut Physical<'a, U, L, T, R>) -> Ret,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn start(&self) {
        self.with(|phy| phy.start());
    }

    pub fn line_falling(&self) {
        self.with(|phy| phy.line_falling());
    }

    pub fn rx_completed(&self, outcome: Result<usize, U::Error>) {
        self.with(|phy| phy.rx_completed(outcome));
    }

    pub fn tx_completed(&self, outcome: Result<(), U::Error>) {
        self.with(|phy| phy.tx_completed(outcome));
    }

    pub fn packet_ready(&self) {
        self.with(|phy| phy.packet_ready());
    }

    pub fn on_timer(&self, event: TimerEvent) {
        self.with(|phy| phy.on_timer(event));
    }

    pub fn handle(&self, event: BusEvent<U::Error>) {
        self.with(|phy| phy.handle(event));
    }

    /// Lock-free with respect to the state machine: only reads the register.
    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    pub fn is_running(&self) -> bool {
        self.with(|phy| phy.is_running())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.with(|phy| phy.diagnostics())
    }

    /// Event-dispatch loop for firmware that drives the layer from a
    /// [`TimerSlot`]. The slot must be the timer the layer was built with.
    pub async fn run(&self, slot: &TimerSlot) {
        loop {
            let event = slot.next().await;
            self.on_timer(event);
        }
    }
}
