//! Interrupt-driven physical layer: line monitor, frame receiver and transmit
//! scheduler coordinated through one [`StatusRegister`] and one timer slot.
//!
//! Every entry point (line edge, UART completion, timer) runs to completion
//! and at most re-arms the timer. Firmware routes its interrupts to
//! [`Physical`] directly or through [`SharedPhysical`].
//!
//! ```text
//!            line_falling            rx_completed
//!   Idle ─────────────────► RxActive ─────────────► Idle
//!    │ packet_ready (idle)                           ▲
//!    ▼                     flush ok                  │ tx_completed / start failed / queue empty
//!  TxQueued ─────────────────────────► TxActive ─────┘
//!    │ flush deferred (bus busy): pending flag kept, next retime retries
//! ```
use rand::RngCore;

use crate::core::Frame;
use crate::error::ConfigError;
use crate::protocol::transport::{
    config::PhyConfig,
    traits::{
        link::Link,
        phy_timer::{PhyTimer, TimerEvent},
        uart::Uart,
    },
};

pub mod diagnostics;
mod line_monitor;
mod receiver;
mod rx_slot;
pub mod shared;
pub mod status;
mod transmitter;

pub use diagnostics::Diagnostics;
pub use shared::SharedPhysical;
pub use status::{BusState, BusStatus, Status, StatusRegister};

use rx_slot::RxSlot;

/// Everything that can wake the physical layer.
#[derive(Debug)]
pub enum BusEvent<E> {
    /// Falling edge on the bus line: start of frame.
    LineFalling,
    /// UART reception finished: `Ok(bytes not received)` or the UART error.
    RxCompleted(Result<usize, E>),
    /// UART transmission finished.
    TxCompleted(Result<(), E>),
    /// The timer slot fired.
    Timer(TimerEvent),
}

/// Physical layer state machine.
pub struct Physical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    status: &'a StatusRegister,
    uart: U,
    link: L,
    timer: T,
    rng: R,
    config: PhyConfig,
    rx_slot: RxSlot,
    /// Frame claimed from the link layer and not yet confirmed sent.
    tx_frame: Option<L::TxFrame>,
    diagnostics: Diagnostics,
    started: bool,
}

impl<'a, U, L, T, R> Physical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    /// Assemble the layer. Nothing is armed until [`start`](Self::start).
    pub fn new(
        status: &'a StatusRegister,
        uart: U,
        link: L,
        timer: T,
        rng: R,
        config: PhyConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            status,
            uart,
            link,
            timer,
            rng,
            config,
            rx_slot: RxSlot::new(),
            tx_frame: None,
            diagnostics: Diagnostics::default(),
            started: false,
        })
    }

    /// Start the layer: arms the idle heartbeat (or the backoff if a frame
    /// is already pending).
    pub fn start(&mut self) {
        self.started = true;
        self.retime(Status::empty());
    }

    pub fn is_running(&self) -> bool {
        self.started
    }

    /// Any reception or transmission activity in progress or queued.
    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    pub fn status(&self) -> &'a StatusRegister {
        self.status
    }

    pub fn config(&self) -> &PhyConfig {
        &self.config
    }

    /// Counter snapshot with the current bus state filled in.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            bus_state: self.status.state() as u32,
            ..self.diagnostics
        }
    }

    /// Receive buffer, available only while a reception holds the lease.
    pub fn rx_buffer(&mut self) -> Option<&mut Frame> {
        self.rx_slot.leased_mut()
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Whether a frame is held between claim and confirmation.
    pub fn has_claimed_frame(&self) -> bool {
        self.tx_frame.is_some()
    }

    /// Single dispatch point for every wake-up source.
    pub fn handle(&mut self, event: BusEvent<U::Error>) {
        match event {
            BusEvent::LineFalling => self.line_falling(),
            BusEvent::RxCompleted(outcome) => self.rx_completed(outcome),
            BusEvent::TxCompleted(outcome) => self.tx_completed(outcome),
            BusEvent::Timer(event) => self.on_timer(event),
        }
    }

    /// Timer slot fired.
    pub fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::RxHeaderCheck => self.rx_header_check(),
            TimerEvent::RxTimeout => self.rx_timeout_elapsed(),
            TimerEvent::Flush => self.flush(),
            TimerEvent::Tick => self.tick(),
        }
    }

    /// Start arbitration for a frame flagged through
    /// [`StatusRegister::request_tx`] while the bus was already idle and
    /// nothing was going to retime.
    fn resume_pending(&mut self) {
        let status = self.status.snapshot();
        if status.tx_pending && status.flags.is_empty() {
            self.retime(Status::empty());
        }
    }

    /// Shared decision step, run after every status change.
    ///
    /// Clears `clear`, then: while a reception runs nothing is armed (its
    /// completion retimes); otherwise a pending frame arms the randomized
    /// backoff, and a quiet bus arms the idle heartbeat. Status flags are
    /// only ever cleared here.
    fn retime(&mut self, clear: Status) {
        let Self {
            status,
            timer,
            rng,
            config,
            ..
        } = self;

        status.update(|status| {
            status.flags.remove(clear);
            if status.flags.contains(Status::RX_ACTIVE) {
                return;
            }
            if status.tx_pending && !status.flags.contains(Status::TX_ACTIVE) {
                status.flags.insert(Status::TX_QUEUED);
                timer.schedule(config.backoff.delay(rng), TimerEvent::Flush);
            } else {
                status.flags.remove(Status::TX_QUEUED);
                timer.schedule(config.idle_tick, TimerEvent::Tick);
            }
        });
    }
}
