//! Transmit scheduler: pending intent, backoff flush, start race handling and
//! completion.
use core::borrow::Borrow;

use rand::RngCore;

use super::{diagnostics::bump, Physical, Status};
use crate::core::Frame;
use crate::protocol::transport::traits::{link::Link, phy_timer::PhyTimer, uart::Uart};

impl<'a, U, L, T, R> Physical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    /// A frame was queued in the link layer. Idempotent until the next flush.
    pub fn packet_ready(&mut self) {
        if self.status.request_tx() {
            self.retime(Status::empty());
        }
    }

    /// Backoff elapsed: claim the bus and start the hardware transmission.
    pub(super) fn flush(&mut self) {
        let claimed = self.status.update(|status| {
            if status
                .flags
                .intersects(Status::RX_ACTIVE | Status::TX_ACTIVE)
            {
                return false;
            }
            status.flags.insert(Status::TX_ACTIVE);
            status.tx_pending = false;
            true
        });
        if !claimed {
            // Bus got busy since the decision; the pending flag stays and the
            // reception's completion will retime.
            #[cfg(feature = "defmt")]
            defmt::trace!("flush deferred");
            return;
        }

        if self.tx_frame.is_none() {
            self.tx_frame = self.link.next_tx_frame();
        }
        let Some(frame) = self.tx_frame.as_ref() else {
            self.tx_done();
            return;
        };

        self.uart.signal_write(true);
        let frame = <L::TxFrame as Borrow<Frame>>::borrow(frame);
        match self.uart.start_tx(frame.wire_bytes()) {
            Ok(()) => self.retime(Status::empty()),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("race on TX: {}", defmt::Debug2Format(&_err));
                bump(&mut self.diagnostics.bus_lo_error);
                self.tx_done();
                // Keep the claimed frame and retry on the next cycle.
                self.status.update(|status| status.tx_pending = true);
            }
        }
    }

    /// UART finished clocking out the claimed frame.
    pub fn tx_completed(&mut self, outcome: Result<(), U::Error>) {
        #[cfg(feature = "defmt")]
        defmt::trace!("tx done: {}", outcome.is_ok());

        if let Some(frame) = self.tx_frame.take() {
            if outcome.is_ok() {
                bump(&mut self.diagnostics.packets_sent);
            }
            self.link.tx_frame_sent(frame);
        }
        self.tx_done();
    }

    /// Release the bus after a transmission attempt.
    fn tx_done(&mut self) {
        self.uart.signal_write(false);
        self.retime(Status::TX_ACTIVE);
    }

    /// Idle heartbeat.
    ///
    /// # Panics
    /// If a transmission is active: the heartbeat must have been superseded.
    pub(super) fn tick(&mut self) {
        if self.status.flags().contains(Status::TX_ACTIVE) {
            panic!("idle tick fired during an active transmission");
        }
        self.retime(Status::empty());
    }
}
