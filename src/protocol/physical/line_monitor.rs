//! Line monitor: start-of-frame edge, header arrival supervision and receive
//! timeouts.
use rand::RngCore;

use super::{diagnostics::bump, Physical, Status};
use crate::protocol::transport::traits::{
    link::Link,
    phy_timer::{PhyTimer, TimerEvent},
    uart::Uart,
};

impl<'a, U, L, T, R> Physical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    /// Falling edge on the line: another node started a frame.
    ///
    /// An edge seen while we own the bus is the echo of our own start pulse
    /// and is ignored; platforms that can mask the edge interrupt during
    /// transmission should still do so.
    ///
    /// # Panics
    /// If a reception is already active. Two overlapping starts mean the
    /// driver state no longer matches the hardware.
    pub fn line_falling(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::trace!("line fall");

        let claimed = self.status.update(|status| {
            if status.flags.contains(Status::TX_ACTIVE) {
                return None;
            }
            let fresh = !status.flags.contains(Status::RX_ACTIVE);
            status.flags.insert(Status::RX_ACTIVE);
            Some(fresh)
        });
        match claimed {
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("own TX edge");
                return;
            }
            Some(false) => panic!("start of frame while a reception is active"),
            Some(true) => {}
        }
        self.uart.signal_read(true);

        // Arming the UART in the middle of the low pulse would read garbage.
        if self.uart.wait_high().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("line stuck low");
            self.rx_timeout();
            return;
        }

        let buffer = self.rx_slot.acquire();
        self.uart.start_rx(buffer.as_bytes_mut());

        if self.status.flags().contains(Status::RX_ACTIVE) {
            self.timer
                .schedule(self.config.rx_header_window, TimerEvent::RxHeaderCheck);
        }
    }

    /// Header window elapsed: bound the rest of the reception, or give up if
    /// nothing arrived.
    pub(super) fn rx_header_check(&mut self) {
        // The reception may have completed before the window elapsed.
        if !self.status.flags().contains(Status::RX_ACTIVE) {
            self.retime(Status::empty());
            return;
        }

        let Some(frame) = self.rx_slot.leased_mut() else {
            self.rx_timeout();
            return;
        };
        self.uart.flush_rx(frame.as_bytes_mut());

        if frame.has_header() {
            let timeout = self.config.rx_frame_timeout(frame.frame_len());
            self.timer.schedule(timeout, TimerEvent::RxTimeout);
        } else {
            self.rx_timeout();
        }
    }

    /// `RxTimeout` fired. Stale if the reception already completed.
    pub(super) fn rx_timeout_elapsed(&mut self) {
        if self.status.flags().contains(Status::RX_ACTIVE) {
            self.rx_timeout();
        } else {
            self.retime(Status::empty());
        }
    }

    /// Abandon the current reception.
    fn rx_timeout(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::warn!("RX t/o");

        bump(&mut self.diagnostics.bus_timeout_error);
        self.uart.disable();
        self.uart.signal_read(false);
        self.rx_slot.release();
        self.retime(Status::RX_ACTIVE);
    }
}
