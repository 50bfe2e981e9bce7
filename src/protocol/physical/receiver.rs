//! Frame receiver: validates a completed reception and forwards it upward.
use rand::RngCore;

use super::{diagnostics::bump, Physical, Status};
use crate::core::FRAME_CAPACITY;
use crate::error::FrameError;
use crate::protocol::transport::traits::{link::Link, phy_timer::PhyTimer, uart::Uart};

impl<'a, U, L, T, R> Physical<'a, U, L, T, R>
where
    U: Uart,
    L: Link,
    T: PhyTimer,
    R: RngCore,
{
    /// UART reception finished. `outcome` is `Ok(bytes not received)` or the
    /// UART error.
    ///
    /// The bus is released for arbitration first; validation failures are
    /// counted and the frame dropped, never retried here.
    pub fn rx_completed(&mut self, outcome: Result<usize, U::Error>) {
        #[cfg(feature = "defmt")]
        defmt::trace!("rx cmpl");

        self.uart.signal_read(false);
        let current = self.rx_slot.release();
        self.retime(Status::RX_ACTIVE);

        // Completion of a reception already abandoned on timeout.
        if !current {
            return;
        }

        // Line held low produces empty completions on some targets; not an error.
        if self.rx_slot.frame().size() == 0 {
            return;
        }

        let frame = self.rx_slot.frame();
        let checked = match outcome {
            Ok(data_left) => frame.validate(FRAME_CAPACITY.saturating_sub(data_left)),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("rx err: {}", defmt::Debug2Format(&_err));
                Err(FrameError::Uart)
            }
        };
        if let Err(_err) = checked {
            #[cfg(feature = "defmt")]
            defmt::warn!("frame refused: {}", defmt::Display2Format(&_err));
            bump(&mut self.diagnostics.bus_uart_error);
            return;
        }

        if frame.is_vnext() {
            bump(&mut self.diagnostics.packets_dropped);
            return;
        }

        bump(&mut self.diagnostics.packets_received);
        if self.link.frame_received(frame).is_err() {
            #[cfg(feature = "defmt")]
            defmt::debug!("drop RX");
            bump(&mut self.diagnostics.packets_dropped);
        }
        // The link may have queued a reply through the register.
        self.resume_pending();
    }
}
