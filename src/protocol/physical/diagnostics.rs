//! Bus and frame error counters. Process lifetime, never reset internally.

/// Snapshot of the diagnostics counters. All counters wrap on overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Current [`BusState`](super::status::BusState) discriminant, filled on read.
    pub bus_state: u32,
    /// Lost the start race: the line went low before our transmission began.
    pub bus_lo_error: u32,
    /// UART error, short frame, CRC mismatch or size out of bounds.
    pub bus_uart_error: u32,
    /// Reception stalled (line stuck low, no header, or frame never finished).
    pub bus_timeout_error: u32,
    /// Transmissions confirmed by the UART.
    pub packets_sent: u32,
    /// Valid frames handed to the link layer.
    pub packets_received: u32,
    /// Valid frames refused by the link layer or from a future protocol generation.
    pub packets_dropped: u32,
}

pub(crate) fn bump(counter: &mut u32) {
    *counter = counter.wrapping_add(1);
}
