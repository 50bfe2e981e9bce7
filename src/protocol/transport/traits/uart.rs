//! Minimal abstraction over the single-wire UART. Allows the state machine to
//! plug into DMA-driven or FIFO-driven peripherals alike.

/// Contract between the physical layer and the UART peripheral.
///
/// Every method is called from interrupt context and must return promptly;
/// only [`wait_high`](Uart::wait_high) may spin, and only for a bounded time.
pub trait Uart {
    type Error: core::fmt::Debug;

    /// Arm reception into `buffer`, the whole leased receive frame. The
    /// buffer stays valid until `rx_completed` or the next `disable`, so a DMA
    /// channel may keep its address. Completion is reported through
    /// `rx_completed`.
    fn start_rx(&mut self, buffer: &mut [u8]);

    /// Move bytes still sitting in the peripheral (FIFO, DMA half-transfer)
    /// into `buffer` so the header probe sees them.
    fn flush_rx(&mut self, buffer: &mut [u8]);

    /// Stop an in-flight or stalled reception.
    fn disable(&mut self);

    /// Spin until the line returns high, for at most about one millisecond.
    fn wait_high(&mut self) -> Result<(), Self::Error>;

    /// Emit the start pulse followed by `frame`. Fails when the line went low
    /// first (another node won the start race).
    fn start_tx(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Debug pin mirroring reception activity.
    fn signal_read(&mut self, _active: bool) {}

    /// Debug pin mirroring transmission activity.
    fn signal_write(&mut self, _active: bool) {}
}
