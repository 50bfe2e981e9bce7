//! Error definitions shared across library modules.
//! Reception failures never leave the interrupt entry points: they are mapped
//! to diagnostics counters. These types describe *why* a frame was refused so
//! the mapping (and the tests) can be precise.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Reasons a completed reception is refused before reaching the link layer.
pub enum FrameError {
    /// The UART reported a framing/overrun/break error.
    #[error("UART reception error")]
    Uart,
    /// Fewer bytes were received than the frame header declares.
    #[error("Short frame -> received: {received}, declared: {declared}")]
    ShortFrame { received: usize, declared: usize },
    /// Computed CRC differs from the one embedded in the frame.
    #[error("CRC mismatch -> computed: {computed:#06x}, embedded: {embedded:#06x}")]
    CrcMismatch { computed: u16, embedded: u16 },
    /// Declared frame length exceeds payload plus full header.
    #[error("Declared frame length {declared} exceeds the maximum")]
    Oversize { declared: usize },
    /// Inner service payload exceeds the serial payload bound.
    #[error("Service payload size {service_size} exceeds the maximum")]
    ServiceOversize { service_size: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while building an outgoing frame.
pub enum FrameBuildError {
    /// Service payload does not fit a single packet.
    #[error("Service payload too large -> asked: {asked}, max: {max}")]
    PayloadTooLarge { asked: usize, max: usize },
    /// Not enough room left in the frame for another packet.
    #[error("Frame full -> needed: {needed}, available: {available}")]
    FrameFull { needed: usize, available: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Rejected physical layer configurations.
pub enum ConfigError {
    /// The shortest backoff delay would go below zero once the write overhead is removed.
    #[error("Backoff underflow -> lowest target: {lowest_us}us, overhead: {overhead_us}us")]
    BackoffUnderflow { lowest_us: u32, overhead_us: u32 },
    /// The upper edge of the backoff window does not fit in 32 bits.
    #[error("Backoff overflow -> target: {target_us}us, jitter: {jitter_us}us")]
    BackoffOverflow { target_us: u32, jitter_us: u32 },
    /// Idle tick interval must be strictly positive.
    #[error("Idle tick interval is zero")]
    ZeroTickInterval,
    /// Header arrival window must be strictly positive.
    #[error("RX header window is zero")]
    ZeroHeaderWindow,
}
