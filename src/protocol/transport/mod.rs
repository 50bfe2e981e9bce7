//! Bus transport seams: UART/link/timer traits, the single-slot timer, and the
//! timing policy (backoff and timeouts) that the state machine applies.
//!
//! ## Bus Timing Constants
//!
//! All values are microseconds. They describe a 1 Mbaud line where one byte
//! (start + 8 data + stop bits) takes 10 us on the wire.

pub mod config;
pub mod timer_slot;
pub mod traits;

/// Target delay between the bus becoming idle and our start-of-frame pulse (us).
///
/// Every node waits roughly this long after the previous frame before it
/// transmits. The randomization around it ([`TX_JITTER_US`]) is what keeps two
/// nodes that became ready on the same edge from colliding forever.
pub const TX_TARGET_DELAY_US: u32 = 150;

/// Width of the random window centred on [`TX_TARGET_DELAY_US`] (us).
///
/// With the defaults the backoff lands in `[86, 214)` before the write
/// overhead correction.
pub const TX_JITTER_US: u32 = 128;

/// Time spent between the flush timer firing and the low pulse actually
/// hitting the line (us).
///
/// Platform dependent: measure the gap on a scope and tune it so the observed
/// pulse lands on the target delay.
pub const TX_WRITE_OVERHEAD_US: u32 = 8;

/// Idle heartbeat period (us).
///
/// Armed whenever nothing is pending and the bus is quiet, so upper layers get
/// a steady cadence to decide about presence announcements.
pub const IDLE_TICK_US: u32 = 10_000;

/// Window after the start-of-frame pulse in which the first header bytes
/// must arrive (us).
///
/// Up to 200 us between the pulse and the first byte, plus 50 us to clock in
/// the first four bytes.
pub const RX_HEADER_WINDOW_US: u32 = 250;

/// Per-byte budget when bounding the rest of a reception (us).
pub const RX_BYTE_TIME_US: u32 = 12;

/// Fixed slack added to the per-byte budget (us).
pub const RX_FRAME_OVERHEAD_US: u32 = 60;
