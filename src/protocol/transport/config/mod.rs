//! Runtime timing policy of the physical layer.
//!
//! Defaults come from the constants in [`crate::protocol::transport`]; boards
//! with a different UART latency override them through the `with_*` helpers.
use embassy_time::Duration;
use rand::RngCore;

use crate::error::ConfigError;
use crate::protocol::transport::{
    IDLE_TICK_US, RX_BYTE_TIME_US, RX_FRAME_OVERHEAD_US, RX_HEADER_WINDOW_US, TX_JITTER_US,
    TX_TARGET_DELAY_US, TX_WRITE_OVERHEAD_US,
};

//==================================================================================BACKOFF
/// Randomized pre-transmission delay.
///
/// The delay is drawn uniformly in `[target - jitter/2, target + jitter/2)` and
/// then shortened by the write overhead. The randomization is part of bus
/// arbitration: it desynchronizes nodes that would otherwise start together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Centre of the window (us).
    pub target_us: u32,
    /// Width of the window (us). Zero disables randomization.
    pub jitter_us: u32,
    /// Processing time removed from the drawn value (us).
    pub overhead_us: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            target_us: TX_TARGET_DELAY_US,
            jitter_us: TX_JITTER_US,
            overhead_us: TX_WRITE_OVERHEAD_US,
        }
    }
}

impl BackoffPolicy {
    /// Lower bound of the window, before the overhead correction.
    pub const fn lowest_us(&self) -> u32 {
        self.target_us.saturating_sub(self.jitter_us / 2)
    }

    /// Draw the next delay from `rng`.
    pub fn delay<R: RngCore>(&self, rng: &mut R) -> Duration {
        let spread = if self.jitter_us == 0 {
            0
        } else {
            rng.next_u32() % self.jitter_us
        };
        let micros = self
            .lowest_us()
            .saturating_add(spread)
            .saturating_sub(self.overhead_us);
        Duration::from_micros(micros as u64)
    }

    /// Reject policies whose window would start below zero once corrected,
    /// or end beyond `u32::MAX`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_us.checked_add(self.jitter_us / 2).is_none() {
            return Err(ConfigError::BackoffOverflow {
                target_us: self.target_us,
                jitter_us: self.jitter_us,
            });
        }
        let lowest_us = self.lowest_us();
        if self.target_us < self.jitter_us / 2 || lowest_us < self.overhead_us {
            return Err(ConfigError::BackoffUnderflow {
                lowest_us,
                overhead_us: self.overhead_us,
            });
        }
        Ok(())
    }
}

//==================================================================================PHY_CONFIG
/// Timing configuration consumed by [`Physical`](crate::protocol::physical::Physical).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyConfig {
    /// Pre-transmission backoff.
    pub backoff: BackoffPolicy,
    /// Idle heartbeat period.
    pub idle_tick: Duration,
    /// Delay after the start pulse before checking that header bytes arrived.
    pub rx_header_window: Duration,
    /// Per-byte budget for the remainder of a reception (us).
    pub rx_byte_time_us: u32,
    /// Fixed slack added to the per-byte budget (us).
    pub rx_frame_overhead_us: u32,
}

impl Default for PhyConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            idle_tick: Duration::from_micros(IDLE_TICK_US as u64),
            rx_header_window: Duration::from_micros(RX_HEADER_WINDOW_US as u64),
            rx_byte_time_us: RX_BYTE_TIME_US,
            rx_frame_overhead_us: RX_FRAME_OVERHEAD_US,
        }
    }
}

impl PhyConfig {
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_idle_tick(mut self, idle_tick: Duration) -> Self {
        self.idle_tick = idle_tick;
        self
    }

    pub fn with_rx_header_window(mut self, window: Duration) -> Self {
        self.rx_header_window = window;
        self
    }

    /// Override the per-frame reception budget (`len * byte_time + overhead`).
    pub fn with_rx_frame_budget(mut self, byte_time_us: u32, overhead_us: u32) -> Self {
        self.rx_byte_time_us = byte_time_us;
        self.rx_frame_overhead_us = overhead_us;
        self
    }

    /// Upper bound for receiving a frame of `frame_len` bytes.
    pub fn rx_frame_timeout(&self, frame_len: usize) -> Duration {
        let micros = frame_len as u64 * self.rx_byte_time_us as u64 + self.rx_frame_overhead_us as u64;
        Duration::from_micros(micros)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backoff.validate()?;
        if self.idle_tick.as_ticks() == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.rx_header_window.as_ticks() == 0 {
            return Err(ConfigError::ZeroHeaderWindow);
        }
        Ok(())
    }
}
