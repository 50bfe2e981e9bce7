//! Shared status register: the only state touched both by interrupt handlers
//! and by normal-context scheduling. Every read-modify-write runs inside a
//! critical section.
use core::cell::Cell;

use bitflags::bitflags;
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

bitflags! {
    /// Bus activity flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        /// A reception is in progress (start pulse seen, not yet completed).
        const RX_ACTIVE = 0x01;
        /// We own the bus and a transmission is being started or clocked out.
        const TX_ACTIVE = 0x02;
        /// The backoff timer is armed for a pending transmission.
        const TX_QUEUED = 0x04;
    }
}

/// Coarse view of the status flags. Reception wins over transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BusState {
    Idle = 0,
    RxActive = 1,
    TxQueued = 2,
    TxActive = 3,
}

/// Register content: activity flags plus the transmit intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusStatus {
    pub flags: Status,
    /// A frame is waiting for arbitration.
    pub tx_pending: bool,
}

impl BusStatus {
    pub fn state(&self) -> BusState {
        if self.flags.contains(Status::RX_ACTIVE) {
            BusState::RxActive
        } else if self.flags.contains(Status::TX_ACTIVE) {
            BusState::TxActive
        } else if self.flags.contains(Status::TX_QUEUED) {
            BusState::TxQueued
        } else {
            BusState::Idle
        }
    }
}

/// Critical-section guarded status register.
///
/// Meant to live in a `static` so upper layers can flag a pending frame from
/// any context, including from inside a receive dispatch callback.
pub struct StatusRegister {
    inner: Mutex<CriticalSectionRawMutex, Cell<BusStatus>>,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(BusStatus {
                flags: Status::empty(),
                tx_pending: false,
            })),
        }
    }

    /// Read-modify-write under a critical section.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut BusStatus) -> R) -> R {
        self.inner.lock(|cell| {
            let mut status = cell.get();
            let result = f(&mut status);
            cell.set(status);
            result
        })
    }

    pub fn snapshot(&self) -> BusStatus {
        self.inner.lock(|cell| cell.get())
    }

    pub fn flags(&self) -> Status {
        self.snapshot().flags
    }

    pub fn state(&self) -> BusState {
        self.snapshot().state()
    }

    /// Any activity flag set.
    pub fn is_busy(&self) -> bool {
        !self.flags().is_empty()
    }

    pub fn tx_pending(&self) -> bool {
        self.snapshot().tx_pending
    }

    /// Record that a frame waits in the queue. Idempotent.
    ///
    /// Returns `true` when the bus was entirely idle, i.e. nobody will
    /// re-evaluate arbitration on their own and the caller should retime.
    pub fn request_tx(&self) -> bool {
        self.update(|status| {
            status.tx_pending = true;
            status.flags.is_empty()
        })
    }
}
