//! Single receive buffer, lent to the UART only while a reception is active.
use crate::core::Frame;

/// Arena of exactly one frame with an exclusive lease.
pub(crate) struct RxSlot {
    frame: Frame,
    leased: bool,
}

impl RxSlot {
    pub(crate) const fn new() -> Self {
        Self {
            frame: Frame::new(),
            leased: false,
        }
    }

    /// Take the lease and wipe the buffer for a new reception.
    ///
    /// # Panics
    /// A second lease while the first is held means two receptions overlap.
    pub(crate) fn acquire(&mut self) -> &mut Frame {
        if self.leased {
            panic!("receive buffer leased twice");
        }
        self.leased = true;
        self.frame.clear();
        &mut self.frame
    }

    /// Drop the lease. Returns whether it was held.
    pub(crate) fn release(&mut self) -> bool {
        core::mem::replace(&mut self.leased, false)
    }

    pub(crate) fn leased_mut(&mut self) -> Option<&mut Frame> {
        self.leased.then_some(&mut self.frame)
    }

    pub(crate) fn frame(&self) -> &Frame {
        &self.frame
    }
}
