//! Upper layer seen from the physical layer: the outgoing queue owner and the
//! dispatcher of received frames.
use core::borrow::Borrow;

use crate::core::Frame;

/// Contract with the link layer.
pub trait Link {
    /// Handle on an outgoing frame. Ownership stays with the physical layer
    /// from [`next_tx_frame`](Link::next_tx_frame) until it is handed back by
    /// [`tx_frame_sent`](Link::tx_frame_sent).
    type TxFrame: Borrow<Frame>;
    /// Rejection reported by the dispatcher.
    type Error: core::fmt::Debug;

    /// Next frame to transmit, `None` when the queue is empty.
    fn next_tx_frame(&mut self) -> Option<Self::TxFrame>;

    /// Transmission confirmed; the frame returns to its owner.
    fn tx_frame_sent(&mut self, frame: Self::TxFrame);

    /// Deliver a validated frame. An error counts the frame as dropped.
    fn frame_received(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}
