//! Abstraction traits used by the physical layer (UART, link layer and timer).
pub mod link;
pub mod phy_timer;
pub mod uart;
