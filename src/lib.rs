//! `jd-phy` library: interrupt-driven physical layer for a single-wire,
//! half-duplex, multi-drop bus (Jacdac-style) in a `no_std` environment.
//! The crate exposes the frame data contract, the CRC primitive, the
//! collaborator traits (UART, link layer, timer) and the arbitration and
//! framing state machine that ties them together.
#![no_std]
//==================================================================================
/// Frame layout and protocol constants shared by every module.
pub mod core;
/// Frame validation, frame building and configuration errors.
pub mod error;
/// Low-level primitives (CRC).
pub mod infra;
/// Physical layer implementation: transport seams, timing policy, line
/// monitor, receiver and transmit scheduler.
pub mod protocol;
//==================================================================================
