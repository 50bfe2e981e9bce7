//! Infrastructure primitives used by the protocol layer.
pub mod crc;
