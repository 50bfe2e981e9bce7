//! Defines the "data contract" of the bus: the raw frame as it travels on the
//! wire and the constants bounding it.
//!
//! ```text
//! offset  size  field
//! 0       2     crc (LE), covers bytes [2 .. frame_len)
//! 2       1     size: frame_len - FRAME_HEADER_SIZE
//! 3       1     flags
//! 4       8     device identifier (LE)
//! 12      ..    packets: service_size, service_number, service_command (LE u16), payload
//! ```
use crate::error::{FrameBuildError, FrameError};
use crate::infra::crc::crc16;

/// Largest service payload carried by a frame (255 minus the serial header, rounded down to 4).
pub const SERIAL_PAYLOAD_SIZE: usize = 236;
/// Frame header plus the first packet header.
pub const SERIAL_FULL_HEADER_SIZE: usize = 16;
/// Bytes preceding the packet area (crc, size, flags, device identifier).
pub const FRAME_HEADER_SIZE: usize = 12;
/// Packet header bytes (service size, service number, service command).
pub const PACKET_HEADER_SIZE: usize = 4;
/// Bytes available for packets after the frame header.
pub const FRAME_DATA_SIZE: usize = SERIAL_PAYLOAD_SIZE + PACKET_HEADER_SIZE;
/// Size of the raw frame buffer, i.e. the longest reception ever armed.
pub const FRAME_CAPACITY: usize = FRAME_HEADER_SIZE + FRAME_DATA_SIZE;

/// Frame flag: the device identifier is the recipient (command to a peripheral).
pub const FRAME_FLAG_COMMAND: u8 = 0x01;
/// Frame flag: an ACK carrying this frame's CRC is requested.
pub const FRAME_FLAG_ACK_REQUESTED: u8 = 0x02;
/// Frame flag: the device identifier holds a service class.
pub const FRAME_FLAG_IDENTIFIER_IS_SERVICE_CLASS: u8 = 0x04;
/// Frame flag: frame belongs to a future protocol generation and must be ignored.
pub const FRAME_FLAG_VNEXT: u8 = 0x80;

const CRC_OFFSET: usize = 0;
const SIZE_OFFSET: usize = 2;
const FLAGS_OFFSET: usize = 3;
const DEVICE_ID_OFFSET: usize = 4;
const SERVICE_SIZE_OFFSET: usize = 12;
const SERVICE_NUMBER_OFFSET: usize = 13;
const SERVICE_COMMAND_OFFSET: usize = 14;

//==================================================================================FRAME
#[derive(Clone, Copy, PartialEq, Eq)]
/// Raw physical frame. Always `FRAME_CAPACITY` bytes; only the first
/// [`frame_len`](Frame::frame_len) bytes travel on the wire.
pub struct Frame {
    bytes: [u8; FRAME_CAPACITY],
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl ::core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.debug_struct("Frame")
            .field("crc", &self.crc())
            .field("size", &self.size())
            .field("flags", &self.flags())
            .field("device_identifier", &self.device_identifier())
            .finish()
    }
}

impl Frame {
    /// Zeroed frame: size 0, no packets.
    pub const fn new() -> Self {
        Self {
            bytes: [0; FRAME_CAPACITY],
        }
    }

    /// Wipe the whole buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes = [0; FRAME_CAPACITY];
    }

    /// CRC embedded in the header.
    pub fn crc(&self) -> u16 {
        u16::from_le_bytes([self.bytes[CRC_OFFSET], self.bytes[CRC_OFFSET + 1]])
    }

    pub fn set_crc(&mut self, crc: u16) {
        self.bytes[CRC_OFFSET..CRC_OFFSET + 2].copy_from_slice(&crc.to_le_bytes());
    }

    /// Size field: number of packet bytes following the frame header.
    pub fn size(&self) -> u8 {
        self.bytes[SIZE_OFFSET]
    }

    pub fn set_size(&mut self, size: u8) {
        self.bytes[SIZE_OFFSET] = size;
    }

    pub fn flags(&self) -> u8 {
        self.bytes[FLAGS_OFFSET]
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.bytes[FLAGS_OFFSET] = flags;
    }

    /// Whether the next-generation marker is set.
    pub fn is_vnext(&self) -> bool {
        self.flags() & FRAME_FLAG_VNEXT != 0
    }

    pub fn device_identifier(&self) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.bytes[DEVICE_ID_OFFSET..DEVICE_ID_OFFSET + 8]);
        u64::from_le_bytes(raw)
    }

    pub fn set_device_identifier(&mut self, id: u64) {
        self.bytes[DEVICE_ID_OFFSET..DEVICE_ID_OFFSET + 8].copy_from_slice(&id.to_le_bytes());
    }

    /// Payload size of the first packet.
    pub fn service_size(&self) -> u8 {
        self.bytes[SERVICE_SIZE_OFFSET]
    }

    /// Service number of the first packet.
    pub fn service_number(&self) -> u8 {
        self.bytes[SERVICE_NUMBER_OFFSET]
    }

    /// Service command of the first packet.
    pub fn service_command(&self) -> u16 {
        u16::from_le_bytes([
            self.bytes[SERVICE_COMMAND_OFFSET],
            self.bytes[SERVICE_COMMAND_OFFSET + 1],
        ])
    }

    /// Declared frame length on the wire (header included).
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.size() as usize + FRAME_HEADER_SIZE
    }

    /// True once any of the first eight bytes (crc, size, flags, half the
    /// device identifier) has been written by the receiver.
    pub fn has_header(&self) -> bool {
        self.bytes[..8].iter().any(|b| *b != 0)
    }

    /// Whole buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; FRAME_CAPACITY] {
        &self.bytes
    }

    /// Whole buffer, mutable (UART reception target).
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8; FRAME_CAPACITY] {
        &mut self.bytes
    }

    /// Declared span of the frame, clamped to the buffer.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.bytes[..self.frame_len().min(FRAME_CAPACITY)]
    }

    /// CRC over bytes `[2 .. frame_len)`, clamped to the buffer.
    pub fn compute_crc(&self) -> u16 {
        crc16(&self.wire_bytes()[SIZE_OFFSET..])
    }

    /// Store the computed CRC in the header. Call after the last packet is pushed.
    pub fn seal(&mut self) {
        let crc = self.compute_crc();
        self.set_crc(crc);
    }

    /// Append a packet after the existing ones, padding to a 4-byte boundary.
    pub fn push_packet(
        &mut self,
        service_number: u8,
        service_command: u16,
        payload: &[u8],
    ) -> Result<(), FrameBuildError> {
        if payload.len() > SERIAL_PAYLOAD_SIZE {
            return Err(FrameBuildError::PayloadTooLarge {
                asked: payload.len(),
                max: SERIAL_PAYLOAD_SIZE,
            });
        }
        let used = self.size() as usize;
        let needed = (PACKET_HEADER_SIZE + payload.len() + 3) & !3;
        let available = FRAME_DATA_SIZE - used;
        if needed > available {
            return Err(FrameBuildError::FrameFull { needed, available });
        }

        let start = FRAME_HEADER_SIZE + used;
        let packet = &mut self.bytes[start..start + needed];
        packet.fill(0);
        packet[0] = payload.len() as u8;
        packet[1] = service_number;
        packet[2..4].copy_from_slice(&service_command.to_le_bytes());
        packet[PACKET_HEADER_SIZE..PACKET_HEADER_SIZE + payload.len()].copy_from_slice(payload);

        // `needed` <= FRAME_DATA_SIZE (240), so it fits the size byte.
        self.set_size((used + needed) as u8);
        Ok(())
    }

    /// Check a completed reception of `received` bytes: length, CRC, bounds.
    ///
    /// The order matters: a short frame never gets its CRC computed over
    /// stale bytes, and size bounds are only trusted once the CRC matched.
    pub fn validate(&self, received: usize) -> Result<(), FrameError> {
        let declared = self.frame_len();
        if received < declared {
            return Err(FrameError::ShortFrame { received, declared });
        }

        let computed = self.compute_crc();
        if computed != self.crc() {
            return Err(FrameError::CrcMismatch {
                computed,
                embedded: self.crc(),
            });
        }

        if declared > SERIAL_PAYLOAD_SIZE + SERIAL_FULL_HEADER_SIZE {
            return Err(FrameError::Oversize { declared });
        }
        if self.service_size() as usize > SERIAL_PAYLOAD_SIZE {
            return Err(FrameError::ServiceOversize {
                service_size: self.service_size() as usize,
            });
        }
        Ok(())
    }
}
