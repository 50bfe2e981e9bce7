//! CRC-16/CCITT-FALSE as carried in every frame header
//! (polynomial 0x1021, initial value 0xFFFF, no reflection, no final xor).

/// Fold one byte into a running CRC.
#[inline]
pub const fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut x = ((crc >> 8) as u8) ^ byte;
    x ^= x >> 4;
    (crc << 8) ^ ((x as u16) << 12) ^ ((x as u16) << 5) ^ (x as u16)
}

/// CRC of a whole byte slice.
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0xFFFF, |crc, b| crc16_update(crc, *b))
}
