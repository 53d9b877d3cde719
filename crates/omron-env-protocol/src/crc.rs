//! CRC16 checksum used to protect every frame.
//!
//! Bit-reflected CRC16 with an initial register of `0xFFFF` and feedback
//! constant `0xA001` (the Modbus variant). The checksum covers every byte of
//! a frame before the trailing two CRC bytes.

const CRC16_INIT: u16 = 0xFFFF;
const CRC16_POLY: u16 = 0xA001;

/// Compute the CRC16 of `bytes`.
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(bytes);
    crc.finish()
}

/// Incremental CRC16 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    register: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    /// Create an accumulator in its initial state.
    pub fn new() -> Self {
        Crc16 {
            register: CRC16_INIT,
        }
    }

    /// Feed more bytes into the checksum.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.register ^= byte as u16;
            for _ in 0..8 {
                if self.register & 0x0001 != 0 {
                    self.register = (self.register >> 1) ^ CRC16_POLY;
                } else {
                    self.register >>= 1;
                }
            }
        }
    }

    /// Current checksum value.
    pub fn finish(&self) -> u16 {
        self.register
    }
}
