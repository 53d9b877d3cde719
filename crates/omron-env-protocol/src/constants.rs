//! Protocol constants
//!
//! These constants define the frame layout, command opcodes, register
//! addresses, and status/error codes used by the 2JCIE-BU serial protocol.

// ============================================================================
// Frame Layout
// ============================================================================

/// Frame header value. Written little-endian, so it appears as `52 42` on the wire.
pub const HEADER: u16 = 0x4252;
/// Size of the header field in bytes.
pub const HEADER_SIZE: usize = 2;
/// Size of the length field in bytes.
pub const LENGTH_SIZE: usize = 2;
/// Size of the trailing CRC16 in bytes.
pub const CRC_SIZE: usize = 2;
/// Bytes on the wire not counted by the length field (header + length field).
pub const LENGTH_OVERHEAD: usize = HEADER_SIZE + LENGTH_SIZE;
/// Offset of the payload inside a frame.
pub const PAYLOAD_OFFSET: usize = LENGTH_OVERHEAD;
/// Smallest possible frame: header, length and CRC around an empty payload.
pub const MIN_FRAME_SIZE: usize = LENGTH_OVERHEAD + CRC_SIZE;
/// Largest payload whose length (plus CRC) fits the 16 bit length field.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - CRC_SIZE;

// ============================================================================
// Command Opcodes (host → device)
// ============================================================================

/// Read a register.
pub const OPCODE_READ: u8 = 0x01;
/// Write a register.
pub const OPCODE_WRITE: u8 = 0x02;

// ============================================================================
// Register Addresses
// ============================================================================

/// Latest sensing data, long form.
pub const ADDR_LATEST_DATA_LONG: u16 = 0x5021;
/// LED display rule and color.
pub const ADDR_LED_SETTINGS: u16 = 0x5111;
/// Mounting orientation.
pub const ADDR_MOUNTING_ORIENTATION: u16 = 0x5402;
/// Device information (model, serial, versions, manufacturer).
pub const ADDR_DEVICE_INFORMATION: u16 = 0x180A;

// ============================================================================
// Response Status Codes (device → host)
// ============================================================================

/// Read succeeded.
pub const STATUS_READ_OK: u8 = 0x01;
/// Write succeeded.
pub const STATUS_WRITE_OK: u8 = 0x02;
/// Read failed.
pub const STATUS_READ_ERROR: u8 = 0x81;
/// Write failed.
pub const STATUS_WRITE_ERROR: u8 = 0x82;
/// Bit set in every error status.
pub const STATUS_ERROR_FLAG: u8 = 0x80;

// ============================================================================
// Error Codes (carried by error responses)
// ============================================================================

/// CRC of the request did not match.
pub const ERR_CODE_CRC: u8 = 0x01;
/// Unknown command opcode.
pub const ERR_CODE_COMMAND: u8 = 0x02;
/// Unknown register address.
pub const ERR_CODE_ADDRESS: u8 = 0x03;
/// Length field does not match the command.
pub const ERR_CODE_LENGTH: u8 = 0x04;
/// Written value out of range.
pub const ERR_CODE_DATA: u8 = 0x05;
/// Device busy, retry later.
pub const ERR_CODE_BUSY: u8 = 0x06;

// ============================================================================
// LED Display Rules
// ============================================================================

/// LED always off.
pub const DISPLAY_RULE_OFF: u16 = 0x0000;
/// LED always on in the configured color.
pub const DISPLAY_RULE_ON: u16 = 0x0001;
/// Scales with the temperature value.
pub const DISPLAY_RULE_TEMPERATURE: u16 = 0x0002;
/// Scales with the relative humidity value.
pub const DISPLAY_RULE_HUMIDITY: u16 = 0x0003;
/// Scales with the ambient light value.
pub const DISPLAY_RULE_ILLUMINANCE: u16 = 0x0004;
/// Scales with the barometric pressure value.
pub const DISPLAY_RULE_BAROMETRIC_PRESSURE: u16 = 0x0005;
/// Scales with the sound noise value.
pub const DISPLAY_RULE_SOUND_NOISE: u16 = 0x0006;
/// Scales with the eTVOC value.
pub const DISPLAY_RULE_ETVOC: u16 = 0x0007;
/// Scales with the SI value.
pub const DISPLAY_RULE_VIBRATION: u16 = 0x0008;

// ============================================================================
// Vibration Status
// ============================================================================

/// No vibration.
pub const VIBRATION_NONE: u8 = 0x00;
/// Vibration detected.
pub const VIBRATION_DETECTED: u8 = 0x01;
/// Earthquake detected.
pub const VIBRATION_EARTHQUAKE: u8 = 0x02;

// ============================================================================
// Payload Sizes
// ============================================================================

/// Status (1) + address (2).
pub const PAYLOAD_PREFIX_SIZE: usize = 3;
/// Prefix + error code.
pub const ERROR_PAYLOAD_SIZE: usize = 4;
/// Prefix + sequence number through seismic intensity.
pub const LATEST_DATA_LONG_PAYLOAD_SIZE: usize = 31;
/// Prefix + position.
pub const MOUNTING_ORIENTATION_PAYLOAD_SIZE: usize = 4;
/// Prefix + model(10) + serial(10) + firmware(5) + hardware(5) + manufacturer(5).
pub const DEVICE_INFORMATION_PAYLOAD_SIZE: usize = 38;
/// Opcode (1) + address (2) + display rule (2) + RGB (3).
pub const LED_SETTINGS_PAYLOAD_SIZE: usize = 8;
