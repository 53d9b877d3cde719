//! Common types used in the protocol.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::constants::*;

// ============================================================================
// Status and Error Codes
// ============================================================================

/// Status byte of a response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    ReadOk,
    WriteOk,
    ReadError,
    WriteError,
    /// Any other status byte.
    Unknown(u8),
}

impl ResponseStatus {
    /// Human readable status text.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::ReadOk => "Read OK",
            ResponseStatus::WriteOk => "Write OK",
            ResponseStatus::ReadError => "Read Error",
            ResponseStatus::WriteError => "Write Error",
            ResponseStatus::Unknown(_) => "Unknown",
        }
    }

    /// Whether the error flag is set in the raw status byte.
    pub fn is_error(&self) -> bool {
        u8::from(*self) & STATUS_ERROR_FLAG != 0
    }
}

impl From<u8> for ResponseStatus {
    fn from(code: u8) -> Self {
        match code {
            STATUS_READ_OK => ResponseStatus::ReadOk,
            STATUS_WRITE_OK => ResponseStatus::WriteOk,
            STATUS_READ_ERROR => ResponseStatus::ReadError,
            STATUS_WRITE_ERROR => ResponseStatus::WriteError,
            _ => ResponseStatus::Unknown(code),
        }
    }
}

impl From<ResponseStatus> for u8 {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::ReadOk => STATUS_READ_OK,
            ResponseStatus::WriteOk => STATUS_WRITE_OK,
            ResponseStatus::ReadError => STATUS_READ_ERROR,
            ResponseStatus::WriteError => STATUS_WRITE_ERROR,
            ResponseStatus::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResponseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error code carried by an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorCode {
    CrcError,
    CommandError,
    AddressError,
    LengthError,
    DataError,
    Busy,
}

impl DeviceErrorCode {
    /// Map a raw error code. Unmapped codes have no meaning.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            ERR_CODE_CRC => Some(DeviceErrorCode::CrcError),
            ERR_CODE_COMMAND => Some(DeviceErrorCode::CommandError),
            ERR_CODE_ADDRESS => Some(DeviceErrorCode::AddressError),
            ERR_CODE_LENGTH => Some(DeviceErrorCode::LengthError),
            ERR_CODE_DATA => Some(DeviceErrorCode::DataError),
            ERR_CODE_BUSY => Some(DeviceErrorCode::Busy),
            _ => None,
        }
    }

    /// Display name, e.g. `"CRC Error"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceErrorCode::CrcError => "CRC Error",
            DeviceErrorCode::CommandError => "Command Error",
            DeviceErrorCode::AddressError => "Address Error",
            DeviceErrorCode::LengthError => "Length Error",
            DeviceErrorCode::DataError => "Data Error",
            DeviceErrorCode::Busy => "Busy",
        }
    }
}

impl fmt::Display for DeviceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// LED Settings
// ============================================================================

/// LED display rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayRule {
    #[default]
    Off,
    /// Always on, using the configured color.
    On,
    Temperature,
    Humidity,
    Illuminance,
    BarometricPressure,
    SoundNoise,
    Etvoc,
    Vibration,
}

impl DisplayRule {
    /// Every display rule, in code order.
    pub const ALL: [DisplayRule; 9] = [
        DisplayRule::Off,
        DisplayRule::On,
        DisplayRule::Temperature,
        DisplayRule::Humidity,
        DisplayRule::Illuminance,
        DisplayRule::BarometricPressure,
        DisplayRule::SoundNoise,
        DisplayRule::Etvoc,
        DisplayRule::Vibration,
    ];

    /// Resolve a rule by name. Unrecognized names fall back to [`DisplayRule::Off`].
    pub fn resolve(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|rule| rule.name() == name)
            .unwrap_or(DisplayRule::Off)
    }

    /// Name used by hosts to select this rule.
    pub fn name(&self) -> &'static str {
        match self {
            DisplayRule::Off => "OFF",
            DisplayRule::On => "ON",
            DisplayRule::Temperature => "Temperature",
            DisplayRule::Humidity => "Humidity",
            DisplayRule::Illuminance => "Illuminance",
            DisplayRule::BarometricPressure => "Barometric Pressure",
            DisplayRule::SoundNoise => "Sound Noise",
            DisplayRule::Etvoc => "eTVOC",
            DisplayRule::Vibration => "Vibration",
        }
    }

    /// 16-bit code written to the LED settings register.
    pub fn code(&self) -> u16 {
        match self {
            DisplayRule::Off => DISPLAY_RULE_OFF,
            DisplayRule::On => DISPLAY_RULE_ON,
            DisplayRule::Temperature => DISPLAY_RULE_TEMPERATURE,
            DisplayRule::Humidity => DISPLAY_RULE_HUMIDITY,
            DisplayRule::Illuminance => DISPLAY_RULE_ILLUMINANCE,
            DisplayRule::BarometricPressure => DISPLAY_RULE_BAROMETRIC_PRESSURE,
            DisplayRule::SoundNoise => DISPLAY_RULE_SOUND_NOISE,
            DisplayRule::Etvoc => DISPLAY_RULE_ETVOC,
            DisplayRule::Vibration => DISPLAY_RULE_VIBRATION,
        }
    }
}

impl fmt::Display for DisplayRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped color value as supplied by a host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    /// Hex text, with or without a leading `#`.
    Text(String),
    /// Numeric RGB value.
    Number(f64),
    /// No color given.
    #[default]
    Absent,
    /// Any other value (boolean, array, object); resolves to black.
    Other(serde_json::Value),
}

impl From<&str> for ColorInput {
    fn from(text: &str) -> Self {
        ColorInput::Text(text.to_string())
    }
}

impl From<String> for ColorInput {
    fn from(text: String) -> Self {
        ColorInput::Text(text)
    }
}

impl From<u32> for ColorInput {
    fn from(value: u32) -> Self {
        ColorInput::Number(value as f64)
    }
}

/// Resolved LED color. Only the low 24 bits reach the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LedColor(pub u32);

impl LedColor {
    /// Resolve a host supplied color. Anything unparseable becomes black.
    pub fn resolve(input: &ColorInput) -> Self {
        match input {
            ColorInput::Text(text) => {
                let digits = text.strip_prefix('#').unwrap_or(text);
                LedColor(parse_hex_prefix(digits).unwrap_or(0) as u32)
            }
            ColorInput::Number(value) if value.is_finite() => LedColor(*value as i64 as u32),
            ColorInput::Number(_) | ColorInput::Absent | ColorInput::Other(_) => LedColor(0),
        }
    }

    /// Red, green and blue bytes.
    pub fn rgb(&self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        ]
    }
}

/// Parse the leading hexadecimal digits of `text`, ignoring anything after
/// them. Leading whitespace, a sign and a `0x` prefix are accepted.
fn parse_hex_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, text) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let mut value: i64 = 0;
    let mut seen = false;
    for c in text.chars() {
        match c.to_digit(16) {
            Some(digit) => {
                value = value.wrapping_mul(16).wrapping_add(digit as i64);
                seen = true;
            }
            None => break,
        }
    }

    match (seen, negative) {
        (false, _) => None,
        (true, true) => Some(value.wrapping_neg()),
        (true, false) => Some(value),
    }
}

// ============================================================================
// Decoded Records
// ============================================================================

/// Vibration state reported with the latest sensing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VibrationStatus {
    None,
    VibrationDetected,
    EarthquakeDetected,
    Unknown(u8),
}

impl VibrationStatus {
    /// Display name, e.g. `"Earthquake Detected"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VibrationStatus::None => "None",
            VibrationStatus::VibrationDetected => "Vibration Detected",
            VibrationStatus::EarthquakeDetected => "Earthquake Detected",
            VibrationStatus::Unknown(_) => "Unknown",
        }
    }
}

impl From<u8> for VibrationStatus {
    fn from(code: u8) -> Self {
        match code {
            VIBRATION_NONE => VibrationStatus::None,
            VIBRATION_DETECTED => VibrationStatus::VibrationDetected,
            VIBRATION_EARTHQUAKE => VibrationStatus::EarthquakeDetected,
            _ => VibrationStatus::Unknown(code),
        }
    }
}

impl fmt::Display for VibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VibrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Latest sensing data (long form, register 0x5021).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    /// Sequence number.
    pub id: u8,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, %.
    pub humidity: f64,
    /// Lux.
    pub illuminance: i16,
    /// hPa.
    pub barometric_pressure: f64,
    /// dB.
    pub sound_noise: f64,
    /// ppb.
    pub etvoc: i16,
    /// ppm.
    pub eco2: i16,
    /// Temperature-humidity index.
    pub discomfort_index: f64,
    /// Degrees Celsius.
    pub heat_stroke: f64,
    /// None, vibration or earthquake.
    pub vibration_status: VibrationStatus,
    /// SI value in kine (cm/s), for small to medium vibration.
    pub spectral_intensity: f64,
    /// Japanese seismic intensity scale, for earthquakes.
    pub seismic_intensity: f64,
}

/// Mounting orientation (register 0x5402).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MountingOrientation {
    /// Raw position code as reported by the device.
    pub position: u8,
}

/// Device information (register 0x180A).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInformation {
    /// Model name, 10 bytes.
    pub model: String,
    /// Serial number, 10 bytes.
    pub serial_number: String,
    /// Firmware revision, 5 bytes.
    pub firmware_version: String,
    /// Hardware revision, 5 bytes.
    pub hardware_version: String,
    /// Manufacturer name, 5 bytes.
    pub manufacturer: String,
}
