//! Responses from the sensor.
//!
//! A response payload starts with a status byte and the register address it
//! answers. Error statuses carry a single error code; success statuses carry
//! a register specific fixed layout.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::constants::*;
use crate::error::*;
use crate::topic::Topic;
use crate::types::*;

/// A decoded response frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Decoded status.
    pub status: ResponseStatus,
    /// Raw status byte.
    pub status_code: u8,
    /// Register address the response answers.
    pub address: u16,
    /// Error meaning, when the status is an error and the code is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DeviceErrorCode>,
    /// Raw error code, present for every error status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u8>,
    /// Register data, absent for error statuses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl Response {
    /// Whether the device reported an error.
    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    /// Topic label for routing this response, if the address has one.
    pub fn topic(&self) -> Option<Topic> {
        Topic::from_address(self.address)
    }
}

/// Register specific response data.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    LatestDataLong(SensorData),
    MountingOrientation(MountingOrientation),
    DeviceInformation(DeviceInformation),
    /// Success status with no structured payload (e.g. Write OK).
    Empty,
}

impl Serialize for ResponseData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseData::LatestDataLong(data) => data.serialize(serializer),
            ResponseData::MountingOrientation(data) => data.serialize(serializer),
            ResponseData::DeviceInformation(data) => data.serialize(serializer),
            ResponseData::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Decode a checksummed response payload.
pub fn decode_payload(payload: &[u8]) -> ProtocolResult<Response> {
    require_len(payload, PAYLOAD_PREFIX_SIZE)?;

    let status_code = payload[0];
    let status = ResponseStatus::from(status_code);
    let address = read_u16(payload, 1);

    if status.is_error() {
        require_len(payload, ERROR_PAYLOAD_SIZE)?;
        let error_code = payload[3];
        return Ok(Response {
            status,
            status_code,
            address,
            error: DeviceErrorCode::from_code(error_code),
            error_code: Some(error_code),
            data: None,
        });
    }

    let data = match address {
        ADDR_LATEST_DATA_LONG => ResponseData::LatestDataLong(decode_latest_data_long(payload)?),
        ADDR_MOUNTING_ORIENTATION => {
            ResponseData::MountingOrientation(decode_mounting_orientation(payload)?)
        }
        ADDR_DEVICE_INFORMATION => {
            ResponseData::DeviceInformation(decode_device_information(payload)?)
        }
        _ if status == ResponseStatus::ReadOk => {
            return Err(ProtocolError::UnsupportedAddress(address));
        }
        _ => ResponseData::Empty,
    };

    Ok(Response {
        status,
        status_code,
        address,
        error: None,
        error_code: None,
        data: Some(data),
    })
}

// ============================================================================
// Register Decoders
// ============================================================================

fn decode_latest_data_long(payload: &[u8]) -> ProtocolResult<SensorData> {
    require_len(payload, LATEST_DATA_LONG_PAYLOAD_SIZE)?;

    Ok(SensorData {
        id: payload[3],
        temperature: read_i16(payload, 4) as f64 / 100.0,
        humidity: read_i16(payload, 6) as f64 / 100.0,
        illuminance: read_i16(payload, 8),
        barometric_pressure: read_i32(payload, 10) as f64 / 1000.0,
        sound_noise: read_i16(payload, 14) as f64 / 100.0,
        etvoc: read_i16(payload, 16),
        eco2: read_i16(payload, 18),
        discomfort_index: read_i16(payload, 20) as f64 / 100.0,
        heat_stroke: read_i16(payload, 22) as f64 / 100.0,
        vibration_status: VibrationStatus::from(payload[24]),
        spectral_intensity: read_i16(payload, 25) as f64 / 10.0,
        // Bytes 27..29 are reserved.
        seismic_intensity: read_i16(payload, 29) as f64 / 1000.0,
    })
}

fn decode_mounting_orientation(payload: &[u8]) -> ProtocolResult<MountingOrientation> {
    require_len(payload, MOUNTING_ORIENTATION_PAYLOAD_SIZE)?;
    Ok(MountingOrientation {
        position: payload[3],
    })
}

fn decode_device_information(payload: &[u8]) -> ProtocolResult<DeviceInformation> {
    require_len(payload, DEVICE_INFORMATION_PAYLOAD_SIZE)?;

    let text = |range: std::ops::Range<usize>| String::from_utf8_lossy(&payload[range]).to_string();
    Ok(DeviceInformation {
        model: text(3..13),
        serial_number: text(13..23),
        firmware_version: text(23..28),
        hardware_version: text(28..33),
        manufacturer: text(33..38),
    })
}

fn require_len(payload: &[u8], expected: usize) -> ProtocolResult<()> {
    if payload.len() < expected {
        return Err(ProtocolError::FrameTooShort {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}
