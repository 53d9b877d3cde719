//! Topic labels used by hosts to route commands and responses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProtocolError;

/// A routable operation on the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "getLatestSensorData")]
    GetLatestSensorData,
    #[serde(rename = "getMountingOrientation")]
    GetMountingOrientation,
    #[serde(rename = "getDeviceInformation")]
    GetDeviceInformation,
    #[serde(rename = "setLED")]
    SetLed,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::GetLatestSensorData,
        Topic::GetMountingOrientation,
        Topic::GetDeviceInformation,
        Topic::SetLed,
    ];

    /// Label carried by host messages.
    pub fn label(&self) -> &'static str {
        match self {
            Topic::GetLatestSensorData => "getLatestSensorData",
            Topic::GetMountingOrientation => "getMountingOrientation",
            Topic::GetDeviceInformation => "getDeviceInformation",
            Topic::SetLed => "setLED",
        }
    }

    /// Register address served by this topic.
    pub fn address(&self) -> u16 {
        match self {
            Topic::GetLatestSensorData => ADDR_LATEST_DATA_LONG,
            Topic::GetMountingOrientation => ADDR_MOUNTING_ORIENTATION,
            Topic::GetDeviceInformation => ADDR_DEVICE_INFORMATION,
            Topic::SetLed => ADDR_LED_SETTINGS,
        }
    }

    /// Topic for a response address. Unknown addresses have none.
    pub fn from_address(address: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.address() == address)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Topic {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.label() == s)
            .ok_or_else(|| ProtocolError::UnknownTopic(s.to_string()))
    }
}
