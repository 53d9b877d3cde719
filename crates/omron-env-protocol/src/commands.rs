//! Commands that can be sent to the sensor.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::*;
use crate::types::*;

/// LED settings as supplied by a host.
///
/// The display rule stays a plain name so that unrecognized rules can fall
/// back to `OFF` instead of failing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedSettings {
    /// Display rule name, e.g. `"ON"` or `"Temperature"`.
    #[serde(default, deserialize_with = "rule_name")]
    pub display_rule: String,
    /// Color, only used when the rule is `"ON"`.
    #[serde(default)]
    pub color: ColorInput,
}

impl LedSettings {
    /// Settings with the given rule and no color.
    pub fn rule(display_rule: impl Into<String>) -> Self {
        LedSettings {
            display_rule: display_rule.into(),
            color: ColorInput::Absent,
        }
    }

    /// Settings that turn the LED on with a color.
    pub fn on(color: impl Into<ColorInput>) -> Self {
        LedSettings {
            display_rule: DisplayRule::On.name().to_string(),
            color: color.into(),
        }
    }
}

/// Accept any JSON value as a rule name; non-strings become the empty name,
/// which resolves to `OFF`.
fn rule_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RuleName {
        Name(String),
        Other(IgnoredAny),
    }

    Ok(match RuleName::deserialize(deserializer)? {
        RuleName::Name(name) => name,
        RuleName::Other(_) => String::new(),
    })
}

/// Commands that can be sent to the sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Read the latest sensing data (long form).
    ReadLatestDataLong,

    /// Read the mounting orientation.
    ReadMountingOrientation,

    /// Read model, serial number and version strings.
    ReadDeviceInformation,

    /// Write the LED display rule.
    WriteLedSettings {
        /// Resolved display rule.
        rule: DisplayRule,
        /// Resolved color. Zeroed unless the rule is [`DisplayRule::On`].
        color: LedColor,
    },
}

impl Command {
    /// Resolve host supplied LED settings into a write command.
    pub fn write_led_settings(settings: &LedSettings) -> Self {
        let rule = DisplayRule::resolve(&settings.display_rule);
        let color = if settings.display_rule == DisplayRule::On.name() {
            LedColor::resolve(&settings.color)
        } else {
            LedColor::default()
        };
        Command::WriteLedSettings { rule, color }
    }

    /// Opcode byte for this command.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::WriteLedSettings { .. } => OPCODE_WRITE,
            _ => OPCODE_READ,
        }
    }

    /// Register address this command targets.
    pub fn address(&self) -> u16 {
        match self {
            Command::ReadLatestDataLong => ADDR_LATEST_DATA_LONG,
            Command::ReadMountingOrientation => ADDR_MOUNTING_ORIENTATION,
            Command::ReadDeviceInformation => ADDR_DEVICE_INFORMATION,
            Command::WriteLedSettings { .. } => ADDR_LED_SETTINGS,
        }
    }

    /// Encode the command payload (without framing).
    pub fn payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(LED_SETTINGS_PAYLOAD_SIZE);
        buf.push(self.opcode());
        buf.extend_from_slice(&self.address().to_le_bytes());

        if let Command::WriteLedSettings { rule, color } = self {
            buf.extend_from_slice(&rule.code().to_le_bytes());
            if *rule == DisplayRule::On {
                buf.extend_from_slice(&color.rgb());
            } else {
                // Color is ignored by the device unless the rule is ON.
                buf.extend_from_slice(&[0, 0, 0]);
            }
        }

        buf
    }
}
