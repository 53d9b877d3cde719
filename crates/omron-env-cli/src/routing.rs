//! Topic routing between a host message flow and the sensor codec.
//!
//! Outbound, a topic label selects which request frame to build. Inbound,
//! transport chunks are reassembled and each completed response becomes one
//! or more output messages labelled with a topic.

use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use omron_env_protocol::{
    Chunk, FrameBuilder, FrameParser, LedSettings, ParseOutcome, ProtocolResult, Response, Topic,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::error::BridgeResult;

/// How a decoded response is turned into output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// One message carrying the whole response.
    #[default]
    Standard,
    /// One message per numeric data field, for charting.
    Chart,
}

/// A message handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMessage {
    /// Topic label; a data field name in chart format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub payload: Value,
    /// RFC 3339 time the frame was completed.
    pub timestamp: String,
}

/// Build the request frame for a topic label.
pub fn route_command(
    builder: &FrameBuilder,
    topic: &str,
    led: &LedSettings,
) -> ProtocolResult<Vec<u8>> {
    let frame = match topic.parse::<Topic>()? {
        Topic::GetLatestSensorData => builder.build_read_latest_data_long_request(),
        Topic::GetMountingOrientation => builder.build_read_mounting_orientation_request(),
        Topic::GetDeviceInformation => builder.build_read_device_information_request(),
        Topic::SetLed => builder.build_write_led_settings_request(led),
    };
    Ok(frame)
}

/// Turn a decoded response into output messages.
pub fn format_response(
    response: &Response,
    timestamp: DateTime<Utc>,
    format: MessageFormat,
) -> BridgeResult<Vec<OutputMessage>> {
    let timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);

    match format {
        MessageFormat::Standard => {
            let mut payload = serde_json::to_value(response)?;
            if let Value::Object(map) = &mut payload {
                map.insert("finished".to_string(), Value::Bool(true));
                map.insert("timestamp".to_string(), Value::String(timestamp.clone()));
            }
            Ok(vec![OutputMessage {
                topic: response.topic().map(|t| t.label().to_string()),
                payload,
                timestamp,
            }])
        }
        MessageFormat::Chart => {
            let data = match &response.data {
                Some(data) => serde_json::to_value(data)?,
                None => return Ok(Vec::new()),
            };
            let Value::Object(fields) = data else {
                return Ok(Vec::new());
            };
            Ok(fields
                .into_iter()
                .filter(|(name, value)| name != "id" && value.is_number())
                .map(|(name, value)| OutputMessage {
                    topic: Some(name),
                    payload: value,
                    timestamp: timestamp.clone(),
                })
                .collect())
        }
    }
}

/// Host side endpoint for one sensor link.
#[derive(Debug)]
pub struct Bridge {
    builder: FrameBuilder,
    parser: FrameParser,
    format: MessageFormat,
    led: LedSettings,
}

impl Bridge {
    /// Create a bridge from its configuration.
    pub fn new(config: &BridgeConfig) -> Self {
        Bridge {
            builder: FrameBuilder::new(),
            parser: FrameParser::new(config.ttl_ms.map(Duration::from_millis)),
            format: config.message_format,
            led: LedSettings::from(&config.led),
        }
    }

    /// Output format in use.
    pub fn format(&self) -> MessageFormat {
        self.format
    }

    /// Build the request for a topic. `led` overrides the configured LED settings.
    pub fn on_command(&self, topic: &str, led: Option<&LedSettings>) -> ProtocolResult<Vec<u8>> {
        let frame = route_command(&self.builder, topic, led.unwrap_or(&self.led))?;
        debug!("built {} request ({} bytes)", topic, frame.len());
        Ok(frame)
    }

    /// Feed a chunk received from the transport.
    pub fn on_input(&mut self, chunk: impl Into<Chunk>) -> BridgeResult<Vec<OutputMessage>> {
        self.on_input_at(chunk, Instant::now(), Utc::now())
    }

    /// Feed a chunk in JSON form (byte array or `Buffer` object).
    pub fn on_json_input(&mut self, value: &Value) -> BridgeResult<Vec<OutputMessage>> {
        let chunk = Chunk::try_from(value)?;
        self.on_input(chunk)
    }

    /// Feed a chunk with explicit clocks.
    pub fn on_input_at(
        &mut self,
        chunk: impl Into<Chunk>,
        now: Instant,
        timestamp: DateTime<Utc>,
    ) -> BridgeResult<Vec<OutputMessage>> {
        match self.parser.parse_response_at(chunk, now)? {
            ParseOutcome::Incomplete => {
                trace!("waiting for more bytes ({} buffered)", self.parser.buffered_len());
                Ok(Vec::new())
            }
            ParseOutcome::Complete(response) => format_response(&response, timestamp, self.format),
        }
    }
}
