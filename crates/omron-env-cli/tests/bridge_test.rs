//! Integration tests for the host bridge.

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use omron_env_cli::{Bridge, BridgeConfig, BridgeError, MessageFormat};
use omron_env_protocol::{LedSettings, ProtocolError};
use serde_json::json;

const LATEST_DATA_FRAME: &str = "524236000121503729075c1d5b00fe4b0f004d1c000090010319670700000000000000000000000000000000000000000000000000000000d632";

fn frame() -> Vec<u8> {
    hex::decode(LATEST_DATA_FRAME).unwrap()
}

fn chart_bridge() -> Bridge {
    let config = BridgeConfig {
        message_format: MessageFormat::Chart,
        ..BridgeConfig::default()
    };
    Bridge::new(&config)
}

#[test]
fn test_standard_message_for_fragmented_frame() {
    let mut bridge = Bridge::new(&BridgeConfig::default());
    let frame = frame();

    assert!(bridge.on_input(&frame[..31]).unwrap().is_empty());
    let messages = bridge.on_input(&frame[31..]).unwrap();
    assert_eq!(messages.len(), 1);

    let payload = &messages[0].payload;
    assert_eq!(messages[0].topic.as_deref(), Some("getLatestSensorData"));
    assert_eq!(payload["status"], "Read OK");
    assert_eq!(payload["statusCode"], 1);
    assert_eq!(payload["address"], 0x5021);
    assert_eq!(payload["data"]["eco2"], 400);
    assert_eq!(payload["data"]["vibrationStatus"], "None");
    let temperature = payload["data"]["temperature"].as_f64().unwrap();
    assert!((temperature - 18.33).abs() < 0.01);
}

#[test]
fn test_chart_messages_one_per_numeric_field() {
    let mut bridge = chart_bridge();
    let timestamp = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
    let messages = bridge.on_input_at(frame(), Instant::now(), timestamp).unwrap();

    let topics: Vec<&str> = messages.iter().filter_map(|m| m.topic.as_deref()).collect();
    assert_eq!(
        topics,
        [
            "temperature",
            "humidity",
            "illuminance",
            "barometricPressure",
            "soundNoise",
            "etvoc",
            "eco2",
            "discomfortIndex",
            "heatStroke",
            "spectralIntensity",
            "seismicIntensity",
        ]
    );

    let eco2 = messages
        .iter()
        .find(|m| m.topic.as_deref() == Some("eco2"))
        .unwrap();
    assert_eq!(eco2.payload, json!(400));
    assert_eq!(eco2.timestamp, "2026-10-18T12:00:00.000Z");
}

#[test]
fn test_chart_skips_string_only_records() {
    let mut payload = vec![0x01, 0x0A, 0x18];
    payload.extend_from_slice(b"2JCIE-BU01MY1234567801.0101.00OMRON");
    let frame = omron_env_protocol::FrameBuilder::new().build_request(&payload).unwrap();

    let mut bridge = chart_bridge();
    assert!(bridge.on_input(frame).unwrap().is_empty());
}

#[test]
fn test_json_buffer_input() {
    let mut bridge = Bridge::new(&BridgeConfig::default());
    let value = json!({ "type": "Buffer", "data": frame() });
    let messages = bridge.on_json_input(&value).unwrap();
    assert_eq!(messages.len(), 1);

    let err = bridge.on_json_input(&json!({ "bytes": [1, 2] })).unwrap_err();
    assert!(matches!(err, BridgeError::Protocol(ProtocolError::InvalidInput(_))));
}

#[test]
fn test_stale_fragment_reported_and_bridge_recovers() {
    let config = BridgeConfig::from_yaml("ttl_ms: 50").unwrap();
    let mut bridge = Bridge::new(&config);
    let frame = frame();
    let t0 = Instant::now();

    assert!(bridge.on_input_at(&frame[..31], t0, Utc::now()).unwrap().is_empty());
    let err = bridge
        .on_input_at(&frame[31..], t0 + Duration::from_millis(50), Utc::now())
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Protocol(ProtocolError::HeaderMismatch { .. })
    ));

    let messages = bridge
        .on_input_at(frame.clone(), t0 + Duration::from_millis(60), Utc::now())
        .unwrap();
    assert_eq!(messages.len(), 1);
}

#[test]
fn test_configured_led_settings_used_for_set_led() {
    let yaml = "led:\n  display_rule: \"ON\"\n  color: \"#0D58C1\"\n";
    let bridge = Bridge::new(&BridgeConfig::from_yaml(yaml).unwrap());

    let frame = bridge.on_command("setLED", None).unwrap();
    assert_eq!(hex::encode(frame), "52420a0002115101000d58c1f856");

    let frame = bridge
        .on_command("setLED", Some(&LedSettings::rule("Temperature")))
        .unwrap();
    assert_eq!(hex::encode(frame), "52420a000211510200000000d7c5");
}

#[test]
fn test_unknown_command_topic() {
    let bridge = Bridge::new(&BridgeConfig::default());
    let err = bridge.on_command("getBattery", None).unwrap_err();
    assert_eq!(err.to_string(), "Unknown command: getBattery");
}
