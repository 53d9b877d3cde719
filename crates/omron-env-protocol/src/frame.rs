//! Frame encoding/decoding utilities.
//!
//! Every request and response is wrapped in the same frame:
//!
//! ```text
//! +----------+----------+-------------------+----------+
//! | 0x52 0x42| len (LE) | payload[0..len-2] | CRC16 LE |
//! +----------+----------+-------------------+----------+
//! ```
//!
//! `len` counts the payload plus the two CRC bytes, so a complete frame is
//! always `len + 4` bytes long. The CRC covers everything before it.

use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, trace};
use serde_json::Value;

use crate::commands::{Command, LedSettings};
use crate::constants::*;
use crate::crc::{crc16, Crc16};
use crate::error::*;
use crate::input::Chunk;
use crate::responses::{decode_payload, Response};

// ============================================================================
// Builder
// ============================================================================

/// Stateless request frame builder.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameBuilder;

impl FrameBuilder {
    /// Create a new frame builder.
    pub fn new() -> Self {
        FrameBuilder
    }

    /// Wrap a payload in a frame.
    ///
    /// The payload is not validated; whatever bytes are given are framed.
    /// Payloads longer than [`MAX_PAYLOAD_SIZE`] do not fit the 16 bit length
    /// field and are rejected.
    pub fn build_request(&self, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
        let declared = u16::try_from(payload.len() + CRC_SIZE).map_err(|_| {
            ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: payload.len(),
            }
        })?;
        Ok(encode(declared, payload))
    }

    /// Frame any command.
    pub fn build_command(&self, command: &Command) -> Vec<u8> {
        let payload = command.payload();
        // Command payloads are at most eight bytes.
        encode((payload.len() + CRC_SIZE) as u16, &payload)
    }

    /// Request the latest sensing data (long form).
    pub fn build_read_latest_data_long_request(&self) -> Vec<u8> {
        self.build_command(&Command::ReadLatestDataLong)
    }

    /// Request the mounting orientation.
    pub fn build_read_mounting_orientation_request(&self) -> Vec<u8> {
        self.build_command(&Command::ReadMountingOrientation)
    }

    /// Request the device information.
    pub fn build_read_device_information_request(&self) -> Vec<u8> {
        self.build_command(&Command::ReadDeviceInformation)
    }

    /// Write the LED display rule (and color, for the `ON` rule).
    pub fn build_write_led_settings_request(&self, settings: &LedSettings) -> Vec<u8> {
        self.build_command(&Command::write_led_settings(settings))
    }
}

fn encode(declared: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MIN_FRAME_SIZE + payload.len());
    buf.put_u16_le(HEADER);
    buf.put_u16_le(declared);
    buf.extend_from_slice(payload);

    let mut crc = Crc16::new();
    crc.update(&buf);
    buf.put_u16_le(crc.finish());
    buf
}

/// Validate a complete frame and return its payload.
///
/// Checks the header and the trailing CRC16. The caller is responsible for
/// handing over exactly one frame.
pub fn decode_frame(frame: &[u8]) -> ProtocolResult<&[u8]> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(ProtocolError::FrameTooShort {
            expected: MIN_FRAME_SIZE,
            actual: frame.len(),
        });
    }

    let header = u16::from_le_bytes([frame[0], frame[1]]);
    if header != HEADER {
        return Err(ProtocolError::HeaderMismatch { found: header });
    }

    let crc_index = frame.len() - CRC_SIZE;
    let actual = u16::from_le_bytes([frame[crc_index], frame[crc_index + 1]]);
    let expected = crc16(&frame[..crc_index]);
    if expected != actual {
        return Err(ProtocolError::ChecksumMismatch { expected, actual });
    }

    Ok(&frame[PAYLOAD_OFFSET..crc_index])
}

// ============================================================================
// Parser
// ============================================================================

/// Result of feeding a chunk to a [`FrameParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// More bytes are needed to complete the frame.
    Incomplete,
    /// A frame was completed, validated and decoded.
    Complete(Response),
}

impl ParseOutcome {
    /// Whether a frame was completed.
    pub fn is_finished(&self) -> bool {
        matches!(self, ParseOutcome::Complete(_))
    }

    /// The decoded response, if finished.
    pub fn into_response(self) -> Option<Response> {
        match self {
            ParseOutcome::Complete(response) => Some(response),
            ParseOutcome::Incomplete => None,
        }
    }
}

/// Reassembly state.
#[derive(Debug, Default)]
enum State {
    /// No frame in progress.
    #[default]
    Idle,
    /// Fewer than four bytes of a frame have arrived; header and length
    /// are not known yet.
    Header {
        /// Bytes received so far.
        head: BytesMut,
        /// When the last chunk was accepted.
        last_buffered: Instant,
    },
    /// A frame has started; waiting for the rest of its bytes.
    Buffering {
        /// Chunks received so far, in arrival order.
        chunks: Vec<Bytes>,
        /// Total frame length implied by the length field.
        expected_len: usize,
        /// Sum of the chunk lengths.
        buffered: usize,
        /// When the last chunk was accepted.
        last_buffered: Instant,
    },
}

/// Reassembles response frames from transport chunks.
///
/// One parser serves one physical link. Chunks must be fed in arrival order
/// from a single caller; the parser assumes at most one partial frame.
#[derive(Debug, Default)]
pub struct FrameParser {
    state: State,
    /// Maximum gap between chunks of one frame. `None` never expires.
    ttl: Option<Duration>,
}

impl FrameParser {
    /// Create a parser. A zero or absent `ttl` disables staleness recovery.
    pub fn new(ttl: Option<Duration>) -> Self {
        FrameParser {
            state: State::Idle,
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
        }
    }

    /// Create a parser that discards partial frames older than `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(Some(ttl))
    }

    /// The staleness timeout.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Whether a partial frame is held.
    pub fn is_buffering(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Number of bytes held for the current partial frame.
    pub fn buffered_len(&self) -> usize {
        match &self.state {
            State::Header { head, .. } => head.len(),
            State::Buffering { buffered, .. } => *buffered,
            State::Idle => 0,
        }
    }

    /// Expected length of the frame in progress, 0 until the length field
    /// has arrived.
    pub fn expected_len(&self) -> usize {
        match &self.state {
            State::Buffering { expected_len, .. } => *expected_len,
            State::Idle | State::Header { .. } => 0,
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Feed a chunk received now.
    pub fn parse_response(&mut self, chunk: impl Into<Chunk>) -> ProtocolResult<ParseOutcome> {
        self.parse_response_at(chunk, Instant::now())
    }

    /// Feed a chunk given in its JSON form (byte array or `Buffer` object).
    pub fn parse_json_response(&mut self, value: &Value) -> ProtocolResult<ParseOutcome> {
        let chunk = Chunk::try_from(value)?;
        self.parse_response(chunk)
    }

    /// Feed a chunk received at `now`.
    pub fn parse_response_at(
        &mut self,
        chunk: impl Into<Chunk>,
        now: Instant,
    ) -> ProtocolResult<ParseOutcome> {
        let chunk = chunk.into();
        self.expire_stale(now);

        // A failed frame start leaves the parser idle.
        self.state = match std::mem::take(&mut self.state) {
            State::Idle => Self::start_frame(chunk.into_bytes(), now)?,
            State::Header { mut head, .. } => {
                head.extend_from_slice(&chunk);
                Self::start_frame(head.freeze(), now)?
            }
            State::Buffering {
                mut chunks,
                expected_len,
                buffered,
                ..
            } => {
                let buffered = buffered + chunk.len();
                chunks.push(chunk.into_bytes());
                trace!("buffered continuation chunk, {} bytes held", buffered);
                State::Buffering {
                    chunks,
                    expected_len,
                    buffered,
                    last_buffered: now,
                }
            }
        };

        self.try_complete()
    }

    fn expire_stale(&mut self, now: Instant) {
        let Some(ttl) = self.ttl else {
            return;
        };
        let last_buffered = match &self.state {
            State::Idle => return,
            State::Header { last_buffered, .. } | State::Buffering { last_buffered, .. } => {
                *last_buffered
            }
        };
        if now.saturating_duration_since(last_buffered) >= ttl {
            debug!("discarding stale partial frame ({} bytes)", self.buffered_len());
            self.reset();
        }
    }

    fn start_frame(head: Bytes, now: Instant) -> ProtocolResult<State> {
        if head.is_empty() {
            return Ok(State::Idle);
        }
        if head.len() < LENGTH_OVERHEAD {
            trace!("holding {} bytes until the length field arrives", head.len());
            return Ok(State::Header {
                head: BytesMut::from(&head[..]),
                last_buffered: now,
            });
        }

        let header = u16::from_le_bytes([head[0], head[1]]);
        if header != HEADER {
            return Err(ProtocolError::HeaderMismatch { found: header });
        }

        let declared = u16::from_le_bytes([head[2], head[3]]) as usize;
        let expected_len = declared + LENGTH_OVERHEAD;
        debug!("frame start, expecting {} bytes", expected_len);

        Ok(State::Buffering {
            buffered: head.len(),
            chunks: vec![head],
            expected_len,
            last_buffered: now,
        })
    }

    fn try_complete(&mut self) -> ProtocolResult<ParseOutcome> {
        let (expected_len, buffered) = match &self.state {
            State::Buffering {
                expected_len,
                buffered,
                ..
            } => (*expected_len, *buffered),
            State::Idle | State::Header { .. } => return Ok(ParseOutcome::Incomplete),
        };

        if buffered < expected_len {
            return Ok(ParseOutcome::Incomplete);
        }

        // The frame is discharged either way; the parser is idle from here on.
        let chunks = match std::mem::take(&mut self.state) {
            State::Buffering { chunks, .. } => chunks,
            State::Idle | State::Header { .. } => Vec::new(),
        };

        if buffered > expected_len {
            return Err(ProtocolError::FrameOverrun {
                expected: expected_len,
                actual: buffered,
            });
        }

        let mut frame = BytesMut::with_capacity(expected_len);
        for chunk in &chunks {
            frame.extend_from_slice(chunk);
        }

        let payload = decode_frame(&frame)?;
        let response = decode_payload(payload)?;
        debug!(
            "frame complete: status 0x{:02x}, address 0x{:04x}",
            response.status_code, response.address
        );
        Ok(ParseOutcome::Complete(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    const LATEST_DATA_FRAME: &str = "524236000121503729075c1d5b00fe4b0f004d1c000090010319670700000000000000000000000000000000000000000000000000000000d632";

    fn frame_bytes(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str).expect("valid hex")
    }

    fn sensor_data(outcome: ParseOutcome) -> SensorData {
        match outcome.into_response().and_then(|r| r.data) {
            Some(crate::responses::ResponseData::LatestDataLong(data)) => data,
            other => panic!("expected sensor data, got {:?}", other),
        }
    }

    #[test]
    fn test_build_read_requests() {
        let builder = FrameBuilder::new();
        assert_eq!(hex::encode(builder.build_read_latest_data_long_request()), "52420500012150e24b");
        assert_eq!(hex::encode(builder.build_read_mounting_orientation_request()), "52420500010254fab8");
        assert_eq!(hex::encode(builder.build_read_device_information_request()), "52420500010a18fc8d");
    }

    #[test]
    fn test_build_led_requests() {
        let builder = FrameBuilder::new();
        assert_eq!(
            hex::encode(builder.build_write_led_settings_request(&LedSettings::rule("Temperature"))),
            "52420a000211510200000000d7c5"
        );
        assert_eq!(
            hex::encode(builder.build_write_led_settings_request(&LedSettings::on("#0D58C1"))),
            "52420a0002115101000d58c1f856"
        );
    }

    #[test]
    fn test_build_unknown_rule_is_off() {
        let builder = FrameBuilder::new();
        let frame = builder.build_write_led_settings_request(&LedSettings::rule("Rainbow"));
        assert_eq!(&frame[4..12], &[0x02, 0x11, 0x51, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert!(decode_frame(&frame).is_ok());
    }

    #[test]
    fn test_build_empty_payload() {
        let frame = FrameBuilder::new().build_request(&[]).unwrap();
        assert_eq!(frame.len(), MIN_FRAME_SIZE);
        assert_eq!(&frame[..4], &[0x52, 0x42, 0x02, 0x00]);
        assert_eq!(decode_frame(&frame).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_parse_read_error() {
        let mut parser = FrameParser::default();
        let outcome = parser.parse_response(frame_bytes("5242060081215001237A")).unwrap();
        let response = outcome.into_response().expect("finished");
        assert_eq!(response.status, ResponseStatus::ReadError);
        assert_eq!(response.status_code, 0x81);
        assert_eq!(response.address, 0x5021);
        assert_eq!(response.error, Some(DeviceErrorCode::CrcError));
        assert_eq!(response.error_code, Some(0x01));
        assert!(!parser.is_buffering());
    }

    #[test]
    fn test_parse_write_error() {
        let mut parser = FrameParser::default();
        let response = parser
            .parse_response(frame_bytes("5242060082215001233E"))
            .unwrap()
            .into_response()
            .unwrap();
        assert_eq!(response.status.as_str(), "Write Error");
        assert_eq!(response.status_code, 0x82);
        assert_eq!(response.error.map(|e| e.as_str()), Some("CRC Error"));
    }

    #[test]
    fn test_parse_latest_data_long() {
        let mut parser = FrameParser::default();
        let outcome = parser.parse_response(frame_bytes(LATEST_DATA_FRAME)).unwrap();
        assert!(outcome.is_finished());
        let data = sensor_data(outcome);
        assert!((data.temperature - 18.33).abs() < 0.01);
        assert_eq!(data.eco2, 400);
        assert_eq!(data.id, 0x37);
        assert_eq!(data.barometric_pressure, 1002.494);
    }

    #[test]
    fn test_parse_fragmented_latest_data_long() {
        let frame = frame_bytes(LATEST_DATA_FRAME);
        let mut parser = FrameParser::default();

        let first = parser.parse_response(&frame[..31]).unwrap();
        assert_eq!(first, ParseOutcome::Incomplete);
        assert!(parser.is_buffering());
        assert_eq!(parser.buffered_len(), 31);
        assert_eq!(parser.expected_len(), frame.len());

        let second = parser.parse_response(&frame[31..]).unwrap();
        assert!(second.is_finished());
        assert!(!parser.is_buffering());

        let whole = FrameParser::default().parse_response(frame.clone()).unwrap();
        assert_eq!(second, whole);
    }

    #[test]
    fn test_parse_byte_at_a_time() {
        let frame = frame_bytes("5242060081215001237A");
        let mut parser = FrameParser::default();
        for &byte in &frame[..frame.len() - 1] {
            assert_eq!(parser.parse_response([byte]).unwrap(), ParseOutcome::Incomplete);
        }
        assert!(parser.parse_response([frame[frame.len() - 1]]).unwrap().is_finished());
    }

    #[test]
    fn test_header_mismatch_stays_idle() {
        let mut parser = FrameParser::default();
        let err = parser.parse_response(vec![0x42, 0x52, 0x06, 0x00]).unwrap_err();
        assert_eq!(err, ProtocolError::HeaderMismatch { found: 0x5242 });
        assert!(err.is_format());
        assert!(!parser.is_buffering());
    }

    #[test]
    fn test_build_request_rejects_oversized_payload() {
        let builder = FrameBuilder::new();
        let frame = builder.build_request(&vec![0u8; MAX_PAYLOAD_SIZE]).unwrap();
        assert_eq!(&frame[2..4], &[0xff, 0xff]);
        assert_eq!(frame.len(), MAX_PAYLOAD_SIZE + MIN_FRAME_SIZE);

        let err = builder.build_request(&vec![0u8; MAX_PAYLOAD_SIZE + 1]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: MAX_PAYLOAD_SIZE + 1,
            }
        );
    }

    #[test]
    fn test_short_first_chunk_is_held() {
        let frame = frame_bytes("5242060081215001237A");
        let mut parser = FrameParser::default();

        assert_eq!(parser.parse_response(&frame[..3]).unwrap(), ParseOutcome::Incomplete);
        assert!(parser.is_buffering());
        assert_eq!(parser.buffered_len(), 3);
        assert_eq!(parser.expected_len(), 0);

        assert_eq!(parser.parse_response(&frame[3..5]).unwrap(), ParseOutcome::Incomplete);
        assert_eq!(parser.expected_len(), frame.len());
        assert!(parser.parse_response(&frame[5..]).unwrap().is_finished());
    }

    #[test]
    fn test_header_mismatch_across_short_chunks() {
        let mut parser = FrameParser::default();
        assert_eq!(parser.parse_response(vec![0x42]).unwrap(), ParseOutcome::Incomplete);
        let err = parser.parse_response(vec![0x52, 0x06, 0x00]).unwrap_err();
        assert_eq!(err, ProtocolError::HeaderMismatch { found: 0x5242 });
        assert!(!parser.is_buffering());
    }

    #[test]
    fn test_empty_chunk_when_idle() {
        let mut parser = FrameParser::default();
        assert_eq!(parser.parse_response(Vec::new()).unwrap(), ParseOutcome::Incomplete);
        assert!(!parser.is_buffering());
    }

    #[test]
    fn test_stale_short_head_is_discarded() {
        let frame = frame_bytes("5242060081215001237A");
        let ttl = Duration::from_millis(100);
        let mut parser = FrameParser::with_ttl(ttl);
        let t0 = Instant::now();

        parser.parse_response_at(&frame[..2], t0).unwrap();
        let outcome = parser.parse_response_at(frame.clone(), t0 + ttl).unwrap();
        assert!(outcome.is_finished());
    }

    #[test]
    fn test_checksum_mismatch_resets_state() {
        let mut frame = frame_bytes(LATEST_DATA_FRAME);
        let last = frame.len() - 1;
        frame[last] ^= 0xff;

        let mut parser = FrameParser::default();
        let err = parser.parse_response(frame).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ChecksumMismatch {
                expected: 0x32d6,
                actual: 0xcdd6,
            }
        );
        assert!(!parser.is_buffering());

        // The parser is immediately usable for the next frame.
        let ok = parser.parse_response(frame_bytes(LATEST_DATA_FRAME)).unwrap();
        assert!(ok.is_finished());
    }

    #[test]
    fn test_unsupported_address_does_not_poison_parser() {
        let frame = FrameBuilder::new().build_request(&[0x01, 0x34, 0x12, 0x00]).unwrap();
        let mut parser = FrameParser::default();
        let err = parser.parse_response(frame).unwrap_err();
        assert!(err.is_illegal_data());
        assert!(!parser.is_buffering());
        assert!(parser
            .parse_response(frame_bytes("5242060081215001237A"))
            .unwrap()
            .is_finished());
    }

    #[test]
    fn test_overrun_is_an_error() {
        let mut frame = frame_bytes("5242060081215001237A");
        frame.extend_from_slice(&[0x52, 0x42]);

        let mut parser = FrameParser::default();
        let err = parser.parse_response(frame).unwrap_err();
        assert_eq!(err, ProtocolError::FrameOverrun { expected: 10, actual: 12 });
        assert!(!parser.is_buffering());
    }

    #[test]
    fn test_overrun_across_chunks() {
        let frame = frame_bytes("5242060081215001237A");
        let mut parser = FrameParser::default();
        assert_eq!(parser.parse_response(&frame[..6]).unwrap(), ParseOutcome::Incomplete);
        let err = parser.parse_response(vec![0u8; 8]).unwrap_err();
        assert_eq!(err, ProtocolError::FrameOverrun { expected: 10, actual: 14 });
        assert!(!parser.is_buffering());
    }

    #[test]
    fn test_declared_length_below_crc_size() {
        let mut parser = FrameParser::default();
        let err = parser.parse_response(vec![0x52, 0x42, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FrameTooShort {
                expected: MIN_FRAME_SIZE,
                actual: 4
            }
        );
    }

    #[test]
    fn test_stale_partial_frame_is_discarded() {
        let frame = frame_bytes(LATEST_DATA_FRAME);
        let ttl = Duration::from_millis(100);
        let mut parser = FrameParser::with_ttl(ttl);
        let t0 = Instant::now();

        assert_eq!(parser.parse_response_at(&frame[..20], t0).unwrap(), ParseOutcome::Incomplete);

        // The continuation arrives too late and is treated as a frame start.
        let err = parser.parse_response_at(&frame[20..], t0 + ttl).unwrap_err();
        assert!(matches!(err, ProtocolError::HeaderMismatch { .. }));
        assert!(!parser.is_buffering());

        let outcome = parser.parse_response_at(frame.clone(), t0 + ttl * 2).unwrap();
        assert!(outcome.is_finished());
    }

    #[test]
    fn test_stale_partial_frame_replaced_by_new_frame() {
        let frame = frame_bytes("5242060081215001237A");
        let ttl = Duration::from_millis(100);
        let mut parser = FrameParser::with_ttl(ttl);
        let t0 = Instant::now();

        parser.parse_response_at(&frame[..5], t0).unwrap();
        let outcome = parser
            .parse_response_at(frame.clone(), t0 + Duration::from_millis(150))
            .unwrap();
        assert!(outcome.is_finished());
    }

    #[test]
    fn test_chunks_within_ttl_are_joined() {
        let frame = frame_bytes(LATEST_DATA_FRAME);
        let ttl = Duration::from_millis(100);
        let mut parser = FrameParser::with_ttl(ttl);
        let t0 = Instant::now();

        parser.parse_response_at(&frame[..10], t0).unwrap();
        parser.parse_response_at(&frame[10..30], t0 + Duration::from_millis(90)).unwrap();
        // The gap is measured from the last accepted chunk, not the frame start.
        let outcome = parser
            .parse_response_at(&frame[30..], t0 + Duration::from_millis(180))
            .unwrap();
        assert!(outcome.is_finished());
    }

    #[test]
    fn test_without_ttl_partial_frames_never_expire() {
        let frame = frame_bytes(LATEST_DATA_FRAME);
        let mut parser = FrameParser::new(Some(Duration::ZERO));
        assert_eq!(parser.ttl(), None);
        let t0 = Instant::now();

        parser.parse_response_at(&frame[..10], t0).unwrap();
        let outcome = parser
            .parse_response_at(&frame[10..], t0 + Duration::from_secs(3600))
            .unwrap();
        assert!(outcome.is_finished());
    }

    #[test]
    fn test_parse_json_buffer_form() {
        let bytes = frame_bytes("5242060081215001237A");
        let value = serde_json::json!({ "type": "Buffer", "data": bytes });
        let mut parser = FrameParser::default();
        assert!(parser.parse_json_response(&value).unwrap().is_finished());

        let err = parser.parse_json_response(&serde_json::json!("5242")).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidInput(_)));
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let frame = frame_bytes(LATEST_DATA_FRAME);
        let mut parser = FrameParser::default();
        parser.parse_response(&frame[..10]).unwrap();
        parser.reset();
        assert_eq!(parser.expected_len(), 0);
        assert_eq!(parser.buffered_len(), 0);
        assert!(parser.parse_response(frame).unwrap().is_finished());
    }
}
