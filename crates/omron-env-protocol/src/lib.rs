//! Omron 2JCIE-BU Serial Protocol
//!
//! This crate provides types and utilities for talking to the Omron 2JCIE-BU
//! environment sensor over its USB serial or BLE link. The protocol uses
//! framed binary messages protected by a CRC16.
//!
//! # Protocol Overview
//!
//! Every frame has the same layout:
//!
//! - **Header**: `0x4252` (little-endian, `52 42` on the wire)
//! - **Length**: payload length + 2 (little-endian)
//! - **Payload**: opcode/status byte, register address, register data
//! - **CRC16**: over all preceding bytes (little-endian)
//!
//! Requests are built with the stateless [`FrameBuilder`]. Responses may
//! arrive split across several transport reads, so they are fed to a
//! [`FrameParser`] which reassembles, validates and decodes them.
//!
//! # Example
//!
//! ```rust
//! use omron_env_protocol::{FrameBuilder, FrameParser, ParseOutcome};
//!
//! let request = FrameBuilder::new().build_read_latest_data_long_request();
//! assert_eq!(request, [0x52, 0x42, 0x05, 0x00, 0x01, 0x21, 0x50, 0xe2, 0x4b]);
//!
//! let mut parser = FrameParser::default();
//! let reply = [0x52, 0x42, 0x06, 0x00, 0x81, 0x21, 0x50, 0x01, 0x23, 0x7a];
//! assert_eq!(parser.parse_response(&reply[..4]).unwrap(), ParseOutcome::Incomplete);
//! let response = parser.parse_response(&reply[4..]).unwrap().into_response().unwrap();
//! assert_eq!(response.status.as_str(), "Read Error");
//! ```

mod commands;
mod constants;
mod crc;
mod error;
mod frame;
mod input;
mod responses;
mod topic;
mod types;

pub use commands::*;
pub use constants::*;
pub use crc::*;
pub use error::*;
pub use frame::*;
pub use input::*;
pub use responses::*;
pub use topic::*;
pub use types::*;
