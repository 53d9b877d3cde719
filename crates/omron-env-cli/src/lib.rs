//! Host Bridge for the Omron 2JCIE-BU Sensor
//!
//! This crate sits between a host message flow and the
//! [`omron_env_protocol`] codec. It routes topic labelled commands to request
//! frames, and turns reassembled response frames into topic labelled output
//! messages. It does not open the serial or BLE transport itself.
//!
//! # Example
//!
//! ```rust
//! use omron_env_cli::{Bridge, BridgeConfig};
//!
//! let mut bridge = Bridge::new(&BridgeConfig::default());
//! let request = bridge.on_command("getLatestSensorData", None).unwrap();
//! assert_eq!(request.len(), 9);
//!
//! let messages = bridge
//!     .on_input(vec![0x52, 0x42, 0x06, 0x00, 0x81, 0x21, 0x50, 0x01, 0x23, 0x7a])
//!     .unwrap();
//! assert_eq!(messages[0].topic.as_deref(), Some("getLatestSensorData"));
//! ```

mod config;
mod error;
mod routing;

pub use config::*;
pub use error::*;
pub use routing::*;
