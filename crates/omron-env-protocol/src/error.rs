//! Protocol error types.

use thiserror::Error;

/// Broad classification of a [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, header mismatch, checksum mismatch, bad lengths.
    Format,
    /// A valid frame whose contents cannot be interpreted.
    IllegalData,
}

/// Errors that can occur when building or parsing frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input could not be normalized into a byte sequence.
    #[error("[FormatError] {0}")]
    InvalidInput(String),

    /// Frame does not start with the protocol header.
    #[error("[FormatError] Cannot parse the given data. Unsupported format (header 0x{found:04x}).")]
    HeaderMismatch {
        /// Header value found in the chunk.
        found: u16,
    },

    /// Frame or payload is too short to be valid.
    #[error("[FormatError] frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// More bytes were buffered than the frame declared.
    #[error("[FormatError] frame overrun: declared {expected} bytes, buffered {actual}")]
    FrameOverrun {
        /// Frame length implied by the length field.
        expected: usize,
        /// Bytes actually buffered.
        actual: usize,
    },

    /// Payload does not fit the 16 bit length field.
    #[error("[FormatError] payload too large: at most {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Largest payload that can be framed.
        max: usize,
        /// Payload length given.
        actual: usize,
    },

    /// Trailing CRC16 does not match the frame contents.
    #[error("[FormatError] CRC16 Check Failed! Expected:0x{expected:x}, Actual:0x{actual:x}")]
    ChecksumMismatch {
        /// CRC16 computed over the received frame.
        expected: u16,
        /// CRC16 carried in the frame.
        actual: u16,
    },

    /// Read OK response for a register this codec cannot decode.
    #[error("[IllegalDataError] Unsupported Address: 0x{0:04X}")]
    UnsupportedAddress(u16),

    /// Unknown topic label given to the command router.
    #[error("Unknown command: {0}")]
    UnknownTopic(String),
}

impl ProtocolError {
    /// Classify this error.
    ///
    /// `UnknownTopic` is a caller mistake rather than bad data and is
    /// reported as [`ErrorKind::Format`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::UnsupportedAddress(_) => ErrorKind::IllegalData,
            _ => ErrorKind::Format,
        }
    }

    /// True for malformed input, header and checksum failures.
    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// True when a checksummed frame could not be interpreted.
    pub fn is_illegal_data(&self) -> bool {
        self.kind() == ErrorKind::IllegalData
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
