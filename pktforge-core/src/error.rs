//! Error types for pktforge

use thiserror::Error;

/// Result type alias for pktforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pktforge
///
/// Variants fall into three families: malformed input raised by decoders,
/// encoding overflow raised by builders, and resolution failures raised by the
/// default interface lookup. None of them is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer is shorter than the fixed header of the layer
    #[error("{layer} header too short: need {expected} bytes, got {actual}")]
    HeaderTooShort {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    /// TCP data offset points before the end of the fixed header or past the buffer
    #[error("TCP data offset invalid: header length {header_len}, buffer length {buffer_len}")]
    InvalidDataOffset { header_len: usize, buffer_len: usize },

    /// TCP option kind is the last header byte, so there is no room for its length
    #[error("TCP option {kind} at offset {offset} is missing its length byte")]
    OptionLengthRequired { kind: u8, offset: usize },

    /// TCP option length is below the two bytes taken by kind and length
    #[error("TCP option {kind} at offset {offset} has length {length}, minimum is 2")]
    OptionLengthTooSmall { kind: u8, offset: usize, length: u8 },

    /// TCP option extends past the end of the header
    #[error("TCP option {kind} at offset {offset} with length {length} overruns header")]
    OptionLengthTooLarge { kind: u8, offset: usize, length: u8 },

    /// IP version nibble is not 4
    #[error("invalid IP version {0}")]
    InvalidVersion(u8),

    /// IPv4 IHL is below the minimum or points past the buffer
    #[error("{layer} header length {header_len} invalid for buffer of {buffer_len} bytes")]
    InvalidHeaderLength {
        layer: &'static str,
        header_len: usize,
        buffer_len: usize,
    },

    /// A length field disagrees with the header or the buffer
    #[error("{layer} length field {length} invalid for buffer of {buffer_len} bytes")]
    InvalidLength {
        layer: &'static str,
        length: usize,
        buffer_len: usize,
    },

    /// A received checksum does not match the recomputed one
    #[error("{layer} checksum mismatch: found 0x{found:04x}, computed 0x{computed:04x}")]
    ChecksumMismatch {
        layer: &'static str,
        found: u16,
        computed: u16,
    },

    /// TCP header with options exceeds the 60 bytes the data offset can express
    #[error("TCP header too long: {0} bytes (maximum 60)")]
    TcpHeaderTooLong(usize),

    /// Single-byte TCP option kind (EOL or NOP) given a data body
    #[error("TCP option kind {kind} is a single byte and cannot carry {length} data bytes")]
    UnexpectedOptionData { kind: u8, length: usize },

    /// Header options exceed what the header length field can express
    #[error("{layer} header too long: {length} bytes (maximum {max})")]
    HeaderTooLong {
        layer: &'static str,
        length: usize,
        max: usize,
    },

    /// Segment length does not fit the 16-bit pseudo-header length field
    #[error("{layer} segment of {length} bytes too large for pseudo-header")]
    SegmentTooLargeForPseudoHeader { layer: &'static str, length: usize },

    /// Packet length does not fit a 16-bit total length field
    #[error("{layer} packet of {length} bytes too large (maximum 65535)")]
    PacketTooLarge { layer: &'static str, length: usize },

    /// No interface suitable to supply a default address
    #[error("no default interface with a usable {0} address")]
    NoDefaultInterface(&'static str),

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Address text could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Packet builder asked for a layer combination it cannot assemble
    #[error("missing {0} layer")]
    MissingLayer(&'static str),
}

impl Error {
    /// Create an invalid address error with a custom message
    pub fn invalid_address<S: Into<String>>(msg: S) -> Self {
        Error::InvalidAddress(msg.into())
    }

    /// Whether the error was raised by a decoder on structurally invalid input
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::HeaderTooShort { .. }
                | Error::InvalidDataOffset { .. }
                | Error::OptionLengthRequired { .. }
                | Error::OptionLengthTooSmall { .. }
                | Error::OptionLengthTooLarge { .. }
                | Error::InvalidVersion(_)
                | Error::InvalidHeaderLength { .. }
                | Error::InvalidLength { .. }
                | Error::ChecksumMismatch { .. }
        )
    }

    /// Whether the error was raised by a builder on unrepresentable field values
    pub fn is_encoding_overflow(&self) -> bool {
        matches!(
            self,
            Error::TcpHeaderTooLong(_)
                | Error::UnexpectedOptionData { .. }
                | Error::HeaderTooLong { .. }
                | Error::SegmentTooLargeForPseudoHeader { .. }
                | Error::PacketTooLarge { .. }
        )
    }

    /// Whether the error came from default interface resolution
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Error::NoDefaultInterface(_) | Error::InterfaceNotFound(_)
        )
    }
}
