//! TCP segment construction and parsing
//!
//! This module provides functionality for building and parsing TCP segments,
//! including header construction, flags, options, and the pseudo-header
//! checksum.
//!
//! Options are serialized one after another, each preceded by a single NOP
//! byte, then the header is zero padded to a 4-byte boundary:
//!
//! ```text
//! [NOP, kind, length, data...] [NOP, kind, length, data...] ... [0 padding]
//! ```

use crate::checksum::{write_checksum, PseudoHeader};
use crate::endian::{read_u16, read_u32};
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::layer::{impl_encapsulate_operator, Decode, Encapsulate, Layer};
use bytes::{BufMut, BytesMut};
use pktforge_core::{resolve_ipv4, AddressResolver, DefaultInterface, Error, Result};
use rand::Rng;
use std::net::Ipv4Addr;

/// TCP option kinds
pub mod option_kind {
    /// End of option list
    pub const EOL: u8 = 0;
    /// No operation (alignment)
    pub const NOP: u8 = 1;
    /// Maximum segment size
    pub const MSS: u8 = 2;
    /// Window scale
    pub const WINDOW_SCALE: u8 = 3;
    /// SACK permitted
    pub const SACK_PERMITTED: u8 = 4;
    /// Selective acknowledgment
    pub const SACK: u8 = 5;
    /// Timestamps
    pub const TIMESTAMPS: u8 = 8;
}

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    /// FIN - No more data from sender
    pub fin: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// PSH - Push function
    pub psh: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
}

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags::from_u8(0x00);

    /// SYN flag (connection initiation)
    pub const SYN: TcpFlags = TcpFlags::from_u8(0x02);

    /// SYN+ACK flags (connection acknowledgment)
    pub const SYN_ACK: TcpFlags = TcpFlags::from_u8(0x12);

    /// ACK flag
    pub const ACK: TcpFlags = TcpFlags::from_u8(0x10);

    /// FIN+ACK flags (connection termination)
    pub const FIN_ACK: TcpFlags = TcpFlags::from_u8(0x11);

    /// RST flag (connection reset)
    pub const RST: TcpFlags = TcpFlags::from_u8(0x04);

    /// PSH+ACK flags (push data)
    pub const PSH_ACK: TcpFlags = TcpFlags::from_u8(0x18);

    /// Convert flags to u8 value
    pub const fn to_u8(self) -> u8 {
        (self.fin as u8)
            | (self.syn as u8) << 1
            | (self.rst as u8) << 2
            | (self.psh as u8) << 3
            | (self.ack as u8) << 4
            | (self.urg as u8) << 5
            | (self.ece as u8) << 6
            | (self.cwr as u8) << 7
    }

    /// Parse flags from u8 value
    pub const fn from_u8(value: u8) -> Self {
        TcpFlags {
            fin: (value & 0b00000001) != 0,
            syn: (value & 0b00000010) != 0,
            rst: (value & 0b00000100) != 0,
            psh: (value & 0b00001000) != 0,
            ack: (value & 0b00010000) != 0,
            urg: (value & 0b00100000) != 0,
            ece: (value & 0b01000000) != 0,
            cwr: (value & 0b10000000) != 0,
        }
    }
}

impl From<u8> for TcpFlags {
    fn from(value: u8) -> Self {
        TcpFlags::from_u8(value)
    }
}

/// A TCP option
///
/// EOL and NOP are single-byte kinds. They are written as `[NOP, kind]` with
/// no length byte, so they cannot carry data, and the decoder consumes them
/// instead of returning them as options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpOption {
    pub kind: u8,
    /// Option body, without the kind and length bytes
    pub data: Vec<u8>,
}

impl TcpOption {
    pub fn new(kind: u8, data: Vec<u8>) -> Self {
        TcpOption { kind, data }
    }

    /// Maximum segment size option
    pub fn mss(mss: u16) -> Self {
        Self::new(option_kind::MSS, mss.to_be_bytes().to_vec())
    }

    /// Window scale option
    pub fn window_scale(shift: u8) -> Self {
        Self::new(option_kind::WINDOW_SCALE, vec![shift])
    }

    pub fn sack_permitted() -> Self {
        Self::new(option_kind::SACK_PERMITTED, Vec::new())
    }

    /// Timestamps option (TSval, TSecr)
    pub fn timestamps(value: u32, echo_reply: u32) -> Self {
        let mut data = value.to_be_bytes().to_vec();
        data.extend_from_slice(&echo_reply.to_be_bytes());
        Self::new(option_kind::TIMESTAMPS, data)
    }

    fn is_single_byte(&self) -> bool {
        matches!(self.kind, option_kind::EOL | option_kind::NOP)
    }

    /// Bytes taken on the wire, including the leading NOP
    pub fn wire_len(&self) -> usize {
        if self.is_single_byte() {
            2
        } else {
            3 + self.data.len()
        }
    }

    /// Single-byte kinds have no length byte to carry data
    fn validate(&self) -> Result<()> {
        if self.is_single_byte() && !self.data.is_empty() {
            return Err(Error::UnexpectedOptionData {
                kind: self.kind,
                length: self.data.len(),
            });
        }
        Ok(())
    }

    fn write(&self, buffer: &mut BytesMut) {
        buffer.put_u8(option_kind::NOP);
        buffer.put_u8(self.kind);
        if !self.is_single_byte() {
            // Header size is checked before writing, so the length fits in a byte
            buffer.put_u8((2 + self.data.len()) as u8);
            buffer.put_slice(&self.data);
        }
    }
}

/// TCP segment
///
/// `source_address` and `destination_address` only feed the pseudo-header
/// checksum. They stay unspecified until set explicitly or by encapsulation in
/// an [`Ipv4Packet`]. `checksum` holds the value read by
/// [`Decode::decode_from`] and is ignored by [`Layer::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpPacket {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub ack_number: u32,
    pub flags: TcpFlags,
    pub window_size: u16,
    /// Checksum as found on the wire
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: Vec<TcpOption>,
    pub payload: Vec<u8>,
    pub source_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
}

impl TcpPacket {
    /// Minimum TCP header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum TCP header size (with maximum options)
    pub const MAX_HEADER_SIZE: usize = 60;

    /// Create a new TCP segment with a random initial sequence number
    pub fn new(source_port: u16, destination_port: u16, flags: TcpFlags, window_size: u16) -> Self {
        Self::new_with_rng(
            source_port,
            destination_port,
            flags,
            window_size,
            &mut rand::thread_rng(),
        )
    }

    /// Create a new TCP segment, drawing the initial sequence number from `rng`
    pub fn new_with_rng<R>(
        source_port: u16,
        destination_port: u16,
        flags: TcpFlags,
        window_size: u16,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        TcpPacket {
            source_port,
            destination_port,
            sequence_number: rng.gen(),
            ack_number: 0,
            flags,
            window_size,
            checksum: 0,
            urgent_pointer: 0,
            options: Vec::new(),
            payload: Vec::new(),
            source_address: Ipv4Addr::UNSPECIFIED,
            destination_address: Ipv4Addr::UNSPECIFIED,
        }
    }

    /// Set the sequence number.
    ///
    /// Zero is treated as "unset" and replaced with a fresh random number. Use
    /// [`TcpPacket::with_exact_sequence_number`] to put a literal zero on the
    /// wire.
    pub fn with_sequence_number(self, sequence_number: u32) -> Self {
        self.with_sequence_number_from(sequence_number, &mut rand::thread_rng())
    }

    /// Like [`TcpPacket::with_sequence_number`], drawing the replacement for
    /// zero from `rng`
    pub fn with_sequence_number_from<R>(mut self, sequence_number: u32, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        self.sequence_number = if sequence_number == 0 {
            rng.gen()
        } else {
            sequence_number
        };
        self
    }

    /// Set the sequence number to exactly `sequence_number`, zero included
    pub fn with_exact_sequence_number(mut self, sequence_number: u32) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn with_ack_number(mut self, ack_number: u32) -> Self {
        self.ack_number = ack_number;
        self
    }

    pub fn with_urgent_pointer(mut self, pointer: u16) -> Self {
        self.urgent_pointer = pointer;
        self
    }

    pub fn with_options(mut self, options: Vec<TcpOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Set the pseudo-header addresses; an unspecified source is replaced with
    /// the IPv4 address of the host's default interface
    pub fn with_addresses(self, source: Ipv4Addr, destination: Ipv4Addr) -> Result<Self> {
        self.with_addresses_from(source, destination, &DefaultInterface)
    }

    /// Set the pseudo-header addresses, resolving an unspecified source through `resolver`
    pub fn with_addresses_from<R>(
        mut self,
        source: Ipv4Addr,
        destination: Ipv4Addr,
        resolver: &R,
    ) -> Result<Self>
    where
        R: AddressResolver + ?Sized,
    {
        self.source_address = resolve_ipv4(source, resolver)?;
        self.destination_address = destination;
        Ok(self)
    }

    /// Header size in bytes, options and padding included
    pub fn header_len(&self) -> usize {
        let unpadded: usize =
            Self::MIN_HEADER_SIZE + self.options.iter().map(TcpOption::wire_len).sum::<usize>();
        (unpadded + 3) & !3
    }

    /// Get the total segment size in bytes
    pub fn len(&self) -> usize {
        self.header_len() + self.payload.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Parse a TCP segment and validate its checksum against the pseudo-header
    /// built from `source` and `destination`.
    ///
    /// The returned packet carries the given addresses. A segment longer than
    /// the pseudo-header length field can express is `InvalidLength`.
    pub fn decode_verified(data: &[u8], source: Ipv4Addr, destination: Ipv4Addr) -> Result<Self> {
        let mut packet = Self::decode_from(data)?;

        let pseudo = PseudoHeader::new(
            Self::NAME,
            source,
            destination,
            IpProtocol::TCP.to_u8(),
            data.len(),
        )
        .map_err(|_| Error::InvalidLength {
            layer: Self::NAME,
            length: data.len(),
            buffer_len: data.len(),
        })?;
        if pseudo.checksum(data) != 0 {
            let mut zeroed = data.to_vec();
            write_checksum(&mut zeroed, 16, 0);
            return Err(Error::ChecksumMismatch {
                layer: Self::NAME,
                found: packet.checksum,
                computed: pseudo.checksum(&zeroed),
            });
        }

        packet.source_address = source;
        packet.destination_address = destination;
        Ok(packet)
    }
}

impl Layer for TcpPacket {
    const NAME: &'static str = "TCP";

    fn build(&self) -> Result<Vec<u8>> {
        let options_len: usize = self.options.iter().map(TcpOption::wire_len).sum();
        let unpadded_len = Self::MIN_HEADER_SIZE + options_len;
        let header_len = self.header_len();
        if header_len > Self::MAX_HEADER_SIZE {
            return Err(Error::TcpHeaderTooLong(header_len));
        }
        for option in &self.options {
            option.validate()?;
        }

        let segment_len = header_len + self.payload.len();
        let pseudo = PseudoHeader::new(
            Self::NAME,
            self.source_address,
            self.destination_address,
            IpProtocol::TCP.to_u8(),
            segment_len,
        )?;

        let mut buffer = BytesMut::with_capacity(segment_len);

        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u32(self.sequence_number);
        buffer.put_u32(self.ack_number);

        // Data offset (4 bits) + reserved (4 bits)
        buffer.put_u8(((header_len / 4) as u8) << 4);

        buffer.put_u8(self.flags.to_u8());
        buffer.put_u16(self.window_size);

        // Checksum, filled in below
        buffer.put_u16(0);

        buffer.put_u16(self.urgent_pointer);

        for option in &self.options {
            option.write(&mut buffer);
        }
        buffer.put_bytes(0, header_len - unpadded_len);

        buffer.put_slice(&self.payload);

        let checksum = pseudo.checksum(&buffer);
        write_checksum(&mut buffer, 16, checksum);

        Ok(buffer.to_vec())
    }
}

impl Decode for TcpPacket {
    /// Parse a TCP segment.
    ///
    /// The checksum is recorded but not validated, since the pseudo-header
    /// addresses are not part of the segment; see
    /// [`TcpPacket::decode_verified`].
    fn decode_from(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                layer: Self::NAME,
                expected: Self::MIN_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let header_len = ((data[12] >> 4) as usize) * 4;
        if header_len > data.len() || header_len < Self::MIN_HEADER_SIZE {
            return Err(Error::InvalidDataOffset {
                header_len,
                buffer_len: data.len(),
            });
        }

        Ok(TcpPacket {
            source_port: read_u16(data, 0),
            destination_port: read_u16(data, 2),
            sequence_number: read_u32(data, 4),
            ack_number: read_u32(data, 8),
            flags: TcpFlags::from_u8(data[13]),
            window_size: read_u16(data, 14),
            checksum: read_u16(data, 16),
            urgent_pointer: read_u16(data, 18),
            options: parse_options(&data[..header_len])?,
            payload: data[header_len..].to_vec(),
            source_address: Ipv4Addr::UNSPECIFIED,
            destination_address: Ipv4Addr::UNSPECIFIED,
        })
    }
}

/// Scan the options area of `header` (the full header, fixed part included)
fn parse_options(header: &[u8]) -> Result<Vec<TcpOption>> {
    let header_len = header.len();
    let mut options = Vec::new();
    let mut pos = TcpPacket::MIN_HEADER_SIZE;

    while pos < header_len {
        let kind = header[pos];
        match kind {
            option_kind::EOL => break,
            option_kind::NOP => pos += 1,
            _ => {
                if pos == header_len - 1 {
                    return Err(Error::OptionLengthRequired { kind, offset: pos });
                }
                let length = header[pos + 1];
                if length < 2 {
                    return Err(Error::OptionLengthTooSmall {
                        kind,
                        offset: pos,
                        length,
                    });
                }
                let end = pos + length as usize;
                if end > header_len {
                    return Err(Error::OptionLengthTooLarge {
                        kind,
                        offset: pos,
                        length,
                    });
                }
                options.push(TcpOption::new(kind, header[pos + 2..end].to_vec()));
                pos = end;
            }
        }
    }

    Ok(options)
}

impl Encapsulate<Ipv4Packet> for TcpPacket {
    fn protocol_number(&self) -> IpProtocol {
        IpProtocol::TCP
    }

    fn bind_addresses(&mut self, source: Ipv4Addr, destination: Ipv4Addr) {
        self.source_address = source;
        self.destination_address = destination;
    }
}

impl_encapsulate_operator!(TcpPacket => Ipv4Packet);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::internet_checksum;
    use pktforge_core::StaticAddresses;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn src_ip() -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 1, 1)
    }

    fn dst_ip() -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 1, 2)
    }

    fn segment() -> TcpPacket {
        TcpPacket::new(12345, 80, TcpFlags::SYN, 65535)
            .with_exact_sequence_number(1000)
            .with_ack_number(2000)
            .with_payload(vec![0x01, 0x02, 0x03, 0x04])
            .with_addresses(src_ip(), dst_ip())
            .unwrap()
    }

    #[test]
    fn test_tcp_flags() {
        let flags = TcpFlags::SYN;
        assert!(!flags.fin);
        assert!(flags.syn);
        assert!(!flags.ack);
        assert_eq!(flags.to_u8(), 0b00000010);
        assert_eq!(TcpFlags::SYN_ACK.to_u8(), 0b00010010);

        for value in 0..=u8::MAX {
            assert_eq!(TcpFlags::from_u8(value).to_u8(), value);
        }
    }

    #[test]
    fn test_tcp_segment_to_bytes() {
        let bytes = segment().build().unwrap();

        assert_eq!(bytes.len(), 24);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 12345);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 80);
        assert_eq!(
            u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            1000
        );
        assert_eq!(
            u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            2000
        );
        assert_eq!(bytes[12], 0x50);
        assert_eq!(bytes[13], TcpFlags::SYN.to_u8());
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 65535);
        assert_eq!(&bytes[20..24], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_tcp_checksum_covers_pseudo_header() {
        let bytes = segment().build().unwrap();

        let mut with_pseudo = vec![192, 168, 1, 1, 192, 168, 1, 2, 0, 6, 0, 24];
        with_pseudo.extend_from_slice(&bytes);
        assert_eq!(internet_checksum(&with_pseudo), 0);

        // Different addresses give a different checksum
        let moved = segment()
            .with_addresses(Ipv4Addr::new(10, 0, 0, 1), dst_ip())
            .unwrap()
            .build()
            .unwrap();
        assert_ne!(moved[16..18], bytes[16..18]);
    }

    #[test]
    fn test_tcp_segment_from_bytes() {
        let data = vec![
            0x30, 0x39, // Source port (12345)
            0x00, 0x50, // Dest port (80)
            0x00, 0x00, 0x03, 0xE8, // Sequence (1000)
            0x00, 0x00, 0x07, 0xD0, // Ack (2000)
            0x50, // Data offset (5) + reserved
            0x02, // Flags (SYN)
            0xFF, 0xFF, // Window (65535)
            0x12, 0x34, // Checksum
            0x00, 0x07, // Urgent pointer
            0x01, 0x02, 0x03, 0x04, // Payload
        ];

        let segment = TcpPacket::decode_from(&data).unwrap();

        assert_eq!(segment.source_port, 12345);
        assert_eq!(segment.destination_port, 80);
        assert_eq!(segment.sequence_number, 1000);
        assert_eq!(segment.ack_number, 2000);
        assert!(segment.flags.syn);
        assert_eq!(segment.window_size, 65535);
        assert_eq!(segment.checksum, 0x1234);
        assert_eq!(segment.urgent_pointer, 7);
        assert!(segment.options.is_empty());
        assert_eq!(segment.payload, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(segment.source_address, Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_tcp_segment_roundtrip() {
        let segment1 = segment().with_urgent_pointer(3);
        let bytes = segment1.build().unwrap();
        let segment2 = TcpPacket::decode_from(&bytes).unwrap();

        assert_eq!(segment1.source_port, segment2.source_port);
        assert_eq!(segment1.destination_port, segment2.destination_port);
        assert_eq!(segment1.sequence_number, segment2.sequence_number);
        assert_eq!(segment1.ack_number, segment2.ack_number);
        assert_eq!(segment1.flags, segment2.flags);
        assert_eq!(segment1.window_size, segment2.window_size);
        assert_eq!(segment1.urgent_pointer, segment2.urgent_pointer);
        assert_eq!(segment1.options, segment2.options);
        assert_eq!(segment1.payload, segment2.payload);
    }

    #[test]
    fn test_tcp_option_layout() {
        let segment = segment().with_options(vec![TcpOption::mss(1460)]);
        let bytes = segment.build().unwrap();

        // 20 + NOP + kind + length + 2 data bytes = 25, padded to 28
        assert_eq!(segment.header_len(), 28);
        assert_eq!(bytes[12] >> 4, 7);
        assert_eq!(&bytes[20..28], &[0x01, 0x02, 0x04, 0x05, 0xB4, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[28..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_tcp_options_roundtrip() {
        let options = vec![
            TcpOption::mss(1460),
            TcpOption::sack_permitted(),
            TcpOption::timestamps(0xAABBCCDD, 0),
            TcpOption::window_scale(7),
        ];
        let segment = segment().with_options(options.clone());
        let bytes = segment.build().unwrap();
        assert_eq!(bytes.len() % 4, 0);

        let decoded = TcpPacket::decode_from(&bytes).unwrap();
        assert_eq!(decoded.options, options);
        assert_eq!(decoded.payload, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_tcp_header_too_long() {
        let segment = segment().with_options(vec![TcpOption::new(254, vec![0xAA; 38])]);
        // 20 + 3 + 38 = 61, padded to 64
        assert_eq!(segment.build(), Err(Error::TcpHeaderTooLong(64)));
    }

    #[test]
    fn test_tcp_segment_too_large_for_pseudo_header() {
        let segment = segment().with_payload(vec![0; 65516]);
        assert_eq!(
            segment.build(),
            Err(Error::SegmentTooLargeForPseudoHeader {
                layer: "TCP",
                length: 65536
            })
        );
    }

    #[test]
    fn test_decode_option_errors() {
        let mut header = segment().build().unwrap()[..20].to_vec();
        header[12] = 0x60; // 24-byte header

        // Kind in the last header byte has no length
        let mut data = header.clone();
        data.extend_from_slice(&[0x01, 0x01, 0x01, 0x02]);
        assert_eq!(
            TcpPacket::decode_from(&data),
            Err(Error::OptionLengthRequired { kind: 2, offset: 23 })
        );

        // Option runs past the header
        let mut data = header.clone();
        data.extend_from_slice(&[0x02, 0x06, 0x05, 0xB4]);
        assert_eq!(
            TcpPacket::decode_from(&data),
            Err(Error::OptionLengthTooLarge {
                kind: 2,
                offset: 20,
                length: 6
            })
        );

        // Length smaller than kind + length bytes
        let mut data = header.clone();
        data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        assert_eq!(
            TcpPacket::decode_from(&data),
            Err(Error::OptionLengthTooSmall {
                kind: 2,
                offset: 20,
                length: 0
            })
        );
    }

    #[test]
    fn test_decode_eol_stops_scan() {
        let mut data = segment().build().unwrap()[..20].to_vec();
        data[12] = 0x60;
        data.extend_from_slice(&[0x00, 0x02, 0xFF, 0xFF]);
        let decoded = TcpPacket::decode_from(&data).unwrap();
        assert!(decoded.options.is_empty());
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_decode_invalid_data_offset() {
        let mut data = segment().build().unwrap();
        data[12] = 0x40; // 16 bytes, below the fixed header
        assert_eq!(
            TcpPacket::decode_from(&data),
            Err(Error::InvalidDataOffset {
                header_len: 16,
                buffer_len: 24
            })
        );
    }

    #[test]
    fn test_decode_verified() {
        let bytes = segment().build().unwrap();

        let verified = TcpPacket::decode_verified(&bytes, src_ip(), dst_ip()).unwrap();
        assert_eq!(verified.source_address, src_ip());
        assert_eq!(verified.destination_address, dst_ip());

        let expected = u16::from_be_bytes([bytes[16], bytes[17]]);
        match TcpPacket::decode_verified(&bytes, Ipv4Addr::new(10, 0, 0, 1), dst_ip()) {
            Err(Error::ChecksumMismatch {
                layer: "TCP",
                found,
                computed,
            }) => {
                assert_eq!(found, expected);
                assert_ne!(computed, expected);
            }
            other => panic!("Expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_number_from_rng() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = TcpPacket::new_with_rng(1, 2, TcpFlags::SYN, 1024, &mut rng_a);
        let b = TcpPacket::new_with_rng(1, 2, TcpFlags::SYN, 1024, &mut rng_b);
        assert_eq!(a.sequence_number, b.sequence_number);
    }

    #[test]
    fn test_sequence_number_zero() {
        let explicit = TcpPacket::new(1, 2, TcpFlags::SYN, 1024).with_exact_sequence_number(0);
        assert_eq!(explicit.sequence_number, 0);

        let fixed = TcpPacket::new(1, 2, TcpFlags::SYN, 1024).with_sequence_number(42);
        assert_eq!(fixed.sequence_number, 42);
    }

    #[test]
    fn test_sequence_number_zero_draws_from_rng() {
        let expected: u32 = StdRng::seed_from_u64(11).gen();

        let mut rng = StdRng::seed_from_u64(11);
        let drawn = TcpPacket::new(1, 2, TcpFlags::SYN, 1024)
            .with_sequence_number_from(0, &mut rng);
        assert_eq!(drawn.sequence_number, expected);

        let mut rng = StdRng::seed_from_u64(11);
        let kept = TcpPacket::new(1, 2, TcpFlags::SYN, 1024)
            .with_sequence_number_from(7, &mut rng);
        assert_eq!(kept.sequence_number, 7);
        // The generator is left untouched for non-zero values
        assert_eq!(rng.gen::<u32>(), expected);
    }

    #[test]
    fn test_single_byte_option_with_data_rejected() {
        let with_data = segment().with_options(vec![TcpOption::new(
            option_kind::NOP,
            vec![0xAA, 0xBB],
        )]);
        assert_eq!(
            with_data.build(),
            Err(Error::UnexpectedOptionData { kind: 1, length: 2 })
        );

        // Without data it is written as [NOP, NOP] and skipped on decode
        let bytes = segment()
            .with_options(vec![TcpOption::new(option_kind::NOP, Vec::new())])
            .build()
            .unwrap();
        assert_eq!(&bytes[20..24], &[0x01, 0x01, 0x00, 0x00]);
        assert!(TcpPacket::decode_from(&bytes).unwrap().options.is_empty());
    }

    #[test]
    fn test_decode_verified_oversized_segment() {
        let mut data = segment().build().unwrap();
        data.resize(65536, 0);
        let err = TcpPacket::decode_verified(&data, src_ip(), dst_ip()).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidLength {
                layer: "TCP",
                length: 65536,
                buffer_len: 65536
            }
        );
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_source_address_resolution() {
        let resolver = StaticAddresses {
            mac: None,
            ipv4: Some(Ipv4Addr::new(10, 2, 3, 4)),
        };
        let segment = TcpPacket::new(1, 2, TcpFlags::SYN, 1024)
            .with_addresses_from(Ipv4Addr::UNSPECIFIED, dst_ip(), &resolver)
            .unwrap();
        assert_eq!(segment.source_address, Ipv4Addr::new(10, 2, 3, 4));

        let err = TcpPacket::new(1, 2, TcpFlags::SYN, 1024)
            .with_addresses_from(Ipv4Addr::UNSPECIFIED, dst_ip(), &StaticAddresses::none())
            .unwrap_err();
        assert_eq!(err, Error::NoDefaultInterface("IPv4"));
    }
}
