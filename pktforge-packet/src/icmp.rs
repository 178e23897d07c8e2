//! ICMP message construction and parsing
//!
//! Every ICMP message shares an 8-byte header: type, code, checksum and four
//! bytes whose meaning depends on the type (identifier and sequence number for
//! echo messages, unused for destination unreachable). The checksum covers the
//! whole message and, unlike TCP and UDP, has no pseudo-header.

use crate::checksum::{internet_checksum, write_checksum};
use crate::endian::read_u16;
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::layer::{impl_encapsulate_operator, Decode, Encapsulate, Intermediary, Layer};
use bytes::{BufMut, BytesMut};
use pktforge_core::{Error, Result};

/// ICMP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpPacket {
    pub icmp_type: u8,
    pub code: u8,
    /// Type-specific header bytes
    pub header_contents: [u8; 4],
    /// Checksum as found on the wire
    pub checksum: u16,
    pub payload: Vec<u8>,
}

impl IcmpPacket {
    /// ICMP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    pub const ECHO_REPLY: u8 = 0;
    pub const DESTINATION_UNREACHABLE: u8 = 3;
    pub const ECHO_REQUEST: u8 = 8;
    pub const TIME_EXCEEDED: u8 = 11;

    pub fn new(icmp_type: u8, code: u8, header_contents: [u8; 4]) -> Self {
        IcmpPacket {
            icmp_type,
            code,
            header_contents,
            checksum: 0,
            payload: Vec::new(),
        }
    }

    /// Echo request ("ping")
    pub fn echo_request(identifier: u16, sequence: u16, payload: Vec<u8>) -> Self {
        Self::echo(Self::ECHO_REQUEST, identifier, sequence, payload)
    }

    /// Echo reply
    pub fn echo_reply(identifier: u16, sequence: u16, payload: Vec<u8>) -> Self {
        Self::echo(Self::ECHO_REPLY, identifier, sequence, payload)
    }

    fn echo(icmp_type: u8, identifier: u16, sequence: u16, payload: Vec<u8>) -> Self {
        let [id_hi, id_lo] = identifier.to_be_bytes();
        let [seq_hi, seq_lo] = sequence.to_be_bytes();
        Self::new(icmp_type, 0, [id_hi, id_lo, seq_hi, seq_lo]).with_payload(payload)
    }

    /// Destination unreachable; the payload is usually the offending IPv4
    /// header plus the first 8 bytes of its payload
    pub fn destination_unreachable(code: u8) -> Self {
        Self::new(Self::DESTINATION_UNREACHABLE, code, [0; 4])
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn is_echo(&self) -> bool {
        matches!(self.icmp_type, Self::ECHO_REQUEST | Self::ECHO_REPLY)
    }

    /// Echo identifier, `None` for non-echo messages
    pub fn identifier(&self) -> Option<u16> {
        self.is_echo().then(|| read_u16(&self.header_contents, 0))
    }

    /// Echo sequence number, `None` for non-echo messages
    pub fn sequence(&self) -> Option<u16> {
        self.is_echo().then(|| read_u16(&self.header_contents, 2))
    }

    /// Get the total message size in bytes
    pub fn len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Parse an ICMP message and validate its checksum
    pub fn decode_verified(data: &[u8]) -> Result<Self> {
        let packet = Self::decode_from(data)?;

        if internet_checksum(data) != 0 {
            let mut zeroed = data.to_vec();
            write_checksum(&mut zeroed, 2, 0);
            return Err(Error::ChecksumMismatch {
                layer: Self::NAME,
                found: packet.checksum,
                computed: internet_checksum(&zeroed),
            });
        }

        Ok(packet)
    }
}

impl Layer for IcmpPacket {
    const NAME: &'static str = "ICMP";

    fn build(&self) -> Result<Vec<u8>> {
        let mut buffer = BytesMut::with_capacity(self.len());

        buffer.put_u8(self.icmp_type);
        buffer.put_u8(self.code);
        buffer.put_u16(0);
        buffer.put_slice(&self.header_contents);
        buffer.put_slice(&self.payload);

        let checksum = internet_checksum(&buffer);
        write_checksum(&mut buffer, 2, checksum);

        Ok(buffer.to_vec())
    }
}

impl Decode for IcmpPacket {
    /// Parse an ICMP message without validating the checksum, see
    /// [`IcmpPacket::decode_verified`]
    fn decode_from(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                layer: Self::NAME,
                expected: Self::HEADER_SIZE,
                actual: data.len(),
            });
        }

        Ok(IcmpPacket {
            icmp_type: data[0],
            code: data[1],
            checksum: read_u16(data, 2),
            header_contents: [data[4], data[5], data[6], data[7]],
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }
}

/// ICMP has neither addresses nor a payload protocol field; it hosts raw
/// bytes, typically a quoted IPv4 datagram.
impl Intermediary for IcmpPacket {
    type Address = ();
    type Protocol = ();

    fn source_address(&self) {}

    fn destination_address(&self) {}

    fn protocol(&self) -> Option<()> {
        None
    }

    fn set_protocol(&mut self, _protocol: ()) {}

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }
}

impl Encapsulate<Ipv4Packet> for IcmpPacket {
    fn protocol_number(&self) -> IpProtocol {
        IpProtocol::ICMP
    }
}

/// Quote an IPv4 datagram inside an ICMP error message
impl Encapsulate<IcmpPacket> for Ipv4Packet {
    fn protocol_number(&self) {}
}

impl_encapsulate_operator!(IcmpPacket => Ipv4Packet);
impl_encapsulate_operator!(Ipv4Packet => IcmpPacket);
