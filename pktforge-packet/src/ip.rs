//! IPv4 packet construction and parsing
//!
//! This module provides functionality for building and parsing IPv4 packets,
//! including header construction, checksum calculation, and protocol support.

use crate::checksum::{internet_checksum, write_checksum};
use crate::endian::read_u16;
use crate::layer::{Decode, Intermediary, Layer};
use bytes::{BufMut, BytesMut};
use pktforge_core::{resolve_ipv4, AddressResolver, DefaultInterface, Error, Result};
use std::net::Ipv4Addr;

/// IP Protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// IGMP (2)
    IGMP,
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// GRE (47)
    GRE,
    /// ESP (50)
    ESP,
    /// AH (51)
    AH,
    /// OSPF (89)
    OSPF,
    /// SCTP (132)
    SCTP,
    /// Custom protocol number
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::IGMP => 2,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::GRE => 47,
            IpProtocol::ESP => 50,
            IpProtocol::AH => 51,
            IpProtocol::OSPF => 89,
            IpProtocol::SCTP => 132,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            2 => IpProtocol::IGMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            47 => IpProtocol::GRE,
            50 => IpProtocol::ESP,
            51 => IpProtocol::AH,
            89 => IpProtocol::OSPF,
            132 => IpProtocol::SCTP,
            val => IpProtocol::Custom(val),
        }
    }

    /// Protocol field as decode sees it: 0 is unset, and a `Custom` number
    /// with a named variant becomes that variant
    pub fn field_value(value: u8) -> Option<Self> {
        match value {
            0 => None,
            value => Some(IpProtocol::from_u8(value)),
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        IpProtocol::from_u8(value)
    }
}

/// Type of Service (ToS) / Differentiated Services Code Point (DSCP)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeOfService(pub u8);

impl TypeOfService {
    /// Default ToS (0)
    pub const DEFAULT: TypeOfService = TypeOfService(0);

    /// Minimize delay
    pub const MINIMIZE_DELAY: TypeOfService = TypeOfService(0x10);

    /// Maximize throughput
    pub const MAXIMIZE_THROUGHPUT: TypeOfService = TypeOfService(0x08);

    /// Maximize reliability
    pub const MAXIMIZE_RELIABILITY: TypeOfService = TypeOfService(0x04);

    pub fn new(value: u8) -> Self {
        TypeOfService(value)
    }

    pub fn to_u8(self) -> u8 {
        self.0
    }
}

/// IP Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Reserved bit (must be 0)
    pub reserved: bool,
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    /// No flags set
    pub const NONE: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: false,
        more_fragments: false,
    };

    /// Don't Fragment flag set
    pub const DONT_FRAGMENT: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: true,
        more_fragments: false,
    };

    /// Convert to 3-bit value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.reserved {
            flags |= 0b100;
        }
        if self.dont_fragment {
            flags |= 0b010;
        }
        if self.more_fragments {
            flags |= 0b001;
        }
        flags
    }

    /// Parse from 3-bit value
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            reserved: (value & 0b100) != 0,
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

/// IPv4 packet
///
/// Version, IHL, total length and header checksum are derived when the packet
/// is built. `checksum` holds the value read by [`Decode::decode_from`] and is
/// ignored by [`Layer::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    /// Type of Service / DSCP
    pub tos: TypeOfService,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Fragment offset (in 8-byte blocks, 13 bits)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    /// Payload protocol, `None` until set or filled in by encapsulation
    pub protocol: Option<IpProtocol>,
    /// Header checksum as found on the wire
    pub checksum: u16,
    /// Source IP address
    pub source: Ipv4Addr,
    /// Destination IP address
    pub destination: Ipv4Addr,
    /// Options, zero padded to a 4-byte boundary
    pub options: Vec<u8>,
    /// Payload data
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// Minimum IPv4 header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum IPv4 header size (with maximum options)
    pub const MAX_HEADER_SIZE: usize = 60;

    /// Maximum IPv4 packet size
    pub const MAX_PACKET_SIZE: usize = 65535;

    /// Default Time to Live
    pub const DEFAULT_TTL: u8 = 64;

    /// Create a new IPv4 packet.
    ///
    /// An unspecified (`0.0.0.0`) source is replaced with the IPv4 address of
    /// the host's default interface.
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Result<Self> {
        Self::new_with_resolver(source, destination, &DefaultInterface)
    }

    /// Create a new IPv4 packet, resolving an unspecified source through `resolver`
    pub fn new_with_resolver<R>(
        source: Ipv4Addr,
        destination: Ipv4Addr,
        resolver: &R,
    ) -> Result<Self>
    where
        R: AddressResolver + ?Sized,
    {
        Ok(Ipv4Packet {
            tos: TypeOfService::DEFAULT,
            identification: 0,
            flags: IpFlags::DONT_FRAGMENT,
            fragment_offset: 0,
            ttl: Self::DEFAULT_TTL,
            protocol: None,
            checksum: 0,
            source: resolve_ipv4(source, resolver)?,
            destination,
            options: Vec::new(),
            payload: Vec::new(),
        })
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the Type of Service
    pub fn with_tos(mut self, tos: TypeOfService) -> Self {
        self.tos = tos;
        self
    }

    /// Set the identification field
    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: IpFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the fragment offset
    pub fn with_fragment_offset(mut self, offset: u16) -> Self {
        self.fragment_offset = offset & 0x1FFF; // Only 13 bits
        self
    }

    /// Set the payload protocol explicitly; encapsulation keeps it.
    ///
    /// The value is stored the way decode would read it back, so
    /// `Custom(6)` becomes `TCP` and `Custom(0)` leaves the protocol unset.
    pub fn with_protocol(mut self, protocol: IpProtocol) -> Self {
        self.protocol = IpProtocol::field_value(protocol.to_u8());
        self
    }

    /// Set IP options
    pub fn with_options(mut self, options: Vec<u8>) -> Self {
        self.options = pad_to_word(options);
        self
    }

    /// Set the payload bytes directly
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Get the header size in bytes
    pub fn header_len(&self) -> usize {
        Self::MIN_HEADER_SIZE + padded_len(self.options.len())
    }

    /// Get the total packet size in bytes
    pub fn len(&self) -> usize {
        self.header_len() + self.payload.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

fn pad_to_word(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.resize(padded_len(bytes.len()), 0);
    bytes
}

impl Layer for Ipv4Packet {
    const NAME: &'static str = "IPv4";

    fn build(&self) -> Result<Vec<u8>> {
        let header_len = self.header_len();
        if header_len > Self::MAX_HEADER_SIZE {
            return Err(Error::HeaderTooLong {
                layer: Self::NAME,
                length: header_len,
                max: Self::MAX_HEADER_SIZE,
            });
        }

        let total_len = header_len + self.payload.len();
        let total_length = u16::try_from(total_len).map_err(|_| Error::PacketTooLarge {
            layer: Self::NAME,
            length: total_len,
        })?;

        let mut buffer = BytesMut::with_capacity(total_len);

        // Version (4 bits) + IHL (4 bits)
        buffer.put_u8((4 << 4) | (header_len / 4) as u8);

        // Type of Service
        buffer.put_u8(self.tos.to_u8());

        // Total Length
        buffer.put_u16(total_length);

        // Identification
        buffer.put_u16(self.identification);

        // Flags (3 bits) + Fragment Offset (13 bits)
        let flags_and_offset =
            ((self.flags.to_u8() as u16) << 13) | (self.fragment_offset & 0x1FFF);
        buffer.put_u16(flags_and_offset);

        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol.map_or(0, IpProtocol::to_u8));

        // Header Checksum, filled in below
        buffer.put_u16(0);

        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());

        buffer.put_slice(&self.options);
        buffer.put_bytes(0, padded_len(self.options.len()) - self.options.len());

        let checksum = internet_checksum(&buffer[..header_len]);
        write_checksum(&mut buffer, 10, checksum);

        buffer.put_slice(&self.payload);

        Ok(buffer.to_vec())
    }
}

impl Decode for Ipv4Packet {
    /// Parse an IPv4 packet, validating the header checksum.
    ///
    /// Bytes beyond the total length (for example Ethernet padding) are
    /// ignored.
    fn decode_from(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                layer: Self::NAME,
                expected: Self::MIN_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(Error::InvalidVersion(version));
        }

        let header_len = ((data[0] & 0x0F) as usize) * 4;
        if header_len < Self::MIN_HEADER_SIZE || header_len > data.len() {
            return Err(Error::InvalidHeaderLength {
                layer: Self::NAME,
                header_len,
                buffer_len: data.len(),
            });
        }

        let total_length = read_u16(data, 2) as usize;
        if total_length < header_len || total_length > data.len() {
            return Err(Error::InvalidLength {
                layer: Self::NAME,
                length: total_length,
                buffer_len: data.len(),
            });
        }

        let checksum = read_u16(data, 10);
        if internet_checksum(&data[..header_len]) != 0 {
            let mut header = data[..header_len].to_vec();
            write_checksum(&mut header, 10, 0);
            return Err(Error::ChecksumMismatch {
                layer: Self::NAME,
                found: checksum,
                computed: internet_checksum(&header),
            });
        }

        let flags_and_offset = read_u16(data, 6);
        let protocol = IpProtocol::field_value(data[9]);

        Ok(Ipv4Packet {
            tos: TypeOfService::new(data[1]),
            identification: read_u16(data, 4),
            flags: IpFlags::from_u8((flags_and_offset >> 13) as u8),
            fragment_offset: flags_and_offset & 0x1FFF,
            ttl: data[8],
            protocol,
            checksum,
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            options: data[Self::MIN_HEADER_SIZE..header_len].to_vec(),
            payload: data[header_len..total_length].to_vec(),
        })
    }
}

impl Intermediary for Ipv4Packet {
    type Address = Ipv4Addr;
    type Protocol = IpProtocol;

    fn source_address(&self) -> Ipv4Addr {
        self.source
    }

    fn destination_address(&self) -> Ipv4Addr {
        self.destination
    }

    fn protocol(&self) -> Option<IpProtocol> {
        self.protocol
    }

    fn set_protocol(&mut self, protocol: IpProtocol) {
        self.protocol = IpProtocol::field_value(protocol.to_u8());
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktforge_core::StaticAddresses;

    fn packet() -> Ipv4Packet {
        Ipv4Packet::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2))
            .unwrap()
            .with_protocol(IpProtocol::UDP)
            .with_payload(vec![0x01, 0x02, 0x03, 0x04])
    }

    #[test]
    fn test_ip_protocol_conversion() {
        assert_eq!(IpProtocol::TCP.to_u8(), 6);
        assert_eq!(IpProtocol::UDP.to_u8(), 17);
        assert_eq!(IpProtocol::from_u8(6), IpProtocol::TCP);
        assert_eq!(IpProtocol::from_u8(253), IpProtocol::Custom(253));
    }

    #[test]
    fn test_ip_flags() {
        let flags = IpFlags::DONT_FRAGMENT;
        assert_eq!(flags.to_u8(), 0b010);
        assert_eq!(IpFlags::from_u8(0b010), flags);
        assert!(IpFlags::from_u8(0b001).more_fragments);
    }

    #[test]
    fn test_ipv4_packet_new_defaults() {
        let packet = Ipv4Packet::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)).unwrap();
        assert_eq!(packet.ttl, 64);
        assert_eq!(packet.flags, IpFlags::DONT_FRAGMENT);
        assert_eq!(packet.protocol, None);
        assert_eq!(packet.header_len(), 20);
    }

    #[test]
    fn test_ipv4_source_resolution() {
        let resolver = StaticAddresses {
            mac: None,
            ipv4: Some(Ipv4Addr::new(10, 9, 8, 7)),
        };
        let packet =
            Ipv4Packet::new_with_resolver(Ipv4Addr::UNSPECIFIED, Ipv4Addr::new(1, 1, 1, 1), &resolver)
                .unwrap();
        assert_eq!(packet.source, Ipv4Addr::new(10, 9, 8, 7));

        let err = Ipv4Packet::new_with_resolver(
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::new(1, 1, 1, 1),
            &StaticAddresses::none(),
        )
        .unwrap_err();
        assert_eq!(err, Error::NoDefaultInterface("IPv4"));
    }

    #[test]
    fn test_ipv4_packet_build() {
        let bytes = packet().build().unwrap();

        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[0], 0x45);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 24);
        assert_eq!(bytes[6], 0x40); // DF
        assert_eq!(bytes[8], 64);
        assert_eq!(bytes[9], 17);
        assert_eq!(&bytes[12..16], &[192, 168, 1, 1]);
        assert_eq!(&bytes[16..20], &[192, 168, 1, 2]);
        assert_eq!(&bytes[20..24], &[0x01, 0x02, 0x03, 0x04]);

        // Header checksum covers the header only
        assert_eq!(internet_checksum(&bytes[..20]), 0);
    }

    #[test]
    fn test_ipv4_known_checksum() {
        let packet = Ipv4Packet::new(Ipv4Addr::new(192, 168, 0, 1), Ipv4Addr::new(192, 168, 0, 199))
            .unwrap()
            .with_protocol(IpProtocol::UDP)
            .with_payload(vec![0; 95]);
        let bytes = packet.build().unwrap();
        assert_eq!(u16::from_be_bytes([bytes[10], bytes[11]]), 0xb861);
    }

    #[test]
    fn test_ipv4_unset_protocol_written_as_zero() {
        let packet = Ipv4Packet::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)).unwrap();
        let bytes = packet.build().unwrap();
        assert_eq!(bytes[9], 0);
        assert_eq!(Ipv4Packet::decode_from(&bytes).unwrap().protocol, None);
    }

    #[test]
    fn test_ipv4_custom_protocol_normalized() {
        let tcp = packet().with_protocol(IpProtocol::Custom(6));
        assert_eq!(tcp.protocol, Some(IpProtocol::TCP));

        let unset = packet().with_protocol(IpProtocol::Custom(0));
        assert_eq!(unset.protocol, None);

        let mut set = packet();
        set.set_protocol(IpProtocol::Custom(17));
        assert_eq!(set.protocol, Some(IpProtocol::UDP));

        for built in [tcp, unset, set] {
            let mut decoded = Ipv4Packet::decode_from(&built.build().unwrap()).unwrap();
            decoded.checksum = 0;
            assert_eq!(decoded, built);
        }
    }

    #[test]
    fn test_ipv4_options_padding() {
        let packet = packet().with_options(vec![0x94, 0x04, 0x00]);
        assert_eq!(packet.options.len(), 4);
        assert_eq!(packet.header_len(), 24);

        let bytes = packet.build().unwrap();
        assert_eq!(bytes[0] & 0x0F, 6);
        assert_eq!(&bytes[20..24], &[0x94, 0x04, 0x00, 0x00]);
    }

    #[test]
    fn test_ipv4_header_too_long() {
        let packet = packet().with_options(vec![0x01; 44]);
        assert_eq!(
            packet.build(),
            Err(Error::HeaderTooLong {
                layer: "IPv4",
                length: 64,
                max: 60
            })
        );
    }

    #[test]
    fn test_ipv4_packet_too_large() {
        let packet = packet().with_payload(vec![0; 65516]);
        assert_eq!(
            packet.build(),
            Err(Error::PacketTooLarge {
                layer: "IPv4",
                length: 65536
            })
        );
    }

    #[test]
    fn test_ipv4_packet_roundtrip() {
        let packet1 = packet()
            .with_ttl(128)
            .with_identification(0xBEEF)
            .with_tos(TypeOfService::MINIMIZE_DELAY)
            .with_flags(IpFlags::NONE)
            .with_fragment_offset(0x0123)
            .with_options(vec![0x94, 0x04, 0x00, 0x00]);
        let bytes = packet1.build().unwrap();
        let packet2 = Ipv4Packet::decode_from(&bytes).unwrap();

        assert_eq!(packet2.checksum, u16::from_be_bytes([bytes[10], bytes[11]]));
        assert_eq!(
            Ipv4Packet {
                checksum: 0,
                ..packet2
            },
            packet1
        );
    }

    #[test]
    fn test_ipv4_decode_trims_to_total_length() {
        let mut bytes = packet().build().unwrap();
        bytes.extend_from_slice(&[0; 6]); // trailing link-layer padding
        let decoded = Ipv4Packet::decode_from(&bytes).unwrap();
        assert_eq!(decoded.payload, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_ipv4_decode_errors() {
        let bytes = packet().build().unwrap();

        assert!(matches!(
            Ipv4Packet::decode_from(&bytes[..19]),
            Err(Error::HeaderTooShort { expected: 20, actual: 19, .. })
        ));

        let mut wrong_version = bytes.clone();
        wrong_version[0] = 0x65;
        assert_eq!(
            Ipv4Packet::decode_from(&wrong_version),
            Err(Error::InvalidVersion(6))
        );

        let mut short_ihl = bytes.clone();
        short_ihl[0] = 0x44;
        assert!(matches!(
            Ipv4Packet::decode_from(&short_ihl),
            Err(Error::InvalidHeaderLength { header_len: 16, .. })
        ));

        assert!(matches!(
            Ipv4Packet::decode_from(&bytes[..22]),
            Err(Error::InvalidLength { length: 24, buffer_len: 22, .. })
        ));

        let mut corrupted = bytes.clone();
        corrupted[8] = 1; // TTL changed without fixing the checksum
        assert!(matches!(
            Ipv4Packet::decode_from(&corrupted),
            Err(Error::ChecksumMismatch { layer: "IPv4", .. })
        ));
    }
}
