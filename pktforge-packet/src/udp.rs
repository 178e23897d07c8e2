//! UDP datagram construction and parsing
//!
//! This module provides functionality for building and parsing UDP datagrams,
//! including header construction and checksum calculation.

use crate::checksum::{write_checksum, PseudoHeader};
use crate::endian::read_u16;
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::layer::{impl_encapsulate_operator, Decode, Encapsulate, Layer};
use bytes::{BufMut, BytesMut};
use pktforge_core::{resolve_ipv4, AddressResolver, DefaultInterface, Error, Result};
use std::net::Ipv4Addr;

/// UDP datagram
///
/// The length field is derived from the payload when the datagram is built.
/// Like [`TcpPacket`](crate::tcp::TcpPacket), the addresses only feed the
/// pseudo-header checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Checksum as found on the wire
    pub checksum: u16,
    /// Payload data
    pub payload: Vec<u8>,
    pub source_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
}

impl UdpDatagram {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Create a new UDP datagram
    pub fn new(source_port: u16, destination_port: u16, payload: Vec<u8>) -> Self {
        UdpDatagram {
            source_port,
            destination_port,
            checksum: 0,
            payload,
            source_address: Ipv4Addr::UNSPECIFIED,
            destination_address: Ipv4Addr::UNSPECIFIED,
        }
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

    /// Get the total datagram size in bytes
    pub fn len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Parse a UDP datagram and validate its checksum against the
    /// pseudo-header built from `source` and `destination`.
    ///
    /// A wire checksum of zero means the sender computed none, and is accepted.
    pub fn decode_verified(data: &[u8], source: Ipv4Addr, destination: Ipv4Addr) -> Result<Self> {
        let mut datagram = Self::decode_from(data)?;

        if datagram.checksum != 0 {
            let datagram_bytes = &data[..datagram.len()];
            let pseudo = PseudoHeader::new(
                Self::NAME,
                source,
                destination,
                IpProtocol::UDP.to_u8(),
                datagram_bytes.len(),
            )?;
            if pseudo.checksum(datagram_bytes) != 0 {
                let mut zeroed = datagram_bytes.to_vec();
                write_checksum(&mut zeroed, 6, 0);
                return Err(Error::ChecksumMismatch {
                    layer: Self::NAME,
                    found: datagram.checksum,
                    computed: pseudo.checksum(&zeroed),
                });
            }
        }

        datagram.source_address = source;
        datagram.destination_address = destination;
        Ok(datagram)
    }
}

impl Layer for UdpDatagram {
    const NAME: &'static str = "UDP";

    fn build(&self) -> Result<Vec<u8>> {
        let pseudo = PseudoHeader::new(
            Self::NAME,
            self.source_address,
            self.destination_address,
            IpProtocol::UDP.to_u8(),
            self.len(),
        )?;

        let mut buffer = BytesMut::with_capacity(self.len());

        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        // Fits: the pseudo-header accepted the same length
        buffer.put_u16(pseudo.length);
        buffer.put_u16(0);
        buffer.put_slice(&self.payload);

        // Zero means "no checksum" on the wire
        let checksum = match pseudo.checksum(&buffer) {
            0 => 0xFFFF,
            checksum => checksum,
        };
        write_checksum(&mut buffer, 6, checksum);

        Ok(buffer.to_vec())
    }
}

impl Decode for UdpDatagram {
    /// Parse a UDP datagram.
    ///
    /// The payload ends at the length field; trailing bytes are ignored. The
    /// checksum is recorded but not validated, see
    /// [`UdpDatagram::decode_verified`].
    fn decode_from(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                layer: Self::NAME,
                expected: Self::HEADER_SIZE,
                actual: data.len(),
            });
        }

        let length = read_u16(data, 4) as usize;
        if length < Self::HEADER_SIZE || length > data.len() {
            return Err(Error::InvalidLength {
                layer: Self::NAME,
                length,
                buffer_len: data.len(),
            });
        }

        Ok(UdpDatagram {
            source_port: read_u16(data, 0),
            destination_port: read_u16(data, 2),
            checksum: read_u16(data, 6),
            payload: data[Self::HEADER_SIZE..length].to_vec(),
            source_address: Ipv4Addr::UNSPECIFIED,
            destination_address: Ipv4Addr::UNSPECIFIED,
        })
    }
}

impl Encapsulate<Ipv4Packet> for UdpDatagram {
    fn protocol_number(&self) -> IpProtocol {
        IpProtocol::UDP
    }

    fn bind_addresses(&mut self, source: Ipv4Addr, destination: Ipv4Addr) {
        self.source_address = source;
        self.destination_address = destination;
    }
}

impl_encapsulate_operator!(UdpDatagram => Ipv4Packet);
