//! Ethernet frame construction and parsing
//!
//! This module provides functionality for building and parsing Ethernet II
//! frames. Frames are built without FCS and without minimum-size padding;
//! both are added by whatever puts the frame on the wire.

use crate::endian::read_u16;
use crate::ip::Ipv4Packet;
use crate::layer::{impl_encapsulate_operator, Decode, Encapsulate, Intermediary, Layer};
use bytes::{BufMut, BytesMut};
use pktforge_core::{resolve_mac, AddressResolver, DefaultInterface, Error, MacAddr, Result};
use std::fmt;

/// Common EtherType values used in Ethernet II frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// MPLS unicast (0x8847)
    MPLS,
    /// LLDP (0x88CC)
    LLDP,
    /// Q-in-Q/802.1ad (0x88A8)
    QinQ,
    /// Custom EtherType
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::VLAN => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::MPLS => 0x8847,
            EtherType::LLDP => 0x88CC,
            EtherType::QinQ => 0x88A8,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x8100 => EtherType::VLAN,
            0x86DD => EtherType::IPv6,
            0x8847 => EtherType::MPLS,
            0x88CC => EtherType::LLDP,
            0x88A8 => EtherType::QinQ,
            val => EtherType::Custom(val),
        }
    }

    /// EtherType field as decode sees it, with 0 meaning unset
    pub fn field_value(value: u16) -> Option<Self> {
        match value {
            0 => None,
            value => Some(EtherType::from_u16(value)),
        }
    }
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        EtherType::from_u16(value)
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::MPLS => write!(f, "MPLS"),
            EtherType::LLDP => write!(f, "LLDP"),
            EtherType::QinQ => write!(f, "Q-in-Q"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Ethernet II frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType, `None` until set or filled in by encapsulation
    pub ethertype: Option<EtherType>,
    /// Payload data
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    /// Create a new Ethernet frame.
    ///
    /// An all-zero source is replaced with the MAC address of the host's
    /// default interface.
    pub fn new(source: MacAddr, destination: MacAddr) -> Result<Self> {
        Self::new_with_resolver(source, destination, &DefaultInterface)
    }

    /// Create a new Ethernet frame, resolving an all-zero source through `resolver`
    pub fn new_with_resolver<R>(source: MacAddr, destination: MacAddr, resolver: &R) -> Result<Self>
    where
        R: AddressResolver + ?Sized,
    {
        Ok(EthernetFrame {
            destination,
            source: resolve_mac(source, resolver)?,
            ethertype: None,
            payload: Vec::new(),
        })
    }

    pub fn with_ethertype(mut self, ethertype: EtherType) -> Self {
        self.ethertype = EtherType::field_value(ethertype.to_u16());
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Get the total frame size in bytes
    pub fn len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// Check if the frame is empty (never true, the header is always present)
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Layer for EthernetFrame {
    const NAME: &'static str = "Ethernet";

    fn build(&self) -> Result<Vec<u8>> {
        let mut buffer = BytesMut::with_capacity(self.len());

        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.map_or(0, EtherType::to_u16));
        buffer.put_slice(&self.payload);

        Ok(buffer.to_vec())
    }
}

impl Decode for EthernetFrame {
    fn decode_from(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::HeaderTooShort {
                layer: Self::NAME,
                expected: Self::HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);

        let ethertype = EtherType::field_value(read_u16(data, 12));

        Ok(EthernetFrame {
            destination: MacAddr(destination),
            source: MacAddr(source),
            ethertype,
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }
}

impl Intermediary for EthernetFrame {
    type Address = MacAddr;
    type Protocol = EtherType;

    fn source_address(&self) -> MacAddr {
        self.source
    }

    fn destination_address(&self) -> MacAddr {
        self.destination
    }

    fn protocol(&self) -> Option<EtherType> {
        self.ethertype
    }

    fn set_protocol(&mut self, protocol: EtherType) {
        self.ethertype = EtherType::field_value(protocol.to_u16());
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }
}

impl Encapsulate<EthernetFrame> for Ipv4Packet {
    fn protocol_number(&self) -> EtherType {
        EtherType::IPv4
    }
}

impl_encapsulate_operator!(Ipv4Packet => EthernetFrame);
