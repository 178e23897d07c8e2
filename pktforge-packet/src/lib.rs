//! Packet construction and parsing library
//!
//! This crate builds wire-format bytes for Ethernet II, IPv4, TCP, UDP and
//! ICMP, and reconstructs structured packets from raw bytes. It includes
//! support for:
//!
//! - **IPv4** packets with header checksum and options
//! - **TCP** segments with flags, options and pseudo-header checksum
//! - **UDP** datagrams with pseudo-header checksum
//! - **ICMP** messages (echo, destination unreachable, ...)
//! - **Ethernet II** frames
//!
//! # Architecture
//!
//! - [`layer`] - `Layer`/`Decode` traits and layer composition
//! - [`builder`] - High-level fluent API for packet construction
//! - [`ethernet`], [`ip`], [`tcp`], [`udp`], [`icmp`] - the protocol layers
//! - [`checksum`] - Internet checksum and pseudo-header
//! - [`endian`] - Network byte order helpers
//!
//! # Quick Start
//!
//! ## Composing layers
//!
//! An inner layer is placed in an outer one with `|`. The outer layer's
//! addresses feed the inner layer's checksum and, unless already set, its
//! protocol field is filled in:
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use pktforge_packet::prelude::*;
//! use pktforge_packet::{IpProtocol, Ipv4Packet, TcpFlags, TcpOption, TcpPacket};
//!
//! let src = Ipv4Addr::new(192, 168, 1, 1);
//! let dst = Ipv4Addr::new(192, 168, 1, 2);
//!
//! let syn = TcpPacket::new(54321, 80, TcpFlags::SYN, 64240)
//!     .with_options(vec![TcpOption::mss(1460)]);
//! let packet = (syn | Ipv4Packet::new(src, dst).unwrap()).unwrap();
//! assert_eq!(packet.protocol, Some(IpProtocol::TCP));
//!
//! let bytes = packet.build().unwrap();
//! let decoded = Ipv4Packet::decode_from(&bytes).unwrap();
//! let tcp = TcpPacket::decode_verified(&decoded.payload, src, dst).unwrap();
//! assert_eq!(tcp.options, vec![TcpOption::mss(1460)]);
//! ```
//!
//! ## Building a UDP packet
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use pktforge_core::MacAddr;
//! use pktforge_packet::PacketBuilder;
//!
//! let packet = PacketBuilder::new()
//!     .ethernet(MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]), MacAddr::BROADCAST)
//!     .ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2))
//!     .udp(12345, 53) // DNS query
//!     .payload(vec![/* DNS query data */])
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Parsing
//!
//! ```rust
//! use pktforge_packet::prelude::*;
//! use pktforge_packet::UdpDatagram;
//!
//! let data = [
//!     0xf0, 0xba, 0x00, 0x35, 0x00, 0x0c, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef,
//! ];
//! let datagram = UdpDatagram::decode_from(&data).unwrap();
//! assert_eq!(datagram.source_port, 61626);
//! assert_eq!(datagram.payload, vec![0xde, 0xad, 0xbe, 0xef]);
//! ```
//!
//! Unspecified source addresses (`0.0.0.0`, `00:00:00:00:00:00`) are replaced
//! with those of the host's default interface, see
//! [`pktforge_core::AddressResolver`].

pub mod builder;
pub mod checksum;
pub mod endian;
pub mod ethernet;
pub mod icmp;
pub mod ip;
pub mod layer;
pub mod tcp;
pub mod udp;

// Re-export commonly used types for convenience
pub use builder::PacketBuilder;
pub use checksum::{internet_checksum, transport_checksum, validate_checksum, PseudoHeader};
pub use ethernet::{EtherType, EthernetFrame};
pub use icmp::IcmpPacket;
pub use ip::{IpFlags, IpProtocol, Ipv4Packet, TypeOfService};
pub use layer::encapsulate;
pub use tcp::{TcpFlags, TcpOption, TcpPacket};
pub use udp::UdpDatagram;

/// The layer traits, for calling `build`, `decode_from` and friends
pub mod prelude {
    pub use crate::layer::{Decode, Encapsulate, Intermediary, Layer};
}
