//! Packet builder for constructing network packets with a fluent API
//!
//! This module provides a high-level builder interface for constructing
//! complete packets from layer 2 (Ethernet) to layer 4 (TCP/UDP/ICMP). The
//! configured layers are created on [`PacketBuilder::build`] and composed
//! with the `|` operator, innermost first.

use crate::ethernet::{EtherType, EthernetFrame};
use crate::icmp::IcmpPacket;
use crate::ip::Ipv4Packet;
use crate::layer::Layer;
use crate::tcp::{TcpFlags, TcpOption, TcpPacket};
use crate::udp::UdpDatagram;
use pktforge_core::{AddressResolver, DefaultInterface, Error, MacAddr, Result};
use std::net::Ipv4Addr;

/// Layer 2 frame settings
#[derive(Debug, Clone)]
struct Layer2 {
    src: MacAddr,
    dst: MacAddr,
    ethertype: Option<EtherType>,
}

/// Layer 3 packet settings
#[derive(Debug, Clone)]
struct Layer3 {
    src: Ipv4Addr,
    dst: Ipv4Addr,
    ttl: u8,
    identification: u16,
}

/// Layer 4 segment/datagram/message settings
#[derive(Debug, Clone)]
enum Layer4 {
    Udp {
        src_port: u16,
        dst_port: u16,
    },
    Tcp {
        src_port: u16,
        dst_port: u16,
        seq: Option<u32>,
        ack: u32,
        flags: TcpFlags,
        window: u16,
        options: Vec<TcpOption>,
    },
    Icmp {
        icmp_type: u8,
        code: u8,
        contents: [u8; 4],
    },
}

/// Packet builder with fluent API for constructing network packets
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use pktforge_core::MacAddr;
/// use pktforge_packet::PacketBuilder;
///
/// let packet = PacketBuilder::new()
///     .ethernet(
///         MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
///         MacAddr::BROADCAST,
///     )
///     .ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2))
///     .udp(12345, 53)
///     .payload(vec![0x01, 0x02, 0x03, 0x04])
///     .build()
///     .unwrap();
///
/// assert_eq!(packet.len(), 14 + 20 + 8 + 4);
/// ```
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    layer2: Option<Layer2>,
    layer3: Option<Layer3>,
    layer4: Option<Layer4>,
    payload: Vec<u8>,
}

impl PacketBuilder {
    /// Create a new packet builder
    pub fn new() -> Self {
        PacketBuilder {
            layer2: None,
            layer3: None,
            layer4: None,
            payload: Vec::new(),
        }
    }

    /// Add an Ethernet layer
    ///
    /// An all-zero `src` is replaced with the default interface's MAC address
    /// when the packet is built.
    pub fn ethernet(mut self, src: MacAddr, dst: MacAddr) -> Self {
        self.layer2 = Some(Layer2 {
            src,
            dst,
            ethertype: None,
        });
        self
    }

    /// Set the EtherType explicitly
    ///
    /// Without it, an IPv4 layer sets 0x0800. Must be called after `ethernet()`.
    pub fn ethertype(mut self, new_ethertype: EtherType) -> Self {
        if let Some(Layer2 {
            ref mut ethertype, ..
        }) = self.layer2
        {
            *ethertype = Some(new_ethertype);
        }
        self
    }

    /// Add an IPv4 layer
    ///
    /// An unspecified `src` is replaced with the default interface's IPv4
    /// address when the packet is built.
    pub fn ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.layer3 = Some(Layer3 {
            src,
            dst,
            ttl: Ipv4Packet::DEFAULT_TTL,
            identification: 0,
        });
        self
    }

    /// Set the TTL for the IPv4 layer
    ///
    /// Must be called after `ipv4()`.
    pub fn ttl(mut self, new_ttl: u8) -> Self {
        if let Some(Layer3 { ref mut ttl, .. }) = self.layer3 {
            *ttl = new_ttl;
        }
        self
    }

    /// Set the identification for the IPv4 layer
    ///
    /// Must be called after `ipv4()`.
    pub fn identification(mut self, id: u16) -> Self {
        if let Some(Layer3 {
            ref mut identification,
            ..
        }) = self.layer3
        {
            *identification = id;
        }
        self
    }

    /// Add a UDP layer
    pub fn udp(mut self, src_port: u16, dst_port: u16) -> Self {
        self.layer4 = Some(Layer4::Udp { src_port, dst_port });
        self
    }

    /// Add a TCP layer
    ///
    /// The sequence number is random unless set with `sequence()`; the window
    /// defaults to 65535.
    pub fn tcp(mut self, src_port: u16, dst_port: u16, flags: TcpFlags) -> Self {
        self.layer4 = Some(Layer4::Tcp {
            src_port,
            dst_port,
            seq: None,
            ack: 0,
            flags,
            window: 65535,
            options: Vec::new(),
        });
        self
    }

    /// Set the TCP sequence number, zero included
    ///
    /// Must be called after `tcp()`.
    pub fn sequence(mut self, new_seq: u32) -> Self {
        if let Some(Layer4::Tcp { ref mut seq, .. }) = self.layer4 {
            *seq = Some(new_seq);
        }
        self
    }

    /// Set the TCP acknowledgment number
    ///
    /// Must be called after `tcp()`.
    pub fn ack(mut self, new_ack: u32) -> Self {
        if let Some(Layer4::Tcp { ref mut ack, .. }) = self.layer4 {
            *ack = new_ack;
        }
        self
    }

    /// Set the TCP window size
    ///
    /// Must be called after `tcp()`.
    pub fn window(mut self, new_window: u16) -> Self {
        if let Some(Layer4::Tcp { ref mut window, .. }) = self.layer4 {
            *window = new_window;
        }
        self
    }

    /// Set the TCP options
    ///
    /// Must be called after `tcp()`.
    pub fn tcp_options(mut self, new_options: Vec<TcpOption>) -> Self {
        if let Some(Layer4::Tcp {
            ref mut options, ..
        }) = self.layer4
        {
            *options = new_options;
        }
        self
    }

    /// Add an ICMP layer
    pub fn icmp(mut self, icmp_type: u8, code: u8, contents: [u8; 4]) -> Self {
        self.layer4 = Some(Layer4::Icmp {
            icmp_type,
            code,
            contents,
        });
        self
    }

    /// Set the payload data
    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// Build the complete packet, resolving unset source addresses through
    /// the host's default interface
    ///
    /// # Errors
    ///
    /// Returns `MissingLayer` if the layer configuration is incomplete (a
    /// transport layer without IPv4, or no layer at all), and any error of
    /// the layers themselves.
    pub fn build(self) -> Result<Vec<u8>> {
        self.build_with_resolver(&DefaultInterface)
    }

    /// Build the complete packet, resolving unset source addresses through `resolver`
    pub fn build_with_resolver<R>(mut self, resolver: &R) -> Result<Vec<u8>>
    where
        R: AddressResolver + ?Sized,
    {
        let payload = std::mem::take(&mut self.payload);

        let frame = match self.layer2 {
            Some(Layer2 {
                src,
                dst,
                ethertype,
            }) => {
                let mut frame = EthernetFrame::new_with_resolver(src, dst, resolver)?;
                frame.ethertype = ethertype;
                Some(frame)
            }
            None => None,
        };

        let ip = match self.layer3 {
            Some(Layer3 {
                src,
                dst,
                ttl,
                identification,
            }) => Some(
                Ipv4Packet::new_with_resolver(src, dst, resolver)?
                    .with_ttl(ttl)
                    .with_identification(identification),
            ),
            None => None,
        };

        let ip = match (self.layer4, ip) {
            (Some(_), None) => return Err(Error::MissingLayer("IPv4")),
            (None, ip) => ip.map(|ip| ip.with_payload(payload.clone())),
            (Some(Layer4::Udp { src_port, dst_port }), Some(ip)) => {
                Some((UdpDatagram::new(src_port, dst_port, payload.clone()) | ip)?)
            }
            (
                Some(Layer4::Tcp {
                    src_port,
                    dst_port,
                    seq,
                    ack,
                    flags,
                    window,
                    options,
                }),
                Some(ip),
            ) => {
                let mut tcp = TcpPacket::new(src_port, dst_port, flags, window)
                    .with_ack_number(ack)
                    .with_options(options)
                    .with_payload(payload.clone());
                if let Some(seq) = seq {
                    tcp = tcp.with_exact_sequence_number(seq);
                }
                Some((tcp | ip)?)
            }
            (
                Some(Layer4::Icmp {
                    icmp_type,
                    code,
                    contents,
                }),
                Some(ip),
            ) => {
                let icmp = IcmpPacket::new(icmp_type, code, contents).with_payload(payload.clone());
                Some((icmp | ip)?)
            }
        };

        match (frame, ip) {
            (Some(frame), Some(ip)) => (ip | frame)?.build(),
            (Some(frame), None) => frame.with_payload(payload).build(),
            (None, Some(ip)) => ip.build(),
            (None, None) => Err(Error::MissingLayer("Ethernet or IPv4")),
        }
    }
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}
