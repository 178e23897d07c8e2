//! Example: Building a TCP SYN packet
//!
//! This example demonstrates how to compose a TCP SYN segment with an IPv4
//! packet and an Ethernet frame using the `|` operator.

use pktforge_core::MacAddr;
use pktforge_packet::prelude::*;
use pktforge_packet::{EthernetFrame, Ipv4Packet, TcpFlags, TcpOption, TcpPacket};
use std::net::Ipv4Addr;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    // Network addresses
    let src_mac = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let dst_mac = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let src_ip = Ipv4Addr::new(192, 168, 1, 100);
    let dst_ip = Ipv4Addr::new(192, 168, 1, 1);

    let syn = TcpPacket::new(54321, 80, TcpFlags::SYN, 65535).with_options(vec![
        TcpOption::mss(1460),
        TcpOption::sack_permitted(),
        TcpOption::window_scale(7),
    ]);
    let sequence_number = syn.sequence_number;

    let ip = Ipv4Packet::new(src_ip, dst_ip).expect("Failed to create IPv4 packet");
    let frame = EthernetFrame::new(src_mac, dst_mac).expect("Failed to create Ethernet frame");

    let packet = (syn | ip)
        .and_then(|ip| ip | frame)
        .and_then(|frame| frame.build())
        .expect("Failed to build TCP SYN packet");

    println!("TCP SYN packet built successfully!");
    println!("Total size: {} bytes", packet.len());
    println!("Sequence number: {}", sequence_number);

    // Offset to TCP flags: Ethernet (14) + IPv4 (20) + 13
    let tcp_flags_byte = packet[47];
    println!("TCP flags byte: 0x{:02X}", tcp_flags_byte);
    println!("  SYN flag set: {}", (tcp_flags_byte & 0x02) != 0);

    let ip = Ipv4Packet::decode_from(&packet[EthernetFrame::HEADER_SIZE..])
        .expect("Failed to decode IPv4 packet");
    let tcp = TcpPacket::decode_verified(&ip.payload, src_ip, dst_ip)
        .expect("Failed to verify TCP segment");
    println!("Options: {:?}", tcp.options);
}
