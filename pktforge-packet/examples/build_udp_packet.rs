//! Example: Building a UDP packet
//!
//! This example demonstrates how to use the packet builder to construct a
//! DNS query carried in UDP over IPv4 over Ethernet.

use pktforge_core::MacAddr;
use pktforge_packet::PacketBuilder;
use std::net::Ipv4Addr;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let src_mac = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let dst_mac = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let src_ip = Ipv4Addr::new(192, 168, 1, 100);
    let dst_ip = Ipv4Addr::new(8, 8, 8, 8);

    // DNS query for google.com, type A
    let dns_query = vec![
        0x00, 0x02, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x67,
        0x6f, 0x6f, 0x67, 0x6c, 0x65, 0x03, 0x63, 0x6f, 0x6d, 0x00, 0x00, 0x01, 0x00, 0x01,
    ];

    let packet = PacketBuilder::new()
        .ethernet(src_mac, dst_mac)
        .ipv4(src_ip, dst_ip)
        .ttl(64)
        .udp(61626, 53)
        .payload(dns_query)
        .build()
        .expect("Failed to build UDP packet");

    println!("UDP packet built successfully!");
    println!("Total size: {} bytes", packet.len());

    for (i, chunk) in packet.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:04x}  {}", i * 16, hex.join(" "));
    }
}
