//! Example: Decoding a UDP datagram
//!
//! Parses a captured DNS query and prints its fields.

use pktforge_packet::prelude::*;
use pktforge_packet::UdpDatagram;

fn main() {
    let data = [
        0xf0, 0xba, 0x00, 0x35, 0x00, 0x24, 0x84, 0x92, 0x00, 0x02, 0x01, 0x00, 0x00, 0x01,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x67, 0x6f, 0x6f, 0x67, 0x6c, 0x65, 0x03,
        0x63, 0x6f, 0x6d, 0x00, 0x00, 0x01, 0x00, 0x01,
    ];

    match UdpDatagram::decode_from(&data) {
        Ok(datagram) => {
            println!("Source port: {}", datagram.source_port);
            println!("Destination port: {}", datagram.destination_port);
            println!("Checksum: 0x{:04x}", datagram.checksum);
            println!("Payload: {} bytes", datagram.payload.len());
        }
        Err(e) => {
            eprintln!("Failed to decode datagram: {}", e);
            std::process::exit(1);
        }
    }
}
