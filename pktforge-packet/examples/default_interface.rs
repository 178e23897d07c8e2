//! Example: Default interface addresses
//!
//! Lists the host's interfaces and shows which MAC and IPv4 address fill in
//! unset source addresses. Run with `RUST_LOG=debug` to see the selection.

use pktforge_core::{default_interface_ipv4, default_interface_mac, Interface};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Interfaces:");
    for interface in Interface::list_all() {
        println!("  {}", interface);
    }
    println!();

    match default_interface_mac() {
        Ok(mac) => println!("Default MAC:  {}", mac),
        Err(e) => println!("Default MAC:  unavailable ({})", e),
    }

    match default_interface_ipv4() {
        Ok(ip) => println!("Default IPv4: {}", ip),
        Err(e) => println!("Default IPv4: unavailable ({})", e),
    }
}
