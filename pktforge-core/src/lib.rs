//! pktforge Core Library
//!
//! This crate provides the error taxonomy, the address types and the
//! default-interface address resolution shared by the pktforge layers.

pub mod error;
pub mod interface;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use interface::{
    default_interface_ipv4, default_interface_mac, resolve_ipv4, resolve_mac, AddressResolver,
    DefaultInterface, Interface, StaticAddresses,
};
pub use types::{ipv4_from_slice, MacAddr};
