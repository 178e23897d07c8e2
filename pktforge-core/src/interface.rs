//! Network interface lookup and default address resolution
//!
//! Layers that are constructed without a source address ask an
//! [`AddressResolver`] for the local default. [`DefaultInterface`] answers from
//! the host's interface table; [`StaticAddresses`] answers with fixed values.

use crate::{Error, MacAddr, Result};
use pnet_datalink::NetworkInterface;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::debug;

/// Source of the local default MAC and IPv4 addresses
pub trait AddressResolver {
    /// MAC address of the default interface
    fn default_mac(&self) -> Result<MacAddr>;

    /// IPv4 address of the default interface
    fn default_ipv4(&self) -> Result<Ipv4Addr>;
}

/// Network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Interface name (e.g., "eth0", "en0")
    pub name: String,
    /// Interface index
    pub index: u32,
    /// MAC address, zero if the interface has none
    pub mac_address: MacAddr,
    /// IPv4 addresses assigned to the interface
    pub ipv4_addresses: Vec<Ipv4Addr>,
    /// Is interface up?
    pub is_up: bool,
    /// Is interface a loopback?
    pub is_loopback: bool,
}

impl From<&NetworkInterface> for Interface {
    fn from(iface: &NetworkInterface) -> Self {
        let mac_address = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]))
            .unwrap_or(MacAddr::ZERO);

        let ipv4_addresses = iface
            .ips
            .iter()
            .filter_map(|network| match network {
                ipnetwork::IpNetwork::V4(net) => Some(net.ip()),
                ipnetwork::IpNetwork::V6(_) => None,
            })
            .collect();

        Self {
            name: iface.name.clone(),
            index: iface.index,
            mac_address,
            ipv4_addresses,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl Interface {
    /// Get interface by name
    pub fn by_name(name: &str) -> Result<Self> {
        pnet_datalink::interfaces()
            .iter()
            .find(|iface| iface.name == name)
            .map(Interface::from)
            .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
    }

    /// List all available interfaces
    pub fn list_all() -> Vec<Self> {
        pnet_datalink::interfaces()
            .iter()
            .map(Interface::from)
            .collect()
    }

    /// Whether the interface can stand in as the default for outgoing packets
    pub fn is_candidate(&self) -> bool {
        self.is_up && !self.is_loopback
    }

    /// Get the first IPv4 address of this interface
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4_addresses.first().copied()
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.mac_address)?;
        if let Some(ip) = self.primary_ipv4() {
            write!(f, " {ip}")?;
        }
        Ok(())
    }
}

/// First up, non-loopback interface with a usable MAC address
pub fn default_mac_in(interfaces: &[Interface]) -> Result<MacAddr> {
    interfaces
        .iter()
        .find(|iface| iface.is_candidate() && !iface.mac_address.is_zero())
        .map(|iface| {
            debug!("Default MAC {} from interface {}", iface.mac_address, iface.name);
            iface.mac_address
        })
        .ok_or(Error::NoDefaultInterface("MAC"))
}

/// First up, non-loopback interface with an IPv4 address
pub fn default_ipv4_in(interfaces: &[Interface]) -> Result<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|iface| iface.is_candidate())
        .find_map(|iface| {
            let ip = iface.primary_ipv4()?;
            debug!("Default IPv4 {} from interface {}", ip, iface.name);
            Some(ip)
        })
        .ok_or(Error::NoDefaultInterface("IPv4"))
}

/// Resolver backed by the host interface table
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInterface;

impl AddressResolver for DefaultInterface {
    fn default_mac(&self) -> Result<MacAddr> {
        default_mac_in(&Interface::list_all())
    }

    fn default_ipv4(&self) -> Result<Ipv4Addr> {
        default_ipv4_in(&Interface::list_all())
    }
}

/// Resolver that always answers with the same addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAddresses {
    pub mac: Option<MacAddr>,
    pub ipv4: Option<Ipv4Addr>,
}

impl StaticAddresses {
    pub fn new(mac: MacAddr, ipv4: Ipv4Addr) -> Self {
        Self {
            mac: Some(mac),
            ipv4: Some(ipv4),
        }
    }

    /// Resolver with no addresses; every lookup fails
    pub fn none() -> Self {
        Self {
            mac: None,
            ipv4: None,
        }
    }
}

impl AddressResolver for StaticAddresses {
    fn default_mac(&self) -> Result<MacAddr> {
        self.mac.ok_or(Error::NoDefaultInterface("MAC"))
    }

    fn default_ipv4(&self) -> Result<Ipv4Addr> {
        self.ipv4.ok_or(Error::NoDefaultInterface("IPv4"))
    }
}

/// MAC address of the host's default interface
pub fn default_interface_mac() -> Result<MacAddr> {
    DefaultInterface.default_mac()
}

/// IPv4 address of the host's default interface
pub fn default_interface_ipv4() -> Result<Ipv4Addr> {
    DefaultInterface.default_ipv4()
}

/// Return `address`, or the resolver's default when it is unspecified
pub fn resolve_ipv4<R>(address: Ipv4Addr, resolver: &R) -> Result<Ipv4Addr>
where
    R: AddressResolver + ?Sized,
{
    if address.is_unspecified() {
        resolver.default_ipv4()
    } else {
        Ok(address)
    }
}

/// Return `address`, or the resolver's default when it is all-zero
pub fn resolve_mac<R>(address: MacAddr, resolver: &R) -> Result<MacAddr>
where
    R: AddressResolver + ?Sized,
{
    if address.is_zero() {
        resolver.default_mac()
    } else {
        Ok(address)
    }
}
