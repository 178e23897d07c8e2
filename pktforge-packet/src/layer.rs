//! Layer abstraction and composition
//!
//! Every protocol layer implements [`Layer`] (serialize) and [`Decode`]
//! (parse). Layers that carry addressing and can host another layer's bytes
//! implement [`Intermediary`]. An inner layer becomes the payload of an outer
//! one through [`Encapsulate`], either with [`encapsulate`] or with the `|`
//! operator:
//!
//! ```
//! use std::net::Ipv4Addr;
//! use pktforge_packet::ip::Ipv4Packet;
//! use pktforge_packet::layer::Layer;
//! use pktforge_packet::tcp::{TcpFlags, TcpPacket};
//!
//! let ip = Ipv4Packet::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)).unwrap();
//! let tcp = TcpPacket::new(40000, 80, TcpFlags::SYN, 64240).with_exact_sequence_number(1);
//!
//! let bytes = (tcp | ip).unwrap().build().unwrap();
//! assert_eq!(bytes[9], 6);
//! ```

use pktforge_core::Result;
use tracing::trace;

/// A protocol layer that can serialize itself to wire bytes
pub trait Layer {
    /// Short protocol name used in errors and logs
    const NAME: &'static str;

    /// Serialize the layer, including its payload, into wire-format bytes
    fn build(&self) -> Result<Vec<u8>>;
}

/// A protocol layer that can be reconstructed from wire bytes
pub trait Decode: Sized {
    /// Parse a layer from `data`. The input is never modified.
    fn decode_from(data: &[u8]) -> Result<Self>;
}

/// A layer that carries addressing and a protocol field, and hosts the built
/// bytes of an inner layer as its payload
pub trait Intermediary: Layer {
    /// Address type of this layer (MAC, IPv4)
    type Address: Copy;
    /// Numbering used to name the payload protocol (EtherType, IP protocol)
    type Protocol: Copy;

    fn source_address(&self) -> Self::Address;

    fn destination_address(&self) -> Self::Address;

    /// Payload protocol, `None` while unset
    fn protocol(&self) -> Option<Self::Protocol>;

    fn set_protocol(&mut self, protocol: Self::Protocol);

    fn payload(&self) -> &[u8];

    fn set_payload(&mut self, payload: Vec<u8>);
}

/// A layer that can be embedded in the outer layer `O`
pub trait Encapsulate<O: Intermediary>: Layer {
    /// This layer's canonical protocol number in the outer layer's numbering
    fn protocol_number(&self) -> O::Protocol;

    /// Receive the outer layer's addresses before being built.
    ///
    /// Layers whose checksum covers a pseudo-header store them; the default
    /// ignores them.
    fn bind_addresses(&mut self, _source: O::Address, _destination: O::Address) {}
}

/// Embed `inner` as the payload of `outer`.
///
/// The outer layer's addresses are copied into the inner layer, the outer
/// protocol field keeps its value when already set and otherwise takes the
/// inner layer's canonical number, and the outer payload becomes the inner
/// layer's built bytes. The outer layer is returned, ready to be built or
/// encapsulated further.
pub fn encapsulate<I, O>(inner: &mut I, mut outer: O) -> Result<O>
where
    I: Encapsulate<O>,
    O: Intermediary,
{
    inner.bind_addresses(outer.source_address(), outer.destination_address());

    if outer.protocol().is_none() {
        outer.set_protocol(inner.protocol_number());
    }

    let payload = inner.build()?;
    trace!(
        "Encapsulated {} ({} bytes) in {}",
        I::NAME,
        payload.len(),
        O::NAME
    );
    outer.set_payload(payload);

    Ok(outer)
}

/// Implements `inner | outer` as [`encapsulate`]
macro_rules! impl_encapsulate_operator {
    ($inner:ty => $outer:ty) => {
        impl std::ops::BitOr<$outer> for $inner {
            type Output = pktforge_core::Result<$outer>;

            fn bitor(mut self, outer: $outer) -> Self::Output {
                $crate::layer::encapsulate(&mut self, outer)
            }
        }
    };
}

pub(crate) use impl_encapsulate_operator;

#[cfg(test)]
mod tests {
    use super::*;
    use pktforge_core::Error;

    /// Minimal outer layer: one-byte protocol header followed by the payload
    #[derive(Debug, Default)]
    struct Envelope {
        source: u8,
        destination: u8,
        protocol: Option<u8>,
        payload: Vec<u8>,
    }

    impl Layer for Envelope {
        const NAME: &'static str = "Envelope";

        fn build(&self) -> Result<Vec<u8>> {
            let mut bytes = vec![self.protocol.unwrap_or(0)];
            bytes.extend_from_slice(&self.payload);
            Ok(bytes)
        }
    }

    impl Intermediary for Envelope {
        type Address = u8;
        type Protocol = u8;

        fn source_address(&self) -> u8 {
            self.source
        }

        fn destination_address(&self) -> u8 {
            self.destination
        }

        fn protocol(&self) -> Option<u8> {
            self.protocol
        }

        fn set_protocol(&mut self, protocol: u8) {
            self.protocol = Some(protocol);
        }

        fn payload(&self) -> &[u8] {
            &self.payload
        }

        fn set_payload(&mut self, payload: Vec<u8>) {
            self.payload = payload;
        }
    }

    #[derive(Debug, Default)]
    struct Letter {
        addresses: Option<(u8, u8)>,
        fail: bool,
    }

    impl Layer for Letter {
        const NAME: &'static str = "Letter";

        fn build(&self) -> Result<Vec<u8>> {
            if self.fail {
                return Err(Error::TcpHeaderTooLong(64));
            }
            let (src, dst) = self.addresses.unwrap_or_default();
            Ok(vec![src, dst])
        }
    }

    impl Encapsulate<Envelope> for Letter {
        fn protocol_number(&self) -> u8 {
            42
        }

        fn bind_addresses(&mut self, source: u8, destination: u8) {
            self.addresses = Some((source, destination));
        }
    }

    #[test]
    fn test_encapsulate_sets_unset_protocol() {
        let mut letter = Letter::default();
        let envelope = Envelope {
            source: 1,
            destination: 2,
            ..Default::default()
        };

        let envelope = encapsulate(&mut letter, envelope).unwrap();
        assert_eq!(envelope.protocol(), Some(42));
        assert_eq!(envelope.payload(), &[1, 2]);
        assert_eq!(letter.addresses, Some((1, 2)));
        assert_eq!(envelope.build().unwrap(), vec![42, 1, 2]);
    }

    #[test]
    fn test_encapsulate_keeps_explicit_protocol() {
        let mut letter = Letter::default();
        let envelope = Envelope {
            protocol: Some(7),
            ..Default::default()
        };

        let envelope = encapsulate(&mut letter, envelope).unwrap();
        assert_eq!(envelope.protocol(), Some(7));
    }

    #[test]
    fn test_encapsulate_propagates_build_error() {
        let mut letter = Letter {
            fail: true,
            ..Default::default()
        };
        let result = encapsulate(&mut letter, Envelope::default());
        assert_eq!(result.unwrap_err(), Error::TcpHeaderTooLong(64));
    }
}
