//! Checksum calculations for network packets
//!
//! This module provides the Internet Checksum (RFC 1071) used in IPv4, TCP,
//! UDP and ICMP headers, and the pseudo-header that TCP and UDP prepend to it.

use crate::endian::split_bytes_be;
use pktforge_core::{Error, Result};
use std::net::Ipv4Addr;

/// Calculates the Internet Checksum as defined in RFC 1071.
///
/// The data is summed as big-endian 16-bit words (an odd trailing byte is
/// padded with a zero low byte), carries are folded back into the low 16 bits
/// until none remain, and the ones' complement of the result is returned.
/// An empty or all-zero buffer yields `0xFFFF`.
///
/// # Examples
///
/// ```
/// use pktforge_packet::checksum::internet_checksum;
///
/// let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
/// assert_eq!(internet_checksum(&data), 0x220d);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold(accumulate(data))
}

/// Sum of 16-bit words, unfolded
fn accumulate(data: &[u8]) -> u64 {
    let mut sum: u64 = 0;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u64::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }

    // Handle odd byte if present
    if let Some(&byte) = chunks.remainder().first() {
        sum += u64::from(byte) << 8;
    }

    sum
}

fn fold(mut sum: u64) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Validates an Internet checksum.
///
/// The sum over data that already contains its checksum folds to `0xFFFF`,
/// so the complemented result is zero.
pub fn validate_checksum(data: &[u8]) -> bool {
    internet_checksum(data) == 0
}

/// The 12-byte IPv4 pseudo-header prepended to TCP and UDP segments for
/// checksum computation. It is never transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoHeader {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub protocol: u8,
    pub length: u16,
}

impl PseudoHeader {
    pub const SIZE: usize = 12;

    /// Create the pseudo-header for a segment of `segment_len` bytes.
    ///
    /// Fails with `SegmentTooLargeForPseudoHeader` when the length does not
    /// fit the 16-bit length field.
    pub fn new(
        layer: &'static str,
        source: Ipv4Addr,
        destination: Ipv4Addr,
        protocol: u8,
        segment_len: usize,
    ) -> Result<Self> {
        let length = u16::try_from(segment_len).map_err(|_| {
            Error::SegmentTooLargeForPseudoHeader {
                layer,
                length: segment_len,
            }
        })?;

        Ok(PseudoHeader {
            source,
            destination,
            protocol,
            length,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.source.octets());
        bytes[4..8].copy_from_slice(&self.destination.octets());
        bytes[8] = 0;
        bytes[9] = self.protocol;
        bytes[10..12].copy_from_slice(&split_bytes_be(self.length));
        bytes
    }

    /// Checksum of this pseudo-header followed by `segment`
    pub fn checksum(&self, segment: &[u8]) -> u16 {
        let sum = accumulate(&self.to_bytes()) + accumulate(segment);
        !fold(sum)
    }
}

/// Calculates the checksum for a TCP or UDP segment including the pseudo-header.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use pktforge_packet::checksum::transport_checksum;
///
/// let segment = [0x00, 0x35, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00];
/// let checksum = transport_checksum(
///     Ipv4Addr::new(192, 168, 1, 1),
///     Ipv4Addr::new(192, 168, 1, 2),
///     17,
///     &segment,
/// )
/// .unwrap();
/// assert_ne!(checksum, 0);
/// ```
pub fn transport_checksum(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: u8,
    segment: &[u8],
) -> Result<u16> {
    let pseudo = PseudoHeader::new("transport", source, destination, protocol, segment.len())?;
    Ok(pseudo.checksum(segment))
}

/// Writes `checksum` big-endian at `offset`
pub(crate) fn write_checksum(data: &mut [u8], offset: usize, checksum: u16) {
    data[offset..offset + 2].copy_from_slice(&split_bytes_be(checksum));
}
