//! Big-endian (network order) byte utilities
//!
//! These are defined with shifts, so the result never depends on the host's
//! native byte order.

/// Unsigned integers that can be split into network-order bytes
pub trait SplitBytes: Copy {
    /// `[u8; N]` where `N` is the width of the integer in bytes
    type Bytes: AsRef<[u8]>;

    /// Most-significant byte first
    fn split_be(self) -> Self::Bytes;
}

macro_rules! impl_split_bytes {
    ($($ty:ty),*) => {$(
        impl SplitBytes for $ty {
            type Bytes = [u8; std::mem::size_of::<$ty>()];

            #[inline]
            fn split_be(self) -> Self::Bytes {
                const N: usize = std::mem::size_of::<$ty>();
                let mut bytes = [0u8; N];
                for (i, byte) in bytes.iter_mut().enumerate() {
                    *byte = ((self >> (8 * (N - 1 - i))) & 0xFF) as u8;
                }
                bytes
            }
        }
    )*};
}

impl_split_bytes!(u8, u16, u32, u64);

/// Split `x` into its big-endian byte sequence
#[inline]
pub fn split_bytes_be<T: SplitBytes>(x: T) -> T::Bytes {
    x.split_be()
}

/// Combine two big-endian bytes into a u16
#[inline]
pub fn combine_u16(b0: u8, b1: u8) -> u16 {
    (u16::from(b0) << 8) | u16::from(b1)
}

/// Combine four big-endian bytes into a u32
#[inline]
pub fn combine_u32(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    (u32::from(b0) << 24) | (u32::from(b1) << 16) | (u32::from(b2) << 8) | u32::from(b3)
}

/// Read a big-endian u16 at `offset`; callers check bounds
#[inline]
pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    combine_u16(data[offset], data[offset + 1])
}

/// Read a big-endian u32 at `offset`; callers check bounds
#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    combine_u32(
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_widths() {
        assert_eq!(split_bytes_be(0xABu8), [0xAB]);
        assert_eq!(split_bytes_be(0x1234u16), [0x12, 0x34]);
        assert_eq!(split_bytes_be(0xDEADBEEFu32), [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(
            split_bytes_be(0x0102030405060708u64),
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_split_matches_to_be_bytes() {
        for value in [0u32, 1, 0x80, 0xFF00, 0x00FF_FF00, u32::MAX] {
            assert_eq!(split_bytes_be(value), value.to_be_bytes());
        }
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine_u16(0xf0, 0xba), 61626);
        assert_eq!(combine_u16(0x00, 0x35), 53);
        assert_eq!(combine_u32(0xDE, 0xAD, 0xBE, 0xEF), 0xDEADBEEF);

        let [a, b, c, d] = split_bytes_be(3_000_000_000u32);
        assert_eq!(combine_u32(a, b, c, d), 3_000_000_000);
    }

    #[test]
    fn test_read_helpers() {
        let data = [0x00, 0x12, 0x34, 0x56, 0x78];
        assert_eq!(read_u16(&data, 1), 0x1234);
        assert_eq!(read_u32(&data, 1), 0x12345678);
    }
}
