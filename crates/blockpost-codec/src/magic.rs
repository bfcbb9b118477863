//! Double-VByte pair codec.
//!
//! Co-encodes a `(docgap, freq)` pair by folding small frequencies into the
//! gap value: with threshold `F`, a pair with `freq < F` becomes the single
//! value `(docgap - 1) * F + freq`, and anything else falls back to two
//! fields, `docgap * F` followed by `freq - F + 1`. The decoder recovers the
//! branch from the residue mod `F`: non-zero means the compact form.
//!
//! Skewed postings distributions make the compact branch the common case,
//! saving a byte per posting relative to two independent VBytes.
//!
//! Gaps are always at least 1. Frequencies must be at least 1 to round-trip:
//! a compact encoding of freq 0 would land on residue 0, which is the
//! two-field discriminant. The builder never produces a zero frequency.

use crate::vbyte;

/// Frequency threshold below which a pair collapses into one value.
pub const MAGIC_F: u32 = 4;

/// Encode `(docgap, freq)` into the front of `buf`, returning the number of
/// bytes written. `docgap` must be at least 1.
pub fn encode_pair(docgap: u32, freq: u32, buf: &mut [u8]) -> usize {
    if freq < MAGIC_F {
        vbyte::encode((docgap - 1) * MAGIC_F + freq, buf)
    } else {
        let first = vbyte::encode(docgap * MAGIC_F, buf);
        first + vbyte::encode(freq - MAGIC_F + 1, &mut buf[first..])
    }
}

/// Decode a `(docgap, freq)` pair from the front of `buf`, returning
/// `(docgap, freq, stride)`.
///
/// Requires `freq >= 1` at encode time; see the module docs.
pub fn decode_pair(buf: &[u8]) -> (u32, u32, usize) {
    let (decoded, mut stride) = vbyte::decode(buf);
    if decoded % MAGIC_F > 0 {
        (1 + decoded / MAGIC_F, decoded % MAGIC_F, stride)
    } else {
        let (tail, tail_stride) = vbyte::decode(&buf[stride..]);
        stride += tail_stride;
        (decoded / MAGIC_F, MAGIC_F + tail - 1, stride)
    }
}

/// Exact byte cost of [`encode_pair`] for `(docgap, freq)`.
pub fn bytes_required(docgap: u32, freq: u32) -> usize {
    if freq < MAGIC_F {
        vbyte::bytes_required((docgap - 1) * MAGIC_F + freq)
    } else {
        vbyte::bytes_required(docgap * MAGIC_F) + vbyte::bytes_required(freq - MAGIC_F + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn compact_branch_bytes() {
        let mut buf = [0u8; 10];
        assert_eq!(encode_pair(1, 0, &mut buf), 1);
        assert_eq!(buf[0], 0x00);
        assert_eq!(encode_pair(1, 3, &mut buf), 1);
        assert_eq!(buf[0], 0x03);
        assert_eq!(encode_pair(2, 0, &mut buf), 1);
        assert_eq!(buf[0], 0x04);
    }

    #[test]
    fn two_field_branch_bytes() {
        let mut buf = [0u8; 10];
        assert_eq!(encode_pair(1, 4, &mut buf), 2);
        assert_eq!(&buf[..2], &[0x04, 0x01]);
    }

    #[test]
    fn decode_recovers_both_branches() {
        let mut buf = [0u8; 10];
        let n = encode_pair(7, 2, &mut buf);
        assert_eq!(decode_pair(&buf), (7, 2, n));
        let n = encode_pair(7, 9, &mut buf);
        assert_eq!(decode_pair(&buf), (7, 9, n));
    }

    proptest! {
        #[test]
        fn roundtrip(docgap in 1u32..100_000_000, freq in 1u32..1_000_000) {
            let mut buf = [0u8; 10];
            let written = encode_pair(docgap, freq, &mut buf);
            prop_assert_eq!(written, bytes_required(docgap, freq));
            let (d, f, stride) = decode_pair(&buf);
            prop_assert_eq!((d, f), (docgap, freq));
            prop_assert_eq!(stride, written);
        }
    }
}
