//! 160-bit identifiers and the XOR distance metric.
//!
//! Node ids and DHT keys share one id space: a 160-bit unsigned integer
//! derived from a UTF-8 string via SHA-1. Distance between two ids is their
//! bitwise XOR, interpreted as a 160-bit unsigned integer.

use std::fmt;

use sha1::{Digest, Sha1};

/// Number of bits in an [`Id`].
pub const ID_BITS: usize = 160;

/// A 160-bit identifier, stored big-endian (most significant byte first).
///
/// Both node ids and DHT keys live in this space. Equality and ordering are
/// byte-wise, which matches unsigned big-endian integer comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; 20]);

impl Id {
    /// Wrap raw big-endian bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw big-endian bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive an id from a UTF-8 string by SHA-1.
    pub fn hash(s: &str) -> Self {
        let digest = Sha1::digest(s.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// XOR distance between two ids. A metric: symmetric, zero iff equal,
    /// and satisfies the XOR triangle inequality.
    pub fn distance(&self, other: &Id) -> Id {
        let mut out = [0u8; 20];
        for i in 0..20 {
            out[i] = self.0[i] ^ other.0[i];
        }
        Id(out)
    }

    /// Number of bits needed to represent this id (Python's `int.bit_length`):
    /// the position of the highest set bit, plus one. Zero for the zero id.
    pub fn bit_length(&self) -> usize {
        for (byte_index, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                let leading = byte.leading_zeros() as usize;
                let bit_in_byte = 8 - leading;
                return (20 - byte_index - 1) * 8 + bit_in_byte;
            }
        }
        0
    }

    /// Zero-based bucket index for `other` relative to `self`, following
    /// `ID_BITS - bitlen(self XOR other) - 1`.
    ///
    /// When the two ids differ in their top bit, `bit_length() == ID_BITS`
    /// and the formula lands on `-1`. The Python original relies on
    /// `buckets[-1]` resolving to the last bucket; `rem_euclid` ports that
    /// wraparound explicitly rather than underflowing `usize`.
    ///
    /// Returns `None` when `self == other` (the formula is undefined there;
    /// callers must never insert their own id into a routing table).
    pub fn bucket_index(&self, other: &Id) -> Option<usize> {
        let distance = self.distance(other);
        if distance.0 == [0u8; 20] {
            return None;
        }
        let raw = ID_BITS as isize - distance.bit_length() as isize - 1;
        Some(raw.rem_euclid(ID_BITS as isize) as usize)
    }

    /// Render as a decimal string, the wire representation used by the RPC
    /// protocol and introduction handshake (spec: ids are decimal, not hex).
    pub fn to_decimal(&self) -> String {
        decimal::encode(&self.0)
    }

    /// Parse a decimal string back into an id.
    ///
    /// Returns `None` if the string is not a valid decimal integer or if it
    /// does not fit in 160 bits.
    pub fn from_decimal(s: &str) -> Option<Self> {
        decimal::decode(s).map(Id)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_decimal())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Minimal big-endian-bytes <-> decimal-string conversion, good enough for a
/// 160-bit id. Avoids pulling in a bignum crate for a single call site on
/// each side of the wire.
mod decimal {
    /// Encode big-endian bytes as a decimal string (no leading zeros, "0"
    /// for the zero value).
    pub fn encode(bytes: &[u8; 20]) -> String {
        // Repeated divide-by-10 over a big-endian byte buffer.
        let mut digits = Vec::new();
        let mut buf = *bytes;
        loop {
            let mut remainder: u32 = 0;
            let mut any_nonzero = false;
            for byte in buf.iter_mut() {
                let value = remainder * 256 + u32::from(*byte);
                *byte = (value / 10) as u8;
                remainder = value % 10;
                if *byte != 0 {
                    any_nonzero = true;
                }
            }
            digits.push(b'0' + remainder as u8);
            if !any_nonzero {
                break;
            }
        }
        digits.reverse();
        String::from_utf8(digits).expect("digits are ASCII")
    }

    /// Decode a decimal string into big-endian bytes, `None` on invalid
    /// input or overflow of the 160-bit range.
    pub fn decode(s: &str) -> Option<[u8; 20]> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut bytes = [0u8; 20];
        for ch in s.bytes() {
            let digit = u32::from(ch - b'0');
            let mut carry = digit;
            for byte in bytes.iter_mut().rev() {
                let value = u32::from(*byte) * 10 + carry;
                *byte = (value & 0xFF) as u8;
                carry = value >> 8;
            }
            if carry != 0 {
                return None;
            }
        }
        Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(Id::hash("example.com"), Id::hash("example.com"));
        assert_ne!(Id::hash("example.com"), Id::hash("test.com"));
    }

    #[test]
    fn distance_metric_properties() {
        let a = Id::hash("a");
        let b = Id::hash("b");
        let c = Id::hash("c");

        assert_eq!(a.distance(&a), Id::from_bytes([0u8; 20]));
        assert_eq!(a.distance(&b), b.distance(&a));

        // XOR triangle inequality: d(a,c) <= d(a,b) XOR d(b,c), compared
        // byte-wise as unsigned big-endian integers.
        let dac = a.distance(&c);
        let dab_xor_dbc = a.distance(&b).distance(&b.distance(&c));
        assert!(dac <= dab_xor_dbc);
    }

    #[test]
    fn bucket_index_matches_bit_length_formula() {
        let zero = Id::from_bytes([0u8; 20]);
        assert_eq!(zero.bucket_index(&zero), None);

        // Top bit differs: bit_length == ID_BITS, so `ID_BITS - bit_length -
        // 1` is -1, which wraps to the last bucket (159) exactly as the
        // Python original's `buckets[-1]` does.
        let mut far = [0u8; 20];
        far[0] = 0x80;
        let far_id = Id::from_bytes(far);
        assert_eq!(zero.bucket_index(&far_id), Some(159));

        // Lowest bit differs: bit_length == 1, so the formula gives
        // `160 - 1 - 1 == 158`.
        let mut close = [0u8; 20];
        close[19] = 0x01;
        let close_id = Id::from_bytes(close);
        assert_eq!(zero.bucket_index(&close_id), Some(158));
    }

    #[test]
    fn decimal_roundtrip() {
        let id = Id::hash("roundtrip-test");
        let decimal = id.to_decimal();
        assert_eq!(Id::from_decimal(&decimal), Some(id));
    }

    #[test]
    fn decimal_zero() {
        let zero = Id::from_bytes([0u8; 20]);
        assert_eq!(zero.to_decimal(), "0");
        assert_eq!(Id::from_decimal("0"), Some(zero));
    }

    #[test]
    fn decimal_rejects_garbage() {
        assert_eq!(Id::from_decimal("not-a-number"), None);
        assert_eq!(Id::from_decimal(""), None);
    }
}
