//! Fixed 256-bit unsigned arithmetic for target calculations.
//!
//! Kernel targets expand from the Bitcoin compact representation and are
//! then weighted by stake value; proof hashes compare against them as
//! little-endian 256-bit integers. The width is fixed on purpose: target
//! arithmetic must behave identically on every node, so no arbitrary
//! precision or floating representation is involved.

use crate::error::{Result, StakeError};

/// 256-bit unsigned integer stored as four little-endian 64-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const MAX: U256 = U256([u64::MAX; 4]);

    pub fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    /// Interpret 32 wire bytes as a little-endian integer.
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(chunk);
        }
        U256(words)
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&word| word == 0)
    }

    pub fn low_u64(&self) -> u64 {
        self.0[0]
    }

    pub fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }
        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;
        for i in 0..4 {
            if i + word_shift < 4 {
                result.0[i + word_shift] |= self.0[i] << bit_shift;
                if bit_shift > 0 && i + word_shift + 1 < 4 {
                    result.0[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
                }
            }
        }
        result
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }
        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;
        for i in 0..4 {
            if i >= word_shift {
                result.0[i - word_shift] |= self.0[i] >> bit_shift;
                if bit_shift > 0 && i - word_shift >= 1 {
                    result.0[i - word_shift - 1] |= self.0[i] << (64 - bit_shift);
                }
            }
        }
        result
    }

    /// Multiply by a 64-bit factor, `None` on 256-bit overflow.
    pub fn checked_mul_u64(&self, rhs: u64) -> Option<Self> {
        let mut carry = 0u128;
        let mut result = U256::ZERO;
        for i in 0..4 {
            let product = (self.0[i] as u128) * (rhs as u128) + carry;
            result.0[i] = product as u64;
            carry = product >> 64;
        }
        if carry > 0 {
            return None;
        }
        Some(result)
    }

    /// Multiply by a 64-bit factor, clamping to `U256::MAX` on overflow.
    ///
    /// A clamped target exceeds every possible 256-bit proof hash, which is
    /// exactly the behavior of an unbounded-width comparison.
    pub fn saturating_mul_u64(&self, rhs: u64) -> Self {
        self.checked_mul_u64(rhs).unwrap_or(U256::MAX)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for (a, b) in self.0.iter().rev().zip(other.0.iter().rev()) {
            match a.cmp(b) {
                std::cmp::Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        std::cmp::Ordering::Equal
    }
}

/// Expand a compact-encoded target (`nBits`).
///
/// The format packs a 3-byte mantissa with a 1-byte base-256 exponent:
/// `target = mantissa * 256^(exponent - 3)`, with bit 0x00800000 reserved
/// as the sign. Negative and overflowing encodings never name a reachable
/// target and are rejected; a zero mantissa expands to zero and simply
/// never validates a kernel.
pub fn expand_compact(bits: u32) -> Result<U256> {
    let exponent = bits >> 24;
    let mantissa = bits & 0x007f_ffff;

    if mantissa == 0 {
        return Ok(U256::ZERO);
    }
    if bits & 0x0080_0000 != 0 {
        return Err(StakeError::InvalidTarget);
    }
    // overflow rule from the reference compact codec
    if exponent > 34
        || (mantissa > 0xff && exponent > 33)
        || (mantissa > 0xffff && exponent > 32)
    {
        return Err(StakeError::InvalidTarget);
    }

    if exponent <= 3 {
        Ok(U256::from_u64((mantissa >> (8 * (3 - exponent))) as u64))
    } else {
        Ok(U256::from_u64(mantissa as u64).shl(8 * (exponent - 3)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_compact_genesis_bits() {
        let target = expand_compact(0x1d00ffff).unwrap();
        let expected =
            hex::decode("0000000000000000000000000000000000000000000000000000ffff00000000")
                .unwrap();
        assert_eq!(target.to_le_bytes().to_vec(), expected);
    }

    #[test]
    fn test_expand_compact_small_exponents() {
        // exponent 3: mantissa verbatim
        assert_eq!(
            expand_compact(0x03123456).unwrap(),
            U256::from_u64(0x123456)
        );
        // exponent 2: mantissa shifted down one byte
        assert_eq!(expand_compact(0x02123456).unwrap(), U256::from_u64(0x1234));
        assert_eq!(expand_compact(0x01123456).unwrap(), U256::from_u64(0x12));
    }

    #[test]
    fn test_expand_compact_zero_mantissa() {
        assert!(expand_compact(0x1d000000).unwrap().is_zero());
        assert!(expand_compact(0x00000000).unwrap().is_zero());
    }

    #[test]
    fn test_expand_compact_negative_rejected() {
        assert_eq!(
            expand_compact(0x03800001),
            Err(StakeError::InvalidTarget)
        );
    }

    #[test]
    fn test_expand_compact_overflow_rejected() {
        assert_eq!(expand_compact(0x23000001), Err(StakeError::InvalidTarget));
        assert_eq!(expand_compact(0x2200ff00), Err(StakeError::InvalidTarget));
        assert_eq!(expand_compact(0x21ffff00), Err(StakeError::InvalidTarget));
    }

    #[test]
    fn test_expand_compact_largest_valid() {
        // exponent 34 with a one-byte mantissa is the edge of the format
        assert!(expand_compact(0x220000ff).is_ok());
    }

    #[test]
    fn test_le_bytes_round_trip() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x78;
        bytes[9] = 0x12;
        bytes[31] = 0xfe;
        let value = U256::from_le_bytes(&bytes);
        assert_eq!(value.to_le_bytes(), bytes);
    }

    #[test]
    fn test_ordering_uses_high_words() {
        let mut low = [0u8; 32];
        low[0] = 0xff; // large low byte
        let mut high = [0u8; 32];
        high[31] = 0x01; // small high byte
        assert!(U256::from_le_bytes(&low) < U256::from_le_bytes(&high));
    }

    #[test]
    fn test_shr_32_divides() {
        let value = U256::from_u64(0x1_0000_0001).shl(64);
        let shifted = value.shr(32);
        assert_eq!(shifted, U256::from_u64(0x1_0000_0001).shl(32));
    }

    #[test]
    fn test_checked_mul_overflow() {
        assert_eq!(U256::MAX.checked_mul_u64(2), None);
        assert_eq!(U256::MAX.saturating_mul_u64(2), U256::MAX);
        assert_eq!(
            U256::from_u64(3).checked_mul_u64(7),
            Some(U256::from_u64(21))
        );
    }

    #[test]
    fn test_mul_carries_across_words() {
        let value = U256::from_u64(u64::MAX);
        let doubled = value.checked_mul_u64(2).unwrap();
        assert_eq!(doubled.to_le_bytes()[8], 1);
        assert_eq!(doubled.low_u64(), u64::MAX - 1);
    }

    #[test]
    fn test_saturated_target_beats_any_hash() {
        assert!(U256::from_le_bytes(&[0xff; 32]) <= U256::MAX);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_shl_then_shr_preserves_value(value in any::<u64>(), shift in 0u32..128) {
            let original = U256::from_u64(value);
            prop_assert_eq!(original.shl(shift).shr(shift), original);
        }

        #[test]
        fn prop_le_bytes_round_trip(bytes in any::<[u8; 32]>()) {
            let value = U256::from_le_bytes(&bytes);
            prop_assert_eq!(value.to_le_bytes(), bytes);
        }

        #[test]
        fn prop_ordering_matches_u64(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(U256::from_u64(a).cmp(&U256::from_u64(b)), a.cmp(&b));
        }

        #[test]
        fn prop_mul_matches_u128(a in any::<u64>(), b in any::<u64>()) {
            let product = U256::from_u64(a).checked_mul_u64(b).unwrap();
            let expected = (a as u128) * (b as u128);
            prop_assert_eq!(product.low_u64(), expected as u64);
            prop_assert_eq!(
                u64::from_le_bytes(product.to_le_bytes()[8..16].try_into().unwrap()),
                (expected >> 64) as u64
            );
        }
    }
}
