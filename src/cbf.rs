// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    bit_array::BitArray,
    config::AbomConfig,
    error::{AbomError, Result},
};
use sha3::{Digest, Sha3_256};

/// Either a raw byte key, or a hex-encoded text key whose interpretation
/// depends on the filter's `prehashed` flag (see [`Cbf::new`]).
#[derive(Debug, Clone)]
pub enum HashInput<'a> {
    /// Already-hashed or otherwise opaque bytes, used as-is.
    Raw(&'a [u8]),

    /// Hex text. If the filter is `prehashed`, this is decoded from hex to
    /// bytes; otherwise the text's own UTF-8 byte encoding is used.
    Hex(&'a str),
}

impl<'a> From<&'a str> for HashInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Hex(value)
    }
}

impl<'a> From<&'a [u8]> for HashInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Raw(value)
    }
}

impl<'a> From<&'a Vec<u8>> for HashInput<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Self::Raw(value.as_slice())
    }
}

/// A single Bloom filter with fixed bit-array size `m` (a power of two) and
/// `k` index-deriving probes.
///
/// The backing bit-array uses little-endian bit order (bit `i` lives at byte
/// `i / 8`, bit position `i % 8` counted from the LSB) so that it can be fed
/// directly into the codec's symbol stream in storage order. Index
/// derivation, unrelated to storage order, always interprets a probe as a
/// big-endian unsigned integer.
#[derive(Debug, Clone, PartialEq)]
pub struct Cbf {
    inner: BitArray,
    m: usize,
    k: usize,
    prehashed: bool,
}

impl Cbf {
    /// Constructs a filter with bit-array size `m` and `k` probes.
    ///
    /// If `bits` is omitted, a zero-initialized bit-array of `m` bits is
    /// allocated; otherwise it is adopted as the filter's state and must
    /// contain exactly `m` bits.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError::InvalidParameters`] if `m` is not a nonzero
    /// power of two, `k` is zero or exceeds 255, or a supplied `bits` array
    /// has the wrong length.
    pub fn new(m: usize, k: usize, bits: Option<BitArray>, prehashed: bool) -> Result<Self> {
        if m == 0 || (m & (m - 1)) != 0 {
            return Err(AbomError::InvalidParameters(format!(
                "m must be a nonzero power of two, got {m}"
            )));
        }

        if k == 0 || k > 255 {
            return Err(AbomError::InvalidParameters(format!(
                "k must be in 1..=255, got {k}"
            )));
        }

        let inner = match bits {
            Some(bits) if bits.bit_len() == m => bits,
            Some(bits) => {
                return Err(AbomError::InvalidParameters(format!(
                    "bit array has {} bits, expected {m}",
                    bits.bit_len()
                )))
            }
            None => BitArray::with_len(m),
        };

        Ok(Self {
            inner,
            m,
            k,
            prehashed,
        })
    }

    /// Constructs an empty filter from the container's tunables.
    #[must_use]
    pub fn empty(config: &AbomConfig, prehashed: bool) -> Self {
        Self {
            inner: BitArray::with_len(config.m),
            m: config.m,
            k: config.k,
            prehashed,
        }
    }

    /// Bit-array size.
    #[must_use]
    pub fn m(&self) -> usize {
        self.m
    }

    /// Number of probes per key.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// `log2(m)`.
    #[must_use]
    pub fn idx_bits(&self) -> u32 {
        self.m.trailing_zeros()
    }

    /// Raw backing bit-array, in little-endian bit order.
    #[must_use]
    pub fn bits(&self) -> &BitArray {
        &self.inner
    }

    /// Number of bits set to 1.
    #[must_use]
    pub fn ones_count(&self) -> usize {
        self.inner.count_ones()
    }

    /// Theoretical false-positive rate given current saturation:
    /// `(ones / m) ^ k`.
    ///
    /// Admission control MUST use this exact estimator; any other estimator
    /// would make placement decisions diverge between implementations.
    #[must_use]
    pub fn false_positive_rate(&self) -> f64 {
        let density = self.ones_count() as f64 / self.m as f64;
        density.powi(self.k as i32)
    }

    /// Sets all `k` probe bits for `x`. Idempotent with respect to the
    /// backing bit-array.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError::InvalidInput`] if `x` is hex text of the wrong
    /// length or containing non-hex characters while `prehashed`.
    pub fn insert<'a, I: Into<HashInput<'a>>>(&mut self, x: I) -> Result<()> {
        for idx in self.probe_indices(x.into())? {
            self.inner.set(idx, true);
        }
        Ok(())
    }

    /// Merges `other`'s bits into `self` in place.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError::IncompatibleParameters`] if `m` or `k` differ.
    pub fn union(&mut self, other: &Self) -> Result<()> {
        if self.m != other.m || self.k != other.k {
            return Err(AbomError::IncompatibleParameters {
                expected: (self.m, self.k),
                got: (other.m, other.k),
            });
        }

        self.inner.or_assign(&other.inner);
        Ok(())
    }

    /// Returns the bitwise union of `self` and `other` as a new filter,
    /// without mutating either operand.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError::IncompatibleParameters`] if `m` or `k` differ.
    #[must_use = "union_copy does not mutate either operand"]
    pub fn union_copy(&self, other: &Self) -> Result<Self> {
        let mut copy = self.clone();
        copy.union(other)?;
        Ok(copy)
    }

    /// Returns `true` if every probe bit for `x` is set.
    ///
    /// Never raises: malformed hex input (wrong length, non-hex characters)
    /// is treated as "not present".
    #[must_use]
    pub fn contains<'a, I: Into<HashInput<'a>>>(&self, x: I) -> bool {
        let Ok(indices) = self.probe_indices(x.into()) else {
            return false;
        };

        indices.into_iter().all(|idx| self.inner.get(idx))
    }

    /// Derives the `k` probe indices for `x` via SHA3-256 rehash-chaining.
    fn probe_indices(&self, input: HashInput<'_>) -> Result<Vec<usize>> {
        let owned_bytes;
        let seed: &[u8] = match input {
            HashInput::Raw(bytes) => bytes,
            HashInput::Hex(text) if self.prehashed => {
                owned_bytes = hex::decode(text)
                    .map_err(|e| AbomError::InvalidInput(format!("invalid hex: {e}")))?;
                &owned_bytes
            }
            HashInput::Hex(text) => text.as_bytes(),
        };

        let needed_bits = self.k * self.idx_bits() as usize;

        if self.prehashed && seed.len() * 8 > needed_bits {
            log::warn!(
                "input supplies {} bits, more than the {needed_bits} bits consumed by (m={}, k={}); surplus is ignored",
                seed.len() * 8,
                self.m,
                self.k,
            );
        }

        let extended = extend_to_bit_length(seed, needed_bits);

        Ok((0..self.k)
            .map(|probe| {
                let start_bit = probe * self.idx_bits() as usize;
                take_bits_be(&extended, start_bit, self.idx_bits()) as usize % self.m
            })
            .collect())
    }
}

/// Extends `seed` with SHA3-256 rehash-chaining until it holds at least
/// `needed_bits` bits. The first extension input is `seed` itself; every
/// subsequent one is the previous digest.
fn extend_to_bit_length(seed: &[u8], needed_bits: usize) -> Vec<u8> {
    let mut buf = seed.to_vec();

    if buf.len() * 8 >= needed_bits {
        return buf;
    }

    let mut last = seed.to_vec();

    while buf.len() * 8 < needed_bits {
        let digest = Sha3_256::digest(&last);
        buf.extend_from_slice(&digest);
        last = digest.to_vec();
    }

    buf
}

/// Reads `n_bits` starting at `start_bit` out of `bytes`, MSB-first within
/// each byte, as a single big-endian unsigned integer.
fn take_bits_be(bytes: &[u8], start_bit: usize, n_bits: u32) -> u64 {
    let mut value: u64 = 0;

    for i in 0..n_bits {
        let bit_pos = start_bit + i as usize;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;

        let bit = bytes
            .get(byte_idx)
            .map_or(0, |byte| (byte >> (7 - bit_in_byte)) & 1);

        value = (value << 1) | u64::from(bit);
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn rejects_non_power_of_two_m() {
        assert!(Cbf::new(100, 4, None, true).is_err());
    }

    #[test]
    fn rejects_zero_k() {
        assert!(Cbf::new(1024, 0, None, true).is_err());
    }

    #[test]
    fn insert_then_contains() {
        let mut cbf = Cbf::new(1 << 12, 4, None, true).unwrap();
        let key = "d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a";

        assert!(!cbf.contains(key));
        cbf.insert(key).unwrap();
        assert!(cbf.contains(key));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut cbf = Cbf::new(1 << 12, 4, None, true).unwrap();
        let key = "aa";

        cbf.insert(key).unwrap();
        let bits_after_first = cbf.bits().clone();
        cbf.insert(key).unwrap();
        assert_eq!(bits_after_first, *cbf.bits());
    }

    #[test]
    fn contains_never_raises_on_bad_hex() {
        let cbf = Cbf::new(1 << 12, 4, None, true).unwrap();
        assert!(!cbf.contains("not-hex-zz"));
        assert!(!cbf.contains("abc")); // odd length
    }

    #[test]
    fn union_rejects_mismatched_parameters() {
        let mut a = Cbf::new(1 << 12, 4, None, true).unwrap();
        let b = Cbf::new(1 << 10, 4, None, true).unwrap();
        assert!(a.union(&b).is_err());

        let c = Cbf::new(1 << 12, 5, None, true).unwrap();
        assert!(a.union(&c).is_err());
    }

    #[test]
    fn union_is_bitwise_or() {
        let mut a = Cbf::new(1 << 12, 4, None, true).unwrap();
        let mut b = Cbf::new(1 << 12, 4, None, true).unwrap();

        a.insert("aa").unwrap();
        b.insert("bb").unwrap();

        a.union(&b).unwrap();

        assert!(a.contains("aa"));
        assert!(a.contains("bb"));
    }

    #[test]
    fn false_positive_rate_increases_with_saturation() {
        let mut cbf = Cbf::new(1 << 10, 2, None, true).unwrap();
        assert_eq!(0.0, cbf.false_positive_rate());

        for i in 0..200u32 {
            cbf.insert(format!("{i:08x}").as_str()).unwrap();
        }

        assert!(cbf.false_positive_rate() > 0.0);
    }

    #[test]
    fn deterministic_index_derivation() {
        let a = Cbf::new(1 << 12, 4, None, true).unwrap();
        let b = Cbf::new(1 << 12, 4, None, true).unwrap();

        let key = "d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a";
        assert_eq!(
            a.probe_indices(HashInput::Hex(key)).unwrap(),
            b.probe_indices(HashInput::Hex(key)).unwrap()
        );

        let other_key = "d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2b";
        assert_ne!(
            a.probe_indices(HashInput::Hex(key)).unwrap(),
            a.probe_indices(HashInput::Hex(other_key)).unwrap()
        );
    }

    #[test]
    fn rehash_chaining_extends_short_input() {
        // k * idx_bits = 2 * 18 = 36 bits, far more than "aa" (2 bytes = 16 bits) supplies
        let cbf = Cbf::new(1 << 18, 2, None, true).unwrap();
        let indices = cbf.probe_indices(HashInput::Hex("aa")).unwrap();
        assert_eq!(2, indices.len());

        for idx in indices {
            assert!(idx < cbf.m());
        }
    }
}
