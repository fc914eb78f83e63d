// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The ABOM wire format: a fixed 15-byte header followed by the
//! concatenation of every filter's bit-array, arithmetically compressed
//! against the container's overall bit density.
//!
//! ```text
//! magic(4) | version(1) | n(2) | p1_q(4) | l(4) | payload(..)
//! ```
//!
//! All integer fields are little-endian. Two historical payload-length
//! conventions exist and both decode under version `1`: [`Profile::A`]
//! stores `l` in bits, [`Profile::B`] stores it in bytes. This crate's own
//! encoder always emits profile A.

mod model;
mod range_coder;

use crate::{
    bit_array::BitArray,
    cbf::Cbf,
    config::AbomConfig,
    error::{AbomError, Result},
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use model::BinaryModel;
use range_coder::{RangeDecoder, RangeEncoder};
use std::io::{Read, Write};

/// ASCII `ABOM`.
pub const MAGIC: [u8; 4] = *b"ABOM";

/// The only version byte this crate understands.
pub const VERSION: u8 = 1;

/// The two historically observed interpretations of the header's `l` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// `l` is the payload length in bits (this crate's own encoder).
    A,
    /// `l` is the payload length in bytes.
    B,
}

struct Header {
    n: u16,
    p1_q: u32,
    l: u32,
}

impl Header {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_u8(VERSION)?;
        writer.write_u16::<LittleEndian>(self.n)?;
        writer.write_u32::<LittleEndian>(self.p1_q)?;
        writer.write_u32::<LittleEndian>(self.l)?;
        Ok(())
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if magic != MAGIC {
            return Err(AbomError::InvalidMagic);
        }

        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(AbomError::UnsupportedVersion(version));
        }

        let n = reader.read_u16::<LittleEndian>()?;
        let p1_q = reader.read_u32::<LittleEndian>()?;
        let l = reader.read_u32::<LittleEndian>()?;

        Ok(Self { n, p1_q, l })
    }
}

/// Serializes `filters` (all sharing `m`) into the ABOM wire format.
pub(crate) fn encode_into<W: Write>(filters: &[Cbf], m: usize, writer: &mut W) -> Result<()> {
    let n = filters.len();
    let total_bits = n * m;

    let ones_total: usize = filters.iter().map(Cbf::ones_count).sum();
    let p1 = if total_bits == 0 {
        0.0
    } else {
        ones_total as f64 / total_bits as f64
    };

    let p1_q = BinaryModel::quantize_p1(p1);
    let model = BinaryModel::from_p1(BinaryModel::dequantize_p1(p1_q));

    let payload = if model.is_degenerate() || total_bits == 0 {
        Vec::new()
    } else {
        let mut encoder = RangeEncoder::new();

        for filter in filters {
            for i in 0..m {
                let (cum, freq) = model.interval(filter.bits().get(i));
                encoder.encode(cum, freq);
            }
        }

        encoder.finish()
    };

    let header = Header {
        n: u16::try_from(n).map_err(|_| {
            AbomError::InvalidParameters(format!("filter count {n} exceeds u16::MAX"))
        })?,
        p1_q,
        // Profile A: payload length in bits.
        l: u32::try_from(payload.len() * 8)
            .map_err(|_| AbomError::InvalidParameters("payload too large".to_owned()))?,
    };

    header.write(writer)?;
    writer.write_all(&payload)?;

    Ok(())
}

/// Deserializes an ABOM's filters from the wire format, given the `(m, k)`
/// the caller expects (the header carries no room for them - see
/// `DESIGN.md`) and whether reconstructed filters should treat hex-text
/// queries as already-hashed.
pub(crate) fn decode_from<R: Read>(
    reader: &mut R,
    config: AbomConfig,
    prehashed: bool,
) -> Result<Vec<Cbf>> {
    config.validate()?;

    let header = Header::read(reader)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;

    let profile = resolve_profile(header.l, payload.len());
    let expected_len = match profile {
        Profile::A => (header.l as usize).div_ceil(8),
        Profile::B => header.l as usize,
    };

    if payload.len() < expected_len {
        return Err(AbomError::CodecError(format!(
            "payload is {} bytes, short of the {expected_len} bytes the header's length field declares",
            payload.len()
        )));
    }

    let p1 = BinaryModel::dequantize_p1(header.p1_q);
    let model = BinaryModel::from_p1(p1);

    let n = header.n as usize;
    let total_bits = n * config.m;

    let symbols = if model.is_degenerate() || total_bits == 0 {
        vec![false; total_bits]
    } else {
        let mut decoder = RangeDecoder::new(&payload);
        (0..total_bits)
            .map(|_| {
                let freq = decoder.decode_freq();
                let symbol = model.symbol_for(freq);
                let (cum, width) = model.interval(symbol);
                decoder.consume(cum, width);
                symbol
            })
            .collect()
    };

    symbols
        .chunks(config.m.max(1))
        .map(|chunk| {
            let mut bits = BitArray::with_len(config.m);
            for (i, &bit) in chunk.iter().enumerate() {
                bits.set(i, bit);
            }
            Cbf::new(config.m, config.k, Some(bits), prehashed)
        })
        .collect()
}

/// Applies the header's ambiguity-resolution rule: Profile A's
/// `ceil(l/8)` should match the remaining stream length; otherwise assume
/// Profile B, where `l` itself is the byte length. Purely advisory - the
/// payload bytes are identical either way, this only informs which
/// diagnostic to log when neither matches exactly.
fn resolve_profile(l: u32, remaining_len: usize) -> Profile {
    let bits_profile_len = (l as usize).div_ceil(8);

    if bits_profile_len == remaining_len {
        Profile::A
    } else if l as usize == remaining_len {
        Profile::B
    } else {
        log::warn!(
            "ABOM payload length {remaining_len} matches neither profile A (expected {bits_profile_len} bytes) nor profile B (expected {l} bytes); decoding anyway"
        );
        Profile::A
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AbomConfig;
    use test_log::test;

    fn filters(config: &AbomConfig, keys: &[&str]) -> Vec<Cbf> {
        let mut cbf = Cbf::empty(config, true);
        for key in keys {
            cbf.insert(*key).unwrap();
        }
        vec![cbf]
    }

    #[test]
    fn header_round_trip() {
        let config = AbomConfig::builder().m(1 << 10).k(3).build().unwrap();
        let original = filters(&config, &["aa", "bb", "cc"]);

        let mut bytes = Vec::new();
        encode_into(&original, config.m, &mut bytes).unwrap();

        assert_eq!(&MAGIC, &bytes[0..4]);
        assert_eq!(VERSION, bytes[4]);

        let decoded = decode_from(&mut &bytes[..], config, true).unwrap();
        assert_eq!(original.len(), decoded.len());
        assert_eq!(original[0].bits(), decoded[0].bits());
    }

    #[test]
    fn empty_container_round_trip() {
        let config = AbomConfig::tuned();
        let mut bytes = Vec::new();
        encode_into(&[], config.m, &mut bytes).unwrap();

        assert_eq!([b'A', b'B', b'O', b'M', 0x01], bytes[0..5]);

        let decoded = decode_from(&mut &bytes[..], config, true).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn resolve_profile_prefers_bit_length() {
        assert_eq!(Profile::A, resolve_profile(16, 2));
        assert_eq!(Profile::B, resolve_profile(3, 3));
    }

    #[test]
    fn truncated_payload_is_a_codec_error() {
        let config = AbomConfig::builder().m(1 << 10).k(3).build().unwrap();
        let original = filters(&config, &["aa", "bb", "cc"]);

        let mut bytes = Vec::new();
        encode_into(&original, config.m, &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);

        assert!(matches!(
            decode_from(&mut &bytes[..], config, true),
            Err(AbomError::CodecError(_))
        ));
    }
}
