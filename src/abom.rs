// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    cbf::{Cbf, HashInput},
    codec,
    coding::{Encode, EncodeError},
    config::AbomConfig,
    error::Result,
};
use std::io::{Read, Write};

/// An ordered list of [`Cbf`]s sharing the same `(m, k)` parameters.
///
/// Writes are routed to the first filter whose projected false-positive
/// rate stays below the configured threshold `f`; otherwise a fresh filter
/// is appended. See [`Abom::insert`] and [`Abom::union`].
#[derive(Debug, Clone)]
pub struct Abom {
    config: AbomConfig,
    filters: Vec<Cbf>,
    prehashed: bool,
}

impl Abom {
    /// Constructs an empty container with the given tunables.
    ///
    /// Inputs are treated as already-hashed hex text (`prehashed = true`);
    /// use [`Abom::with_prehashed`] to change that.
    #[must_use]
    pub fn new(config: AbomConfig) -> Self {
        Self::with_prehashed(config, true)
    }

    /// Constructs an empty container, choosing whether hex text inputs are
    /// interpreted as already-hashed (decoded from hex) or as raw text
    /// bytes. See [`HashInput`].
    #[must_use]
    pub fn with_prehashed(config: AbomConfig, prehashed: bool) -> Self {
        Self {
            config,
            filters: Vec::new(),
            prehashed,
        }
    }

    /// The container's tunables.
    #[must_use]
    pub fn config(&self) -> AbomConfig {
        self.config
    }

    /// The filters currently held, in container order.
    #[must_use]
    pub fn filters(&self) -> &[Cbf] {
        &self.filters
    }

    /// Number of filters currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// `true` if the container holds no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Inserts `x`, routing it to the first filter whose estimated
    /// false-positive rate is strictly below `f`; if none qualifies, a fresh
    /// filter is appended and spawned with a log message noting the
    /// admission event.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError`](crate::AbomError) if `x` is hex text of the
    /// wrong length or containing non-hex characters while the container is
    /// `prehashed`.
    pub fn insert<'a, I: Into<HashInput<'a>>>(&mut self, x: I) -> Result<()> {
        let input = x.into();

        let slot = self
            .filters
            .iter_mut()
            .find(|cbf| cbf.false_positive_rate() < self.config.f);

        match slot {
            Some(cbf) => cbf.insert(input),
            None => {
                log::debug!(
                    "no filter accepted insert under f={}, spawning filter {}",
                    self.config.f,
                    self.filters.len()
                );
                let mut cbf = Cbf::empty(&self.config, self.prehashed);
                cbf.insert(input)?;
                self.filters.push(cbf);
                Ok(())
            }
        }
    }

    /// Merges `other` into `self`.
    ///
    /// For each filter `b` in `other`, tries each of `self`'s filters in
    /// order; the first tentative union whose false-positive rate stays
    /// below `f` replaces that slot. If none accepts, `b` is appended.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError::IncompatibleParameters`](crate::AbomError) if
    /// `(m, k)` differ between `self` and `other`. Neither operand is
    /// mutated in that case.
    pub fn union(&mut self, other: Self) -> Result<()> {
        if let (Some(a), Some(b)) = (self.filters.first(), other.filters.first()) {
            // cheap upfront check so a parameter mismatch fails atomically
            // instead of after partially merging earlier filters
            a.union_copy(b)?;
        }

        for incoming in other.filters {
            let accepted_slot = self.filters.iter_mut().enumerate().find_map(|(i, cbf)| {
                cbf.union_copy(&incoming)
                    .ok()
                    .filter(|merged| merged.false_positive_rate() < self.config.f)
                    .map(|merged| (i, merged))
            });

            match accepted_slot {
                Some((i, merged)) => {
                    if let Some(slot) = self.filters.get_mut(i) {
                        *slot = merged;
                    }
                }
                None => self.filters.push(incoming),
            }
        }

        Ok(())
    }

    /// Returns `true` if any filter contains `x`.
    ///
    /// Never raises: a malformed hex query is treated as "not present".
    #[must_use]
    pub fn contains<'a, I: Into<HashInput<'a>>>(&self, x: I) -> bool {
        let input = x.into();
        self.filters.iter().any(|cbf| cbf.contains(input))
    }

    /// Writes the serialized ABOM to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError`](crate::AbomError) on I/O failure.
    pub fn dump<W: Write>(&self, sink: &mut W) -> Result<()> {
        codec::encode_into(&self.filters, self.config.m, sink)
    }

    /// Deserializes an ABOM from `source`, given the `(m, k, f)` the caller
    /// expects and whether hex-text queries against the reconstructed
    /// filters should be treated as already-hashed. The wire header carries
    /// no `m`/`k`/`prehashed` fields, so this crate cannot infer them from
    /// the stream alone; see `DESIGN.md`.
    ///
    /// # Errors
    ///
    /// Returns [`AbomError`](crate::AbomError) on malformed framing
    /// (bad magic, unsupported version, truncated payload) or I/O failure.
    pub fn decode_from<R: Read>(reader: &mut R, config: AbomConfig, prehashed: bool) -> Result<Self> {
        let filters = codec::decode_from(reader, config, prehashed)?;
        Ok(Self {
            config,
            filters,
            prehashed,
        })
    }
}

impl Encode for Abom {
    fn encode_into<W: Write>(&self, writer: &mut W) -> std::result::Result<(), EncodeError> {
        codec::encode_into(&self.filters, self.config.m, writer).map_err(|e| match e {
            crate::AbomError::Io(io) => EncodeError::Io(io),
            crate::AbomError::Encode(enc) => enc,
            other => EncodeError::Io(std::io::Error::other(other.to_string())),
        })
    }
}
