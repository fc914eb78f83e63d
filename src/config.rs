// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::error::{AbomError, Result};

/// Tunables for an [`Abom`](crate::Abom): bit-array size `m`, probe count
/// `k`, and the per-filter false-positive-rate ceiling `f`.
///
/// Two canonical configurations have been used across iterations of this
/// format; both MUST be supported when *decoding*, but producers pick one:
///
/// - [`AbomConfig::legacy`]: `m = 2^16`, `k = 16`, `f = 10^-4`
/// - [`AbomConfig::tuned`]: `m = 2^18`, `k = 2`, `f = 2^-14`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbomConfig {
    /// Bit-array size of every filter in the container. Always a power of
    /// two.
    pub m: usize,

    /// Number of probe indices derived per inserted key.
    pub k: usize,

    /// Maximum false-positive rate a filter may reach before a fresh filter
    /// is spawned.
    pub f: f64,
}

impl AbomConfig {
    /// The earliest widely-deployed tuple: `m = 2^16`, `k = 16`, `f = 10^-4`.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            m: 1 << 16,
            k: 16,
            f: 1e-4,
        }
    }

    /// The tuned tuple used by later producers: `m = 2^18`, `k = 2`,
    /// `f = 2^-14`.
    #[must_use]
    pub fn tuned() -> Self {
        Self {
            m: 1 << 18,
            k: 2,
            f: 2f64.powi(-14),
        }
    }

    /// Starts a fluent, validating builder seeded with the tuned defaults.
    #[must_use]
    pub fn builder() -> AbomConfigBuilder {
        AbomConfigBuilder::new()
    }

    /// `log2(m)`, the number of bits spanned by a single probe index.
    #[must_use]
    pub fn idx_bits(&self) -> u32 {
        self.m.trailing_zeros()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.m == 0 || (self.m & (self.m - 1)) != 0 {
            return Err(AbomError::InvalidParameters(format!(
                "m must be a nonzero power of two, got {}",
                self.m
            )));
        }

        if self.k == 0 || self.k > 255 {
            return Err(AbomError::InvalidParameters(format!(
                "k must be in 1..=255, got {}",
                self.k
            )));
        }

        if !(self.f > 0.0 && self.f < 1.0) {
            return Err(AbomError::InvalidParameters(format!(
                "f must be in (0, 1), got {}",
                self.f
            )));
        }

        Ok(())
    }
}

impl Default for AbomConfig {
    fn default() -> Self {
        Self::tuned()
    }
}

/// Fluent, validating builder for [`AbomConfig`].
#[derive(Clone, Debug)]
pub struct AbomConfigBuilder {
    config: AbomConfig,
}

impl AbomConfigBuilder {
    /// Creates a builder seeded with the tuned defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AbomConfig::tuned(),
        }
    }

    /// Sets the bit-array size. Must be a nonzero power of two.
    #[must_use]
    pub fn m(mut self, m: usize) -> Self {
        self.config.m = m;
        self
    }

    /// Sets the number of probes per key. Must be in `1..=255`.
    #[must_use]
    pub fn k(mut self, k: usize) -> Self {
        self.config.k = k;
        self
    }

    /// Sets the per-filter false-positive-rate ceiling. Must be in `(0, 1)`.
    #[must_use]
    pub fn f(mut self, f: f64) -> Self {
        self.config.f = f;
        self
    }

    /// Validates and builds the [`AbomConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AbomError::InvalidParameters`] if `m` is not a nonzero
    /// power of two, `k` is zero or exceeds 255, or `f` is not in `(0, 1)`.
    pub fn build(self) -> Result<AbomConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for AbomConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
