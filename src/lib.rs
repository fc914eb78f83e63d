// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A compact, mergeable cryptographic manifest of the source inputs and
//! transitive build-time dependencies that contributed to a compiled
//! artifact.
//!
//! ##### NOTE
//!
//! > This crate only provides the ABOM data structure and its binary codec.
//! > It does not intercept compiler/linker invocations, manipulate object
//! > file sections, or discover dependencies - those are the job of an
//! > external driver that calls into this crate.
//!
//! ##### About
//!
//! An [`Abom`] is an ordered list of [`Cbf`]s (Compressed Bloom Filters), all
//! sharing the same `(m, k)` parameters. Producers insert fixed-length
//! content hashes (e.g. of dependency files) during compilation, linking and
//! archiving; consumers query whether a given content hash is represented in
//! an artifact's ABOM.
//!
//! Each filter is capped at a false-positive rate `f`; once a filter's
//! estimated rate would exceed `f`, a fresh filter is appended rather than
//! degrading the existing one further. This keeps membership queries cheap
//! and bounds the false-positive rate of any single filter, at the cost of
//! a few extra filters for very large input sets.
//!
//! On the wire, an ABOM is a small fixed header followed by the
//! concatenation of every filter's bit-array, arithmetically compressed
//! against the filter's own bit density. See [`codec`](crate::codec) for the
//! framing details.
//!
//! # Example usage
//!
//! ```
//! use abom::{Abom, AbomConfig, Encode};
//!
//! let config = AbomConfig::tuned();
//! let mut abom = Abom::new(config);
//!
//! abom.insert("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a");
//! assert!(abom.contains("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a"));
//! assert!(!abom.contains("0000000000000000000000000000000000000000000000000000000000000000"));
//!
//! let bytes = abom.encode_into_vec();
//! let reloaded = abom::load(&bytes[..], config, true)?;
//! assert!(reloaded.contains("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a"));
//! # Ok::<(), abom::AbomError>(())
//! ```

#![doc(html_logo_url = "https://raw.githubusercontent.com/abom-rs/abom/main/logo.png")]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/abom-rs/abom/main/logo.png")]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]

mod abom;
mod bit_array;
mod cbf;
mod coding;

#[doc(hidden)]
pub mod codec;

mod config;
mod error;

pub use abom::Abom;
pub use cbf::{Cbf, HashInput};
pub use coding::{Encode, EncodeError};
pub use codec::Profile;
pub use config::{AbomConfig, AbomConfigBuilder};
pub use error::{AbomError, Result};

use std::io::Read;

/// Reads and decodes an [`Abom`] from a byte source.
///
/// The wire header carries no `m`/`k`/`prehashed` fields (see `DESIGN.md`),
/// so the caller must supply the [`AbomConfig`] the stream was produced
/// with, and whether hex-text queries against the reconstructed container
/// should be treated as already-hashed (`Abom::new` defaults to `true`).
/// Accepts both on-wire profiles described in [`codec`]; see
/// [`Abom::decode_from`] for the full contract.
///
/// # Errors
///
/// Returns [`AbomError`] if the stream is not a structurally valid ABOM
/// frame (bad magic, unsupported version, truncated or mismatched payload).
pub fn load<R: Read>(mut source: R, config: AbomConfig, prehashed: bool) -> Result<Abom> {
    Abom::decode_from(&mut source, config, prehashed)
}
