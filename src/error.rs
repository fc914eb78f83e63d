// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::EncodeError;

/// Represents errors that can occur while building, merging or decoding an
/// ABOM.
///
/// `contains` never returns this type - a malformed query is simply treated
/// as "not present" (see [`Cbf::contains`](crate::Cbf::contains)). This error
/// type only surfaces from construction, union and codec operations.
#[derive(Debug)]
pub enum AbomError {
    /// `m` was not a nonzero power of two, or an operation was given
    /// parameters outside their valid range.
    InvalidParameters(String),

    /// A union or merge was attempted between two containers/filters whose
    /// `(m, k)` do not match.
    IncompatibleParameters {
        /// Bit-array size and probe count of the left-hand operand.
        expected: (usize, usize),
        /// Bit-array size and probe count of the right-hand operand.
        got: (usize, usize),
    },

    /// The header's magic bytes were not `ABOM`.
    InvalidMagic,

    /// The header's version byte is not one this crate understands.
    UnsupportedVersion(u8),

    /// The arithmetic-coded payload could not be decoded into the expected
    /// number of symbols.
    CodecError(String),

    /// A hex string had the wrong length or contained non-hex characters.
    InvalidInput(String),

    /// I/O error while reading from or writing to a byte sink/source.
    Io(std::io::Error),

    /// Serialization failed.
    Encode(EncodeError),
}

impl std::fmt::Display for AbomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameters(msg) => write!(f, "invalid parameters: {msg}"),
            Self::IncompatibleParameters { expected, got } => write!(
                f,
                "incompatible (m, k): expected {expected:?}, got {got:?}"
            ),
            Self::InvalidMagic => write!(f, "invalid magic bytes, expected ABOM"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported version byte: {v}"),
            Self::CodecError(msg) => write!(f, "codec error: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Encode(e) => write!(f, "encode error: {e}"),
        }
    }
}

impl std::error::Error for AbomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AbomError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EncodeError> for AbomError {
    fn from(value: EncodeError) -> Self {
        Self::Encode(value)
    }
}

/// ABOM result type.
pub type Result<T> = std::result::Result<T, AbomError>;
