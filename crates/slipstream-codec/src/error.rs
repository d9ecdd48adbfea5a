//! # Codec Error Taxonomy
//!
//! Every fallible codec operation returns a [`CodecError`] as a status value.
//! None of these unwind past the operation boundary: the caller decides
//! whether to abort the session or skip the operation and keep feeding
//! symbols.

use thiserror::Error;

/// Result alias used throughout the codec.
pub type CodecResult<T> = Result<T, CodecError>;

/// Status values returned by codec operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A source symbol was added to the encoder window out of order.
    /// ESIs must be strictly increasing and gap-free.
    #[error("source symbol esi {got} out of sequence (expected {expected})")]
    Sequence { expected: u32, got: u32 },

    /// A staged ESI falls outside the decoder's coding-window capacity.
    #[error("esi {esi} exceeds coding window (first {first}, capacity {capacity})")]
    Range { esi: u32, first: u32, capacity: u32 },

    /// A caller-supplied destination buffer is smaller than required.
    #[error("destination buffer too small ({got} bytes, need {needed})")]
    BufferTooSmall { needed: usize, got: usize },

    /// A symbol buffer does not match the session's fixed symbol size.
    #[error("symbol size mismatch ({got} bytes, expected {expected})")]
    SymbolSize { expected: usize, got: usize },

    /// An inserted equation reduced to zero coefficients with a non-zero
    /// payload — corrupted data or mismatched coding coefficients.
    /// Diagnostic only; the session remains usable.
    #[error("linear system inconsistency: equation reduced to 0 = non-zero")]
    Inconsistent,

    /// An operation was called before one of its prerequisites.
    #[error("precondition not met: {0}")]
    Precondition(&'static str),

    /// Window information was requested before any symbol was added.
    #[error("coding window is empty")]
    EmptyWindow,

    /// Density values are 1..=15; 0 is reserved.
    #[error("invalid coding density {0} (must be 1..=15)")]
    InvalidDensity(u8),

    /// The requested codepoint is not implemented by this build.
    #[error("unsupported codepoint {0}")]
    UnsupportedCodepoint(u32),
}
