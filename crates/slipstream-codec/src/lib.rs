//! # slipstream-codec
//!
//! Sliding-window random linear FEC codec over GF(2^8).
//!
//! The encoder keeps a bounded window of the most recent source symbols and
//! emits repair symbols as random linear combinations of it; the decoder
//! rebuilds the combinations from compact wire metadata and recovers lost
//! source symbols by incremental Gaussian elimination, reporting each
//! recovery through a callback as soon as it happens.
//!
//! ## Crate structure
//!
//! - [`gf256`] — GF(2^8) arithmetic and symbol-level fused multiply-add
//! - [`coeff`] — Deterministic coding-coefficient generation
//! - [`window`] — Encoder-side sliding coding window
//! - [`system`] — Decoder-side incremental linear system
//! - [`codec`] — Encoder/decoder handles and codepoint dispatch
//! - [`wire`] — FEC OTI and FPI header serialization
//! - [`error`] — Codec error type

pub mod codec;
pub mod coeff;
pub mod error;
pub mod gf256;
pub mod system;
pub mod window;
pub mod wire;

pub use codec::{new_decoder, new_encoder, Codepoint, SwDecoder, SwEncoder};
pub use error::{CodecError, CodecResult};
