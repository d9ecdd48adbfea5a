//! # slipstream-sim
//!
//! UDP demonstration driver for the slipstream codec: a sender that streams
//! source symbols with interleaved repair symbols through an artificial loss
//! model, and a receiver that repairs the stream and reports what it
//! recovered. Shared pieces (loss model, fill pattern, repair cadence) live
//! here so the integration test can run the same session in-process.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;

/// Symbol payload size used by the sender/receiver pair.
pub const SYMBOL_SIZE: usize = 1024;

/// Deterministic Bernoulli packet-drop model.
pub struct LossModel {
    loss_rate: f64,
    rng: StdRng,
}

impl LossModel {
    pub fn new(loss_rate: f64, seed: u64) -> Self {
        LossModel {
            loss_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Decide the fate of the next packet.
    pub fn should_drop(&mut self) -> bool {
        self.rng.random::<f64>() < self.loss_rate
    }
}

/// Fill byte for source symbol `esi`: cycles 1..=255, never 0, so a
/// recovered symbol can be checked for corruption byte-by-byte.
pub fn fill_byte(esi: u32) -> u8 {
    ((esi % 255) + 1) as u8
}

/// A full source symbol carrying the fill pattern.
pub fn source_symbol(esi: u32) -> Bytes {
    Bytes::from(vec![fill_byte(esi); SYMBOL_SIZE])
}

/// True when `data` carries exactly the fill pattern for `esi`.
pub fn verify_symbol(esi: u32, data: &[u8]) -> bool {
    data.len() == SYMBOL_SIZE && data.iter().all(|&b| b == fill_byte(esi))
}

/// Spreads repair symbols evenly through the source stream for a target
/// code rate `r = sources / (sources + repairs)`.
pub struct RepairCadence {
    per_source: f64,
    credit: f64,
}

impl RepairCadence {
    /// `code_rate` must be in `(0, 1]`; 1.0 sends no repair symbols.
    pub fn new(code_rate: f64) -> Self {
        assert!(code_rate > 0.0 && code_rate <= 1.0, "code rate out of range");
        RepairCadence {
            per_source: (1.0 - code_rate) / code_rate,
            credit: 0.0,
        }
    }

    /// Account for one sent source symbol; returns how many repair symbols
    /// to emit now.
    pub fn on_source(&mut self) -> usize {
        self.credit += self.per_source;
        let due = self.credit as usize;
        self.credit -= due as f64;
        due
    }
}
