//! # Coding-Coefficient Generation
//!
//! Deterministic pseudo-random coefficients over GF(256), keyed by a repair
//! key. The repair packet header carries only the key and the density, not
//! the coefficients themselves, so encoder and decoder must derive an
//! identical sequence from identical `(key, count, density)` inputs.
//!
//! The `density` knob (1..=15) biases the fraction of non-zero coefficients:
//! at 15 (full density) every coefficient is a uniform non-zero field
//! element, at lower values each position is non-zero with probability
//! `density / 16`. Density 0 is reserved.
//!
//! No cryptographic property is claimed; the generator is a plain
//! xoshiro256** seeded from the key via splitmix64.

use crate::error::{CodecError, CodecResult};

/// Full density: every coefficient non-zero.
pub const FULL_DENSITY: u8 = 15;

/// xoshiro256** with splitmix64 seeding.
struct CoefRng {
    state: [u64; 4],
}

impl CoefRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut z = seed;
        for slot in &mut s {
            z = z.wrapping_add(0x9e3779b97f4a7c15);
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            *slot = z ^ (z >> 31);
        }
        CoefRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = self.state[1]
            .wrapping_mul(5)
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform non-zero GF(256) element.
    fn next_nonzero(&mut self) -> u8 {
        loop {
            let c = (self.next_u64() & 0xFF) as u8;
            if c != 0 {
                return c;
            }
        }
    }
}

/// Fill `dst[..count]` with the coefficient sequence for `repair_key`.
///
/// Pure function of `(repair_key, count, density)`: a position only consumes
/// extra PRNG draws when it is non-zero, so shorter prefixes of the same key
/// agree with longer ones.
///
/// Errors: [`CodecError::BufferTooSmall`] if `dst` holds fewer than `count`
/// bytes, [`CodecError::InvalidDensity`] for densities outside 1..=15.
pub fn generate_coding_coefficients(
    repair_key: u16,
    dst: &mut [u8],
    count: usize,
    density: u8,
) -> CodecResult<()> {
    if density == 0 || density > FULL_DENSITY {
        return Err(CodecError::InvalidDensity(density));
    }
    if dst.len() < count {
        return Err(CodecError::BufferTooSmall {
            needed: count,
            got: dst.len(),
        });
    }

    let mut rng = CoefRng::new(repair_key as u64);
    for slot in &mut dst[..count] {
        if density == FULL_DENSITY {
            *slot = rng.next_nonzero();
        } else if ((rng.next_u64() & 0xF) as u8) < density {
            *slot = rng.next_nonzero();
        } else {
            *slot = 0;
        }
    }
    Ok(())
}
