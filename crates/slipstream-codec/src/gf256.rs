//! # GF(2^8) Arithmetic
//!
//! Finite-field primitives for the RLC codec. GF(2^8) with primitive
//! polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D); 2 is a primitive element
//! with order 255.
//!
//! The per-byte hot path is [`symbol_add_scaled`], the fused
//! multiply-accumulate-xor every repair-symbol synthesis and every
//! elimination step is built on. It uses a full 256×256 multiplication
//! table so the inner loop is a branch-free pair of indexed loads.

/// Multiplication and inverse tables, generated at compile time.
struct Gf256Tables {
    mul: [[u8; 256]; 256],
    inv: [u8; 256],
}

impl Gf256Tables {
    const fn generate() -> Self {
        // Log/antilog tables first: polynomial 0x11D, generator 2.
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        let mut i = 0usize;
        while i < 255 {
            exp[i] = x as u8;
            exp[i + 255] = x as u8; // duplicate for easy modular lookup
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= 0x11D;
            }
            i += 1;
        }
        // log[0] is unused (0 has no logarithm)
        log[0] = 0;

        // Expand into the full multiplication table.
        let mut mul = [[0u8; 256]; 256];
        let mut a = 1usize;
        while a < 256 {
            let mut b = 1usize;
            while b < 256 {
                mul[a][b] = exp[log[a] as usize + log[b] as usize];
                b += 1;
            }
            a += 1;
        }

        // inv[a] = exp[255 - log[a]]; 0 has no inverse.
        let mut inv = [0u8; 256];
        i = 1;
        while i < 256 {
            inv[i] = exp[255 - log[i] as usize];
            i += 1;
        }

        Gf256Tables { mul, inv }
    }
}

static GF: Gf256Tables = Gf256Tables::generate();

/// Multiplication in GF(256). Total over all byte pairs.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    GF.mul[a as usize][b as usize]
}

/// Multiplicative inverse in GF(256). `inv(0)` is a caller error and
/// returns 0.
#[inline]
pub fn inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "inverse of zero in GF(256)");
    GF.inv[a as usize]
}

/// Fused multiply-accumulate-xor: `dst[i] ^= coef * src[i]` over
/// `min(dst.len(), src.len())` bytes.
///
/// Applying this twice with the same `coef` and `src` restores `dst`
/// (XOR is its own inverse).
#[inline]
pub fn symbol_add_scaled(dst: &mut [u8], coef: u8, src: &[u8]) {
    if coef == 0 || dst.is_empty() {
        return;
    }
    let len = dst.len().min(src.len());
    if coef == 1 {
        for (d, s) in dst[..len].iter_mut().zip(src) {
            *d ^= *s;
        }
        return;
    }
    let row = &GF.mul[coef as usize];
    for (d, s) in dst[..len].iter_mut().zip(src) {
        *d ^= row[*s as usize];
    }
}

/// Scale a buffer in place: `buf[i] = coef * buf[i]`.
#[inline]
pub fn symbol_scale(buf: &mut [u8], coef: u8) {
    if coef == 1 {
        return;
    }
    let row = &GF.mul[coef as usize];
    for b in buf.iter_mut() {
        *b = row[*b as usize];
    }
}
