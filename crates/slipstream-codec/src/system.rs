//! # Decoder Linear System
//!
//! The decoder's view of a session is a set of linear equations over GF(256):
//! each received source symbol contributes a trivial unit equation, each
//! repair symbol contributes `coefficients • [sources in esi range] = payload`.
//!
//! [`FullSymbolSet`] keeps the equations in reduced row-echelon form
//! incrementally: every insertion is forward-reduced against existing pivot
//! rows, then its fresh pivot column is back-substituted out of every other
//! row. A row whose support collapses to a single column is a solved source
//! symbol and is reported through the caller's notify hook the moment it
//! happens — no batch solve, no buffering of the whole session.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{CodecError, CodecResult};
use crate::gf256;

/// One linear equation: `coefs` applies to the contiguous ESI range starting
/// at `first_esi`; `data` is the right-hand side.
#[derive(Debug, Clone)]
pub struct FullSymbol {
    first_esi: u32,
    coefs: Vec<u8>,
    data: Vec<u8>,
    /// Rows born from as-received source symbols mark their ESI as already
    /// known to the application, so it is never reported as a decode event.
    is_source: bool,
}

impl FullSymbol {
    /// Trivial equation for an as-received source symbol: unit coefficient
    /// at its own ESI.
    pub fn from_source(esi: u32, data: &[u8]) -> Self {
        FullSymbol {
            first_esi: esi,
            coefs: vec![1],
            data: data.to_vec(),
            is_source: true,
        }
    }

    /// Equation for a repair symbol over `[first_esi, first_esi + coefs.len())`.
    pub fn from_repair(first_esi: u32, coefs: &[u8], data: &[u8]) -> Self {
        FullSymbol {
            first_esi,
            coefs: coefs.to_vec(),
            data: data.to_vec(),
            is_source: false,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One past the last ESI this row's coefficient vector covers. Widened
    /// to u64 so a row whose window ends at `u32::MAX` stays representable.
    fn end(&self) -> u64 {
        self.first_esi as u64 + self.coefs.len() as u64
    }

    fn coef_at(&self, esi: u32) -> u8 {
        if esi < self.first_esi || (esi as u64) >= self.end() {
            return 0;
        }
        self.coefs[(esi - self.first_esi) as usize]
    }

    /// Lowest-ESI non-zero coefficient, if any.
    fn lead(&self) -> Option<(u32, u8)> {
        self.coefs
            .iter()
            .position(|&c| c != 0)
            .map(|i| (self.first_esi + i as u32, self.coefs[i]))
    }

    fn nonzero_count(&self) -> usize {
        self.coefs.iter().filter(|&&c| c != 0).count()
    }

    fn payload_is_zero(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    fn solved(&self) -> bool {
        self.nonzero_count() == 1
    }

    /// Extend the coefficient vector (zero-padded) to cover `[first, end)`.
    fn grow_to_cover(&mut self, first: u32, end: u64) {
        if first < self.first_esi {
            let pad = (self.first_esi - first) as usize;
            let mut grown = vec![0u8; pad + self.coefs.len()];
            grown[pad..].copy_from_slice(&self.coefs);
            self.coefs = grown;
            self.first_esi = first;
        }
        if end > self.end() {
            let new_len = (end - self.first_esi as u64) as usize;
            self.coefs.resize(new_len, 0);
        }
    }

    /// `self -= factor * other`, symbol-wise and coefficient-wise.
    fn eliminate(&mut self, factor: u8, other: &FullSymbol) {
        self.grow_to_cover(other.first_esi, other.end());
        for (i, &c) in other.coefs.iter().enumerate() {
            if c != 0 {
                let idx = (other.first_esi - self.first_esi) as usize + i;
                self.coefs[idx] ^= gf256::mul(factor, c);
            }
        }
        gf256::symbol_add_scaled(&mut self.data, factor, &other.data);
    }

    /// Scale the whole row so the given lead coefficient becomes 1.
    fn normalize(&mut self, lead_coef: u8) {
        if lead_coef == 1 {
            return;
        }
        let inv = gf256::inv(lead_coef);
        gf256::symbol_scale(&mut self.coefs, inv);
        gf256::symbol_scale(&mut self.data, inv);
    }
}

/// Incrementally-reduced set of equations with pivot per ESI.
pub struct FullSymbolSet {
    symbol_size: usize,
    /// Soft bound on retained rows; exceeding it is logged, not enforced.
    max_rows: usize,
    rows: Vec<FullSymbol>,
    /// Pivot column (ESI) of each stored row -> row index. One pivot per ESI.
    pivot_index: BTreeMap<u32, usize>,
    /// ESIs the application already has, either received directly or
    /// reported through the notify hook. Guards against double reporting.
    reported: BTreeSet<u32>,
}

impl FullSymbolSet {
    pub fn new(symbol_size: usize, max_rows: usize) -> Self {
        FullSymbolSet {
            symbol_size,
            max_rows,
            rows: Vec::new(),
            pivot_index: BTreeMap::new(),
            reported: BTreeSet::new(),
        }
    }

    /// Number of equations retained (solved and unsolved).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of ESIs whose value is known.
    pub fn solved_count(&self) -> usize {
        self.rows.iter().filter(|r| r.solved()).count()
    }

    /// The decoded value for `esi`, if its equation has been solved.
    pub fn solved_symbol(&self, esi: u32) -> Option<&[u8]> {
        let &idx = self.pivot_index.get(&esi)?;
        let row = &self.rows[idx];
        row.solved().then_some(row.data.as_slice())
    }

    /// Insert an equation, reducing it against the existing system and
    /// back-substituting its pivot into the other rows.
    ///
    /// `notify` is called synchronously with `(esi, symbol)` for every
    /// source symbol newly solved by this insertion — possibly several, when
    /// an insertion cascades. Redundant equations are silently discarded;
    /// an equation that reduces to `0 = non-zero` yields
    /// [`CodecError::Inconsistent`] (diagnostic — the set is unchanged and
    /// further insertions are fine).
    pub fn insert(
        &mut self,
        mut row: FullSymbol,
        notify: &mut dyn FnMut(u32, &[u8]),
    ) -> CodecResult<()> {
        debug_assert_eq!(row.data.len(), self.symbol_size, "row payload size");

        if row.is_source {
            // The application handed us this symbol; its ESI is never a
            // decode event, even if the row itself ends up pivoting another
            // column after reduction.
            self.reported.insert(row.first_esi);
        }

        // Forward reduction, ascending ESI. Stored rows have their lead
        // normalized to 1 and their support only at or above their pivot,
        // so one ascending scan reaches a fixed point even as elimination
        // widens the row.
        let mut esi = row.first_esi as u64;
        while esi < row.end() {
            // esi < end <= u32::MAX + 1, so the narrowing is lossless.
            let col = esi as u32;
            let c = row.coef_at(col);
            if c != 0 {
                if let Some(&idx) = self.pivot_index.get(&col) {
                    row.eliminate(c, &self.rows[idx]);
                }
            }
            esi += 1;
        }

        let Some((lead, lead_coef)) = row.lead() else {
            if row.payload_is_zero() {
                // Linear combination of what we already know.
                return Ok(());
            }
            warn!("equation reduced to 0 = non-zero; dropping inconsistent symbol");
            return Err(CodecError::Inconsistent);
        };

        row.normalize(lead_coef);
        let idx = self.rows.len();
        self.rows.push(row);
        self.pivot_index.insert(lead, idx);
        if self.rows.len() > self.max_rows {
            warn!(
                rows = self.rows.len(),
                max = self.max_rows,
                "linear system exceeds configured size"
            );
        }

        let mut newly_solved = Vec::new();
        if self.rows[idx].solved() {
            newly_solved.push(idx);
        }

        // Back-substitute the fresh pivot out of every other row. The clone
        // sidesteps borrowing the new row while mutating its siblings.
        let new_row = self.rows[idx].clone();
        for (i, other) in self.rows.iter_mut().enumerate() {
            if i == idx {
                continue;
            }
            let factor = other.coef_at(lead);
            if factor != 0 {
                other.eliminate(factor, &new_row);
                if other.solved() {
                    newly_solved.push(i);
                }
            }
        }

        for i in newly_solved {
            let row = &self.rows[i];
            let (esi, _) = row.lead().expect("solved row has a pivot");
            if self.reported.insert(esi) {
                debug!(esi, "source symbol decoded");
                notify(esi, &row.data);
            }
        }
        Ok(())
    }
}
