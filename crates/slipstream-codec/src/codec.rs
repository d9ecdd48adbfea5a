//! # Codec Handles
//!
//! Public encoder/decoder surface. Construction is codepoint-dispatched
//! through [`new_encoder`]/[`new_decoder`], which hand back trait objects so
//! callers stay independent of the concrete code.
//!
//! The encoder owns a sliding [`CodingWindow`] of the most recent source
//! symbols and synthesizes repair symbols as GF(256) linear combinations of
//! it. The decoder mirrors the window as a staging description (first ESI +
//! symbol count + coefficient tab) and feeds every received symbol into an
//! incrementally-solved linear system; recovered source symbols surface
//! through a caller-supplied callback.

use bytes::Bytes;
use tracing::trace;

use crate::coeff;
use crate::error::{CodecError, CodecResult};
use crate::gf256;
use crate::system::{FullSymbol, FullSymbolSet};
use crate::window::{CodingWindow, WindowInfo};

// ─── Codepoints ──────────────────────────────────────────────────────────────

/// Identifies a concrete FEC code. Carried on the wire in the FEC OTI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Codepoint {
    /// Sliding-window random linear code over GF(2^8).
    RlcGf256FullDensity = 1,
}

impl Codepoint {
    pub fn from_u32(value: u32) -> CodecResult<Self> {
        match value {
            1 => Ok(Codepoint::RlcGf256FullDensity),
            other => Err(CodecError::UnsupportedCodepoint(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

// ─── Callbacks ───────────────────────────────────────────────────────────────

/// Fired by the encoder just before a source symbol leaves the coding
/// window, while its buffer is still intact.
pub type SourceSymbolRemovedCallback = Box<dyn FnMut(u32)>;

/// Fired by the decoder for every source symbol recovered through decoding.
/// As-received source symbols are not reported.
pub type SourceSymbolDecodedCallback = Box<dyn FnMut(u32, &[u8])>;

/// Reserved: would announce a symbol as decodable ahead of materializing
/// it. Registered but never fired by the RLC decoder, which reports
/// decoded symbols directly.
pub type SourceSymbolDecodableCallback = Box<dyn FnMut(u32)>;

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Uniform encoder operation set, independent of the underlying code.
pub trait SwEncoder {
    fn symbol_size(&self) -> usize;

    fn set_source_symbol_removed_callback(&mut self, cb: SourceSymbolRemovedCallback);

    /// Slide `data` into the coding window as the symbol `esi`. After the
    /// first symbol, `esi` must be exactly one past the newest; a full
    /// window evicts its oldest symbol (removed-callback first).
    fn add_source_symbol_to_coding_window(&mut self, data: Bytes, esi: u32) -> CodecResult<()>;

    /// Reserved: the window removes symbols through FIFO eviction only.
    /// Accepted and ignored.
    fn remove_source_symbol_from_coding_window(&mut self, esi: u32) -> CodecResult<()>;

    /// Reserved: the window manages itself through eviction. Accepted and
    /// ignored.
    fn reset_coding_window(&mut self) -> CodecResult<()>;

    fn get_coding_window_information(&self) -> CodecResult<WindowInfo>;

    /// Install externally-chosen coding coefficients for the next repair
    /// symbol, oldest window symbol first.
    fn set_coding_coefs_tab(&mut self, coefs: &[u8]) -> CodecResult<()>;

    /// Derive the coefficient tab for the current window from
    /// `(repair_key, density)`. Returns the number of coefficients written,
    /// one per window symbol.
    fn generate_coding_coefs(&mut self, repair_key: u16, density: u8) -> CodecResult<usize>;

    fn get_coding_coefs_tab(&self) -> CodecResult<&[u8]>;

    /// Combine the window under the current coefficient tab into a freshly
    /// allocated repair symbol.
    fn build_repair_symbol(&mut self) -> CodecResult<Vec<u8>>;

    /// As [`Self::build_repair_symbol`], into a caller buffer of exactly
    /// the symbol size (zeroed before accumulation).
    fn build_repair_symbol_into(&mut self, buf: &mut [u8]) -> CodecResult<()>;

    /// Reserved TLV extension point. Accepted and ignored.
    fn set_parameters(&mut self, kind: u32, value: &[u8]) -> CodecResult<()>;

    /// Reserved TLV extension point. Writes nothing.
    fn get_parameters(&mut self, kind: u32, buf: &mut [u8]) -> CodecResult<usize>;
}

/// Uniform decoder operation set.
pub trait SwDecoder {
    fn symbol_size(&self) -> usize;

    fn set_source_symbol_decoded_callback(&mut self, cb: SourceSymbolDecodedCallback);

    /// Reserved: accepted, never fired.
    fn set_source_symbol_decodable_callback(&mut self, cb: SourceSymbolDecodableCallback);

    /// Clear the staged coding-window description ahead of a new repair
    /// symbol's metadata.
    fn reset_coding_window(&mut self);

    /// Stage `esi` as the next symbol of the repair symbol's coding window.
    ///
    /// The staged range must stay contiguous: after the first symbol, `esi`
    /// must be exactly one past it, and the range must fit the configured
    /// maximum window size. This is stricter than a pure range check on
    /// purpose. Coding coefficients are addressed by offset from the first
    /// staged ESI, so a gap would silently shift every later coefficient
    /// onto the wrong symbol; encoders built from a contiguous sliding
    /// window never produce gapped windows anyway.
    fn add_source_symbol_to_coding_window(&mut self, esi: u32) -> CodecResult<()>;

    /// Reserved: staged windows are rebuilt per repair symbol via
    /// [`Self::reset_coding_window`]. Accepted and ignored.
    fn remove_source_symbol_from_coding_window(&mut self, esi: u32) -> CodecResult<()>;

    fn set_coding_coefs_tab(&mut self, coefs: &[u8]) -> CodecResult<()>;

    fn get_coding_coefs_tab(&self) -> CodecResult<&[u8]>;

    /// Derive the coefficient tab for the staged window from
    /// `(repair_key, density)` — same derivation as the encoder.
    fn generate_coding_coefs(&mut self, repair_key: u16, density: u8) -> CodecResult<usize>;

    /// Feed an as-received source symbol into the linear system.
    fn decode_with_new_source_symbol(&mut self, data: &[u8], esi: u32) -> CodecResult<()>;

    /// Feed a repair symbol, described by the staged window and coefficient
    /// tab, into the linear system.
    fn decode_with_new_repair_symbol(&mut self, data: &[u8]) -> CodecResult<()>;

    /// Reserved TLV extension point. Accepted and ignored.
    fn set_parameters(&mut self, kind: u32, value: &[u8]) -> CodecResult<()>;

    /// Reserved TLV extension point. Writes nothing.
    fn get_parameters(&mut self, kind: u32, buf: &mut [u8]) -> CodecResult<usize>;
}

// ─── Factories ───────────────────────────────────────────────────────────────

pub fn new_encoder(
    codepoint: Codepoint,
    symbol_size: usize,
    max_coding_window_size: usize,
) -> CodecResult<Box<dyn SwEncoder>> {
    match codepoint {
        Codepoint::RlcGf256FullDensity => Ok(Box::new(RlcEncoder::new(
            symbol_size,
            max_coding_window_size,
        )?)),
    }
}

pub fn new_decoder(
    codepoint: Codepoint,
    symbol_size: usize,
    max_coding_window_size: usize,
    max_linear_system_size: usize,
) -> CodecResult<Box<dyn SwDecoder>> {
    match codepoint {
        Codepoint::RlcGf256FullDensity => Ok(Box::new(RlcDecoder::new(
            symbol_size,
            max_coding_window_size,
            max_linear_system_size,
        )?)),
    }
}

// ─── RLC encoder ─────────────────────────────────────────────────────────────

pub struct RlcEncoder {
    symbol_size: usize,
    max_window: usize,
    window: CodingWindow,
    /// Lazily sized to `max_window` on first coefficient use.
    coef_tab: Vec<u8>,
    /// Valid prefix of `coef_tab`; 0 means no tab has been generated or set.
    coefs_len: usize,
    removed_cb: Option<SourceSymbolRemovedCallback>,
}

impl RlcEncoder {
    pub fn new(symbol_size: usize, max_coding_window_size: usize) -> CodecResult<Self> {
        if symbol_size == 0 {
            return Err(CodecError::Precondition("symbol size must be > 0"));
        }
        if max_coding_window_size < 2 {
            return Err(CodecError::Precondition("coding window must hold >= 2 symbols"));
        }
        Ok(RlcEncoder {
            symbol_size,
            max_window: max_coding_window_size,
            window: CodingWindow::new(max_coding_window_size),
            coef_tab: Vec::new(),
            coefs_len: 0,
            removed_cb: None,
        })
    }

    fn ensure_coef_tab(&mut self) {
        if self.coef_tab.is_empty() {
            self.coef_tab = vec![0; self.max_window];
        }
    }
}

impl SwEncoder for RlcEncoder {
    fn symbol_size(&self) -> usize {
        self.symbol_size
    }

    fn set_source_symbol_removed_callback(&mut self, cb: SourceSymbolRemovedCallback) {
        self.removed_cb = Some(cb);
    }

    fn add_source_symbol_to_coding_window(&mut self, data: Bytes, esi: u32) -> CodecResult<()> {
        if data.len() != self.symbol_size {
            return Err(CodecError::SymbolSize {
                expected: self.symbol_size,
                got: data.len(),
            });
        }
        // Sequence check up front so a rejected add never fires the
        // removed callback.
        if let Some(expected) = self.window.expected_next() {
            if esi != expected {
                return Err(CodecError::Sequence { expected, got: esi });
            }
        }
        if self.window.is_full() {
            let oldest = self.window.oldest_esi().expect("full window is non-empty");
            trace!(esi = oldest, "source symbol leaves the coding window");
            if let Some(cb) = self.removed_cb.as_mut() {
                cb(oldest);
            }
        }
        self.window.push(esi, data)?;
        Ok(())
    }

    fn remove_source_symbol_from_coding_window(&mut self, _esi: u32) -> CodecResult<()> {
        Ok(())
    }

    fn reset_coding_window(&mut self) -> CodecResult<()> {
        Ok(())
    }

    fn get_coding_window_information(&self) -> CodecResult<WindowInfo> {
        self.window.info()
    }

    fn set_coding_coefs_tab(&mut self, coefs: &[u8]) -> CodecResult<()> {
        if coefs.len() > self.max_window {
            return Err(CodecError::BufferTooSmall {
                needed: coefs.len(),
                got: self.max_window,
            });
        }
        self.ensure_coef_tab();
        self.coef_tab[..coefs.len()].copy_from_slice(coefs);
        self.coefs_len = coefs.len();
        Ok(())
    }

    fn generate_coding_coefs(&mut self, repair_key: u16, density: u8) -> CodecResult<usize> {
        let info = self.window.info()?;
        let nss = info.nss as usize;
        self.ensure_coef_tab();
        coeff::generate_coding_coefficients(repair_key, &mut self.coef_tab, nss, density)?;
        self.coefs_len = nss;
        Ok(nss)
    }

    fn get_coding_coefs_tab(&self) -> CodecResult<&[u8]> {
        if self.coefs_len == 0 {
            return Err(CodecError::Precondition("no coding coefficients available"));
        }
        Ok(&self.coef_tab[..self.coefs_len])
    }

    fn build_repair_symbol(&mut self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; self.symbol_size];
        self.build_repair_symbol_into(&mut buf)?;
        Ok(buf)
    }

    fn build_repair_symbol_into(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        if buf.len() != self.symbol_size {
            return Err(CodecError::SymbolSize {
                expected: self.symbol_size,
                got: buf.len(),
            });
        }
        if self.coefs_len == 0 {
            return Err(CodecError::Precondition("coding coefficients not generated"));
        }
        let info = self.window.info()?;
        if self.coefs_len != info.nss as usize {
            return Err(CodecError::Precondition(
                "coefficient tab does not match the coding window",
            ));
        }
        buf.fill(0);
        for (coef, data) in self.coef_tab[..self.coefs_len].iter().zip(self.window.iter()) {
            gf256::symbol_add_scaled(buf, *coef, data);
        }
        Ok(())
    }

    fn set_parameters(&mut self, _kind: u32, _value: &[u8]) -> CodecResult<()> {
        Ok(())
    }

    fn get_parameters(&mut self, _kind: u32, _buf: &mut [u8]) -> CodecResult<usize> {
        Ok(0)
    }
}

// ─── RLC decoder ─────────────────────────────────────────────────────────────

pub struct RlcDecoder {
    symbol_size: usize,
    max_window: usize,
    /// Staged coding-window description for the repair symbol in flight.
    first_id: Option<u32>,
    nb_id: usize,
    coef_tab: Vec<u8>,
    coefs_len: usize,
    system: FullSymbolSet,
    decoded_cb: Option<SourceSymbolDecodedCallback>,
    #[allow(dead_code)] // registered but never fired, reserved hook
    decodable_cb: Option<SourceSymbolDecodableCallback>,
}

impl RlcDecoder {
    pub fn new(
        symbol_size: usize,
        max_coding_window_size: usize,
        max_linear_system_size: usize,
    ) -> CodecResult<Self> {
        if symbol_size == 0 {
            return Err(CodecError::Precondition("symbol size must be > 0"));
        }
        if max_coding_window_size < 2 {
            return Err(CodecError::Precondition("coding window must hold >= 2 symbols"));
        }
        if max_linear_system_size < max_coding_window_size {
            return Err(CodecError::Precondition(
                "linear system must be at least as large as the coding window",
            ));
        }
        Ok(RlcDecoder {
            symbol_size,
            max_window: max_coding_window_size,
            first_id: None,
            nb_id: 0,
            coef_tab: Vec::new(),
            coefs_len: 0,
            system: FullSymbolSet::new(symbol_size, max_linear_system_size),
            decoded_cb: None,
            decodable_cb: None,
        })
    }

    fn ensure_coef_tab(&mut self) {
        if self.coef_tab.is_empty() {
            self.coef_tab = vec![0; self.max_window];
        }
    }

    fn insert(&mut self, row: FullSymbol) -> CodecResult<()> {
        let RlcDecoder { system, decoded_cb, .. } = self;
        system.insert(row, &mut |esi, data| {
            if let Some(cb) = decoded_cb.as_mut() {
                cb(esi, data);
            }
        })
    }
}

impl SwDecoder for RlcDecoder {
    fn symbol_size(&self) -> usize {
        self.symbol_size
    }

    fn set_source_symbol_decoded_callback(&mut self, cb: SourceSymbolDecodedCallback) {
        self.decoded_cb = Some(cb);
    }

    fn set_source_symbol_decodable_callback(&mut self, cb: SourceSymbolDecodableCallback) {
        self.decodable_cb = Some(cb);
    }

    fn reset_coding_window(&mut self) {
        self.first_id = None;
        self.nb_id = 0;
        self.coefs_len = 0;
    }

    fn add_source_symbol_to_coding_window(&mut self, esi: u32) -> CodecResult<()> {
        match self.first_id {
            None => {
                self.first_id = Some(esi);
                self.nb_id = 1;
            }
            Some(first) => {
                // A window may legitimately end at u32::MAX; a staged range
                // that would run past it is rejected rather than wrapped.
                let expected = match first.checked_add(self.nb_id as u32) {
                    Some(e) => e,
                    None => {
                        return Err(CodecError::Range {
                            esi,
                            first,
                            capacity: self.max_window as u32,
                        })
                    }
                };
                if esi != expected {
                    return Err(CodecError::Sequence { expected, got: esi });
                }
                if self.nb_id >= self.max_window {
                    return Err(CodecError::Range {
                        esi,
                        first,
                        capacity: self.max_window as u32,
                    });
                }
                self.nb_id += 1;
            }
        }
        Ok(())
    }

    fn remove_source_symbol_from_coding_window(&mut self, _esi: u32) -> CodecResult<()> {
        Ok(())
    }

    fn set_coding_coefs_tab(&mut self, coefs: &[u8]) -> CodecResult<()> {
        if coefs.len() > self.max_window {
            return Err(CodecError::BufferTooSmall {
                needed: coefs.len(),
                got: self.max_window,
            });
        }
        self.ensure_coef_tab();
        self.coef_tab[..coefs.len()].copy_from_slice(coefs);
        self.coefs_len = coefs.len();
        Ok(())
    }

    fn get_coding_coefs_tab(&self) -> CodecResult<&[u8]> {
        if self.coefs_len == 0 {
            return Err(CodecError::Precondition("no coding coefficients available"));
        }
        Ok(&self.coef_tab[..self.coefs_len])
    }

    fn generate_coding_coefs(&mut self, repair_key: u16, density: u8) -> CodecResult<usize> {
        if self.first_id.is_none() {
            return Err(CodecError::Precondition("no coding window staged"));
        }
        let nss = self.nb_id;
        self.ensure_coef_tab();
        coeff::generate_coding_coefficients(repair_key, &mut self.coef_tab, nss, density)?;
        self.coefs_len = nss;
        Ok(nss)
    }

    fn decode_with_new_source_symbol(&mut self, data: &[u8], esi: u32) -> CodecResult<()> {
        if data.len() != self.symbol_size {
            return Err(CodecError::SymbolSize {
                expected: self.symbol_size,
                got: data.len(),
            });
        }
        self.insert(FullSymbol::from_source(esi, data))
    }

    fn decode_with_new_repair_symbol(&mut self, data: &[u8]) -> CodecResult<()> {
        if data.len() != self.symbol_size {
            return Err(CodecError::SymbolSize {
                expected: self.symbol_size,
                got: data.len(),
            });
        }
        let Some(first) = self.first_id else {
            return Err(CodecError::Precondition("no coding window staged"));
        };
        if self.coefs_len != self.nb_id {
            return Err(CodecError::Precondition(
                "coefficient tab does not match the staged window",
            ));
        }
        let coefs = self.coef_tab[..self.coefs_len].to_vec();
        self.insert(FullSymbol::from_repair(first, &coefs, data))
    }

    fn set_parameters(&mut self, _kind: u32, _value: &[u8]) -> CodecResult<()> {
        Ok(())
    }

    fn get_parameters(&mut self, _kind: u32, _buf: &mut [u8]) -> CodecResult<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coeff::FULL_DENSITY;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SYMBOL_SIZE: usize = 16;

    fn symbol(b: u8) -> Bytes {
        Bytes::from(vec![b; SYMBOL_SIZE])
    }

    fn encoder(window: usize) -> RlcEncoder {
        RlcEncoder::new(SYMBOL_SIZE, window).unwrap()
    }

    fn decoder(window: usize) -> RlcDecoder {
        RlcDecoder::new(SYMBOL_SIZE, window, window * 4).unwrap()
    }

    /// Attach a shared event log as the decoded callback.
    fn capture_decoded(dec: &mut RlcDecoder) -> Rc<RefCell<Vec<(u32, Vec<u8>)>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        dec.decoded_cb = Some(Box::new(move |esi, data: &[u8]| {
            sink.borrow_mut().push((esi, data.to_vec()));
        }));
        events
    }

    fn stage_and_decode_repair(
        dec: &mut RlcDecoder,
        first: u32,
        nss: u32,
        key: u16,
        density: u8,
        repair: &[u8],
    ) {
        dec.reset_coding_window();
        for esi in first..first + nss {
            dec.add_source_symbol_to_coding_window(esi).unwrap();
        }
        dec.generate_coding_coefs(key, density).unwrap();
        dec.decode_with_new_repair_symbol(repair).unwrap();
    }

    #[test]
    fn one_repair_recovers_one_loss_at_full_density() {
        let mut enc = encoder(4);
        let sources: Vec<Bytes> = (1..=4u8).map(symbol).collect();
        for (esi, s) in sources.iter().enumerate() {
            enc.add_source_symbol_to_coding_window(s.clone(), esi as u32)
                .unwrap();
        }
        enc.generate_coding_coefs(42, FULL_DENSITY).unwrap();
        let repair = enc.build_repair_symbol().unwrap();

        let mut dec = decoder(4);
        let events = capture_decoded(&mut dec);
        for esi in [0u32, 1, 3] {
            dec.decode_with_new_source_symbol(&sources[esi as usize], esi)
                .unwrap();
        }
        stage_and_decode_repair(&mut dec, 0, 4, 42, FULL_DENSITY, &repair);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, 2);
        assert_eq!(events[0].1, sources[2].as_ref());
    }

    #[test]
    fn repair_generation_is_idempotent() {
        let mut enc = encoder(4);
        for esi in 0..4u32 {
            enc.add_source_symbol_to_coding_window(symbol(esi as u8 + 1), esi)
                .unwrap();
        }
        enc.generate_coding_coefs(7, FULL_DENSITY).unwrap();
        let tab_a = enc.get_coding_coefs_tab().unwrap().to_vec();
        let repair_a = enc.build_repair_symbol().unwrap();

        enc.generate_coding_coefs(7, FULL_DENSITY).unwrap();
        let tab_b = enc.get_coding_coefs_tab().unwrap().to_vec();
        let repair_b = enc.build_repair_symbol().unwrap();

        assert_eq!(tab_a, tab_b);
        assert_eq!(repair_a, repair_b);
    }

    #[test]
    fn two_losses_recovered_with_explicit_coefficient_tabs() {
        // Coefficient rows [1,1,1,1] and [1,2,4,8]; the 2x2 submatrix over
        // the two missing positions is invertible for any pair of columns.
        let tabs: [&[u8]; 2] = [&[1, 1, 1, 1], &[1, 2, 4, 8]];

        let mut enc = encoder(4);
        let sources: Vec<Bytes> = (0..4u8).map(|i| symbol(0x10 + i)).collect();
        for (esi, s) in sources.iter().enumerate() {
            enc.add_source_symbol_to_coding_window(s.clone(), esi as u32)
                .unwrap();
        }
        let repairs: Vec<Vec<u8>> = tabs
            .iter()
            .map(|tab| {
                enc.set_coding_coefs_tab(tab).unwrap();
                enc.build_repair_symbol().unwrap()
            })
            .collect();

        // Lose esis 1 and 3.
        let mut dec = decoder(4);
        let events = capture_decoded(&mut dec);
        for esi in [0u32, 2] {
            dec.decode_with_new_source_symbol(&sources[esi as usize], esi)
                .unwrap();
        }
        for (tab, repair) in tabs.iter().zip(&repairs) {
            dec.reset_coding_window();
            for esi in 0..4 {
                dec.add_source_symbol_to_coding_window(esi).unwrap();
            }
            dec.set_coding_coefs_tab(tab).unwrap();
            dec.decode_with_new_repair_symbol(repair).unwrap();
        }

        let mut events = events.borrow().clone();
        events.sort_by_key(|(esi, _)| *esi);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (1, sources[1].to_vec()));
        assert_eq!(events[1], (3, sources[3].to_vec()));
    }

    #[test]
    fn eviction_fires_removed_callback_in_fifo_order() {
        let mut enc = encoder(2);
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = removed.clone();
        enc.removed_cb = Some(Box::new(move |esi| sink.borrow_mut().push(esi)));

        for esi in 0..4u32 {
            enc.add_source_symbol_to_coding_window(symbol(esi as u8 + 1), esi)
                .unwrap();
        }
        assert_eq!(*removed.borrow(), vec![0, 1]);
        let info = enc.get_coding_window_information().unwrap();
        assert_eq!((info.first, info.last, info.nss), (2, 3, 2));
    }

    #[test]
    fn rejected_add_does_not_fire_removed_callback() {
        let mut enc = encoder(2);
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = removed.clone();
        enc.removed_cb = Some(Box::new(move |esi| sink.borrow_mut().push(esi)));

        enc.add_source_symbol_to_coding_window(symbol(1), 0).unwrap();
        enc.add_source_symbol_to_coding_window(symbol(2), 1).unwrap();
        let err = enc
            .add_source_symbol_to_coding_window(symbol(3), 5)
            .unwrap_err();
        assert_eq!(err, CodecError::Sequence { expected: 2, got: 5 });
        assert!(removed.borrow().is_empty());
    }

    #[test]
    fn build_repair_before_coefs_is_a_precondition_error() {
        let mut enc = encoder(4);
        enc.add_source_symbol_to_coding_window(symbol(1), 0).unwrap();
        assert!(matches!(
            enc.build_repair_symbol(),
            Err(CodecError::Precondition(_))
        ));
    }

    #[test]
    fn stale_coefficient_tab_is_rejected() {
        let mut enc = encoder(4);
        enc.add_source_symbol_to_coding_window(symbol(1), 0).unwrap();
        enc.add_source_symbol_to_coding_window(symbol(2), 1).unwrap();
        enc.generate_coding_coefs(3, FULL_DENSITY).unwrap();
        // Window grows after generation; the two-entry tab no longer fits.
        enc.add_source_symbol_to_coding_window(symbol(3), 2).unwrap();
        assert!(matches!(
            enc.build_repair_symbol(),
            Err(CodecError::Precondition(_))
        ));
    }

    #[test]
    fn decoder_staging_rejects_gaps_and_overflow() {
        let mut dec = decoder(2);
        dec.add_source_symbol_to_coding_window(10).unwrap();
        assert_eq!(
            dec.add_source_symbol_to_coding_window(12).unwrap_err(),
            CodecError::Sequence { expected: 11, got: 12 }
        );
        dec.add_source_symbol_to_coding_window(11).unwrap();
        assert_eq!(
            dec.add_source_symbol_to_coding_window(12).unwrap_err(),
            CodecError::Range { esi: 12, first: 10, capacity: 2 }
        );
        // Reset clears the staged description entirely.
        dec.reset_coding_window();
        dec.add_source_symbol_to_coding_window(30).unwrap();
        // At the top of the ESI space the staged range refuses to wrap.
        dec.reset_coding_window();
        dec.add_source_symbol_to_coding_window(u32::MAX).unwrap();
        assert_eq!(
            dec.add_source_symbol_to_coding_window(0).unwrap_err(),
            CodecError::Range { esi: 0, first: u32::MAX, capacity: 2 }
        );
    }

    #[test]
    fn unsupported_codepoint_is_rejected() {
        assert_eq!(
            Codepoint::from_u32(9).unwrap_err(),
            CodecError::UnsupportedCodepoint(9)
        );
        assert_eq!(Codepoint::from_u32(1).unwrap(), Codepoint::RlcGf256FullDensity);
    }

    proptest! {
        /// At full density every coefficient is non-zero, so any single
        /// missing symbol inside the window is always recoverable from one
        /// repair, whatever the key.
        #[test]
        fn any_single_loss_recovers_at_full_density(
            key in any::<u16>(),
            missing in 0u32..4,
            seed in any::<u8>(),
        ) {
            let mut enc = encoder(4);
            let sources: Vec<Bytes> = (0..4u8)
                .map(|i| symbol(seed.wrapping_add(i).wrapping_add(1)))
                .collect();
            for (esi, s) in sources.iter().enumerate() {
                enc.add_source_symbol_to_coding_window(s.clone(), esi as u32).unwrap();
            }
            enc.generate_coding_coefs(key, FULL_DENSITY).unwrap();
            let repair = enc.build_repair_symbol().unwrap();

            let mut dec = decoder(4);
            let events = capture_decoded(&mut dec);
            for esi in 0..4u32 {
                if esi != missing {
                    dec.decode_with_new_source_symbol(&sources[esi as usize], esi).unwrap();
                }
            }
            stage_and_decode_repair(&mut dec, 0, 4, key, FULL_DENSITY, &repair);

            let events = events.borrow();
            prop_assert_eq!(events.len(), 1);
            prop_assert_eq!(events[0].0, missing);
            prop_assert_eq!(events[0].1.as_slice(), sources[missing as usize].as_ref());
        }
    }
}
