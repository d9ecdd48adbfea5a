//! # Wire Headers
//!
//! Fixed-layout, network-byte-order headers carried ahead of the symbol
//! payloads. Two structures cross the wire:
//!
//! FEC Object Transmission Information, sent once per session:
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Codepoint                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                     Encoding Window Size                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                     Total Source Symbols                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Total Encoding Symbols                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! FEC Payload Information, one per encoding symbol:
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Is Source           |          Repair Key           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  DT   |         NSS           |              ESI              :
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! :              ESI              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! For a source symbol ESI is the symbol's own identifier; for a repair
//! symbol it is the first ESI of the coding window, with DT (density) and
//! NSS (window symbol count) describing how to rebuild the coefficients.

use bytes::{Buf, BufMut, BytesMut};

// ─── FEC OTI ─────────────────────────────────────────────────────────────────

/// Session parameters, sent once ahead of the symbol stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecOti {
    pub codepoint: u32,
    pub encoding_window_size: u32,
    pub total_source_symbols: u32,
    pub total_encoding_symbols: u32,
}

impl FecOti {
    pub const ENCODED_LEN: usize = 16;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(Self::ENCODED_LEN);
        buf.put_u32(self.codepoint);
        buf.put_u32(self.encoding_window_size);
        buf.put_u32(self.total_source_symbols);
        buf.put_u32(self.total_encoding_symbols);
    }

    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < Self::ENCODED_LEN {
            return None;
        }
        Some(FecOti {
            codepoint: buf.get_u32(),
            encoding_window_size: buf.get_u32(),
            total_source_symbols: buf.get_u32(),
            total_encoding_symbols: buf.get_u32(),
        })
    }
}

// ─── Repair FPI ──────────────────────────────────────────────────────────────

/// Per-symbol payload information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairFpi {
    pub is_source: u16,
    pub repair_key: u16,
    /// Density type in the top 4 bits, window symbol count in the low 12.
    pub dt_nss: u16,
    pub esi: u32,
}

impl RepairFpi {
    pub const ENCODED_LEN: usize = 10;

    /// Maximum window symbol count expressible in the 12-bit NSS field.
    pub const MAX_NSS: u16 = 0x0FFF;

    pub fn source(esi: u32, density: u8) -> Self {
        debug_assert!(density <= 0xF, "density fits 4 bits");
        RepairFpi {
            is_source: 1,
            repair_key: 0,
            dt_nss: (density as u16) << 12,
            esi,
        }
    }

    pub fn repair(repair_key: u16, density: u8, nss: u16, first_esi: u32) -> Self {
        debug_assert!(density <= 0xF, "density fits 4 bits");
        debug_assert!(nss <= Self::MAX_NSS, "nss fits 12 bits");
        RepairFpi {
            is_source: 0,
            repair_key,
            dt_nss: ((density as u16) << 12) | (nss & Self::MAX_NSS),
            esi: first_esi,
        }
    }

    pub fn is_source(&self) -> bool {
        self.is_source != 0
    }

    pub fn density(&self) -> u8 {
        (self.dt_nss >> 12) as u8
    }

    pub fn nss(&self) -> u16 {
        self.dt_nss & Self::MAX_NSS
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(Self::ENCODED_LEN);
        buf.put_u16(self.is_source);
        buf.put_u16(self.repair_key);
        buf.put_u16(self.dt_nss);
        buf.put_u32(self.esi);
    }

    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < Self::ENCODED_LEN {
            return None;
        }
        Some(RepairFpi {
            is_source: buf.get_u16(),
            repair_key: buf.get_u16(),
            dt_nss: buf.get_u16(),
            esi: buf.get_u32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn oti_roundtrip() {
        let oti = FecOti {
            codepoint: 1,
            encoding_window_size: 4,
            total_source_symbols: 1000,
            total_encoding_symbols: 1250,
        };
        let mut buf = BytesMut::new();
        oti.encode(&mut buf);
        assert_eq!(buf.len(), FecOti::ENCODED_LEN);
        let decoded = FecOti::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, oti);
    }

    #[test]
    fn short_buffers_decode_to_none() {
        let mut buf = BytesMut::new();
        buf.put_bytes(0, FecOti::ENCODED_LEN - 1);
        assert!(FecOti::decode(&mut buf.clone().freeze()).is_none());
        let mut buf = BytesMut::new();
        buf.put_bytes(0, RepairFpi::ENCODED_LEN - 1);
        assert!(RepairFpi::decode(&mut buf.freeze()).is_none());
    }

    #[test]
    fn fpi_packs_density_and_nss() {
        let fpi = RepairFpi::repair(77, 15, 4, 123);
        assert!(!fpi.is_source());
        assert_eq!(fpi.density(), 15);
        assert_eq!(fpi.nss(), 4);
        assert_eq!(fpi.esi, 123);
        assert_eq!(fpi.dt_nss, 0xF004);
    }

    #[test]
    fn source_fpi_carries_its_own_esi() {
        let fpi = RepairFpi::source(42, 15);
        assert!(fpi.is_source());
        assert_eq!(fpi.esi, 42);
        assert_eq!(fpi.nss(), 0);
        assert_eq!(fpi.repair_key, 0);
    }

    proptest! {
        #[test]
        fn fpi_roundtrip(
            key in any::<u16>(),
            density in 1u8..=15,
            nss in 0u16..=RepairFpi::MAX_NSS,
            esi in any::<u32>(),
        ) {
            let fpi = RepairFpi::repair(key, density, nss, esi);
            let mut buf = BytesMut::new();
            fpi.encode(&mut buf);
            prop_assert_eq!(buf.len(), RepairFpi::ENCODED_LEN);
            let decoded = RepairFpi::decode(&mut buf.freeze()).unwrap();
            prop_assert_eq!(decoded, fpi);
            prop_assert_eq!(decoded.density(), density);
            prop_assert_eq!(decoded.nss(), nss);
        }
    }
}
