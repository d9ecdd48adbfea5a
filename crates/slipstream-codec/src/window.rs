//! # Encoder Coding Window
//!
//! Bounded circular buffer of source symbols eligible for combination into
//! repair symbols. Symbols enter in strictly increasing, gap-free ESI order;
//! when the window is full the oldest symbol is evicted FIFO. All ring-index
//! arithmetic lives here so the contiguity invariant
//! (`last - first + 1 == nss`) is enforced in one place.
//!
//! The window owns its buffers: `push` takes the symbol by value, and
//! eviction hands the old buffer back to the caller.

use bytes::Bytes;

use crate::error::{CodecError, CodecResult};

/// A symbol evicted from a full window to make room for a newer one.
#[derive(Debug)]
pub struct Evicted {
    /// ESI of the evicted symbol.
    pub esi: u32,
    /// The evicted buffer, ownership returned to the caller.
    pub data: Bytes,
}

/// Bounds of the live window: the contiguous ESI range `[first, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    /// ESI of the oldest symbol in the window.
    pub first: u32,
    /// ESI of the newest symbol in the window.
    pub last: u32,
    /// Number of symbols currently present.
    pub nss: u32,
}

/// Fixed-capacity FIFO coding window.
pub struct CodingWindow {
    slots: Box<[Option<Bytes>]>,
    /// Slot index of the oldest symbol.
    left: usize,
    /// Slot index of the newest symbol.
    right: usize,
    /// Number of occupied slots.
    len: usize,
    /// ESI of the newest symbol; `None` until the first push.
    esi_right: Option<u32>,
}

impl CodingWindow {
    /// Create an empty window holding at most `capacity` symbols.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "coding window capacity must be > 0");
        CodingWindow {
            slots: vec![None; capacity].into_boxed_slice(),
            left: 0,
            right: 0,
            len: 0,
            esi_right: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// The only ESI the next `push` will accept, once a symbol has been
    /// added. `None` while the window has never seen a symbol.
    pub fn expected_next(&self) -> Option<u32> {
        self.esi_right.map(|r| r.wrapping_add(1))
    }

    /// ESI of the symbol a full window would evict next.
    pub fn oldest_esi(&self) -> Option<u32> {
        self.esi_right.map(|r| r - (self.len as u32 - 1))
    }

    /// Add a source symbol.
    ///
    /// Three cases: rejection of a non-contiguous ESI (window unchanged),
    /// append while not yet full, or FIFO evict-then-overwrite when full.
    /// The evicted symbol, if any, is returned with its buffer.
    pub fn push(&mut self, esi: u32, data: Bytes) -> CodecResult<Option<Evicted>> {
        if let Some(expected) = self.expected_next() {
            if esi != expected {
                return Err(CodecError::Sequence { expected, got: esi });
            }
        }

        if self.is_full() {
            let evicted_esi = self.oldest_esi().expect("full window has an oldest esi");
            let old = self.slots[self.left]
                .replace(data)
                .expect("oldest slot of a full window is occupied");
            self.right = self.left;
            self.left = (self.left + 1) % self.capacity();
            self.esi_right = Some(esi);
            Ok(Some(Evicted {
                esi: evicted_esi,
                data: old,
            }))
        } else if self.len == 0 {
            debug_assert_eq!(self.left, self.right);
            self.slots[self.right] = Some(data);
            self.esi_right = Some(esi);
            self.len = 1;
            Ok(None)
        } else {
            self.right = (self.right + 1) % self.capacity();
            self.slots[self.right] = Some(data);
            self.esi_right = Some(esi);
            self.len += 1;
            Ok(None)
        }
    }

    /// Window bounds. Fails with [`CodecError::EmptyWindow`] before the
    /// first symbol has ever been added.
    pub fn info(&self) -> CodecResult<WindowInfo> {
        let last = self.esi_right.ok_or(CodecError::EmptyWindow)?;
        let nss = self.len as u32;
        // nss >= 1 here, and a window that has seen ESIs 0..=last holds at
        // most last + 1 symbols, so this cannot underflow.
        Ok(WindowInfo {
            first: last - (nss - 1),
            last,
            nss,
        })
    }

    /// Iterate the live symbols oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        let cap = self.capacity();
        (0..self.len).map(move |i| {
            let idx = (self.left + i) % cap;
            self.slots[idx].as_ref().expect("slot within len is occupied")
        })
    }
}
