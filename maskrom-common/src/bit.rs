// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! A single marked bit from the die.

/// Address value of a cell no decoder has visited.
pub const UNASSIGNED: u32 = 0xFFFF_FFFF;

/// Opaque handle a front end can attach to a cell, for example the index of
/// the widget the bit was marked with.  The core copies it around but never
/// interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitCell {
    /// Raw value as marked.  Decoders must use [`BitCell::effective_value`].
    pub value: bool,
    pub inverted: bool,
    /// Byte address this bit was decoded into, or [`UNASSIGNED`].
    pub address: u32,
    /// Bit mask within `address`, 0 if unassigned.
    pub mask: u32,
    pub handle: Option<CellHandle>,
}

impl BitCell {
    pub fn new(value: bool) -> Self {
        Self {
            value,
            inverted: false,
            address: UNASSIGNED,
            mask: 0,
            handle: None,
        }
    }

    /// Value after inversion.
    pub fn effective_value(&self) -> bool {
        self.value ^ self.inverted
    }

    pub fn is_assigned(&self) -> bool {
        self.address != UNASSIGNED
    }

    /// Records where a decoder put this bit.
    pub fn assign(&mut self, address: u32, mask: u32) {
        self.address = address;
        self.mask = mask;
    }

    pub(crate) fn clear_assignment(&mut self) {
        self.address = UNASSIGNED;
        self.mask = 0;
    }
}

impl Default for BitCell {
    fn default() -> Self {
        Self::new(false)
    }
}
