// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Errors returned by the transform engine and decoders.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RomError {
    /// A setter was handed a value it can't represent, such as a rotation of
    /// 45 degrees or a bank of 3.
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Malformed description '{description}': {reason}")]
    MalformedDescription { description: String, reason: String },

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Malformed bit art at line {line}: {reason}")]
    MalformedBitArt { line: usize, reason: String },

    /// Only produced in strict mode.  Non-strict accessors return `None`.
    #[error("Bit {row},{col} out of range for {rows}x{cols} matrix")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A decoder found a hole in a matrix it had already accepted.
    #[error("{decoder}: bit {bit} of row {row} is missing")]
    InternalInconsistency {
        decoder: &'static str,
        row: usize,
        bit: usize,
    },

    #[error("Decoder '{0}' is already registered")]
    DuplicateDecoder(String),

    #[error("Nothing decoded yet")]
    NotDecoded,

    #[error("Disassembler failed: {0}")]
    Disassembler(String),
}

impl RomError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString) -> Self {
        RomError::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }

    /// Returns true for errors the caller must not continue past.  Strict
    /// mode range failures and decoder inconsistencies fall in this class,
    /// everything else is a configuration problem the caller can correct.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RomError::OutOfRange { .. } | RomError::InternalInconsistency { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classes() {
        let range = RomError::OutOfRange {
            row: 9,
            col: 1,
            rows: 8,
            cols: 8,
        };
        assert!(range.is_fatal());
        assert!(
            RomError::InternalInconsistency {
                decoder: "msp430",
                row: 0,
                bit: 3
            }
            .is_fatal()
        );
        assert!(!RomError::invalid("rotation", 45).is_fatal());
        assert!(!RomError::NotDecoded.is_fatal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(RomError::invalid("bank", 3).to_string(), "Invalid bank: 3");
        assert_eq!(
            RomError::InternalInconsistency {
                decoder: "msp430",
                row: 2,
                bit: 7
            }
            .to_string(),
            "msp430: bit 7 of row 2 is missing"
        );
    }
}
