// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Decoder for MSP430 style ROMs, with 16-bit words interleaved across each
//! row.
//!
//! A row holding `n` words has the bits of word `w` at columns
//! `w, w + n, w + 2n, ...`, so neighbouring columns belong to different
//! words.  The first bit collected is the most significant.  Words are
//! written out little endian.
//!
//! This bit order has not been confirmed against a real part.

use log::error;

use super::{DecodeTarget, Decoder};
use crate::error::RomError;

const WORD_BITS: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct Msp430Decoder;

impl Decoder for Msp430Decoder {
    fn name(&self) -> &'static str {
        "msp430"
    }

    fn decode(&self, target: &mut DecodeTarget<'_>) -> Result<Vec<u8>, RomError> {
        let mut bytes = Vec::new();
        let mut adr: u32 = 0;

        if target.cols() % WORD_BITS != 0 {
            return Ok(bytes);
        }
        let words = target.cols() / WORD_BITS;

        for row in 0..target.rows() {
            for word in 0..words {
                let mut w: u32 = 0;
                for bit in 0..WORD_BITS {
                    let Some(cell) = target.bit_mut(row, bit * words + word)? else {
                        error!("Bit {} of row {} is missing", bit, row);
                        return Err(RomError::InternalInconsistency {
                            decoder: self.name(),
                            row,
                            bit,
                        });
                    };

                    cell.assign(adr + (bit / 8) as u32, 1 << (bit % 8));
                    w = (w << 1) | cell.effective_value() as u32;
                }
                bytes.push((w & 0xFF) as u8);
                bytes.push(((w >> 8) & 0xFF) as u8);
                adr += 2;
            }
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit::UNASSIGNED;
    use crate::matrix::BitMatrix;

    fn matrix(rows: &[&str]) -> BitMatrix {
        let rows: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| r.chars().map(|c| c == '1').collect())
            .collect();
        BitMatrix::from_rows(&rows).unwrap()
    }

    fn decode(m: &mut BitMatrix) -> Vec<u8> {
        Msp430Decoder
            .decode(&mut DecodeTarget::new(m, 8, false))
            .unwrap()
    }

    #[test]
    fn test_single_word() {
        let mut m = matrix(&["0000000000000001"]);
        assert_eq!(decode(&mut m), vec![0x01, 0x00]);
        // Deterministic on a second pass
        assert_eq!(decode(&mut m), vec![0x01, 0x00]);

        let last = m.get(0, 15).unwrap();
        assert_eq!((last.address, last.mask), (1, 0x80));
        let first = m.get(0, 0).unwrap();
        assert_eq!((first.address, first.mask), (0, 0x01));
    }

    #[test]
    fn test_msb_first() {
        let mut m = matrix(&["1000000000000000"]);
        assert_eq!(decode(&mut m), vec![0x00, 0x80]);
        let mut m = matrix(&["0000000110000000"]);
        assert_eq!(decode(&mut m), vec![0x80, 0x01]);
    }

    #[test]
    fn test_strided_words() {
        // Two words per row: even columns are word 0, odd columns word 1
        let mut m = matrix(&[
            "10000000000000000000000000000001",
            "01000000000000000000000000000000",
        ]);
        assert_eq!(
            decode(&mut m),
            vec![0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00, 0x80]
        );

        // Column 31 is bit 15 of word 1 on row 0
        let cell = m.get(0, 31).unwrap();
        assert_eq!((cell.address, cell.mask), (3, 0x80));
        // Column 1 of row 1 is bit 0 of word 1, the fourth word overall
        let cell = m.get(1, 1).unwrap();
        assert_eq!((cell.address, cell.mask), (6, 0x01));
    }

    #[test]
    fn test_inverted_bits() {
        let mut m = matrix(&["0000000000000000"]);
        for cell in m.cells_mut() {
            cell.inverted = true;
        }
        assert_eq!(decode(&mut m), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_rejects_bad_widths() {
        for cols in [0, 1, 15, 17, 33] {
            let mut m = BitMatrix::new(2, cols);
            assert!(decode(&mut m).is_empty(), "{} columns", cols);
            assert!(m.cells().iter().all(|c| c.address == UNASSIGNED));
        }
    }

    #[test]
    fn test_every_bit_tagged_once() {
        let mut m = BitMatrix::new(4, 64);
        let bytes = decode(&mut m);
        assert_eq!(bytes.len(), 4 * 4 * 2);

        let mut seen = std::collections::HashSet::new();
        for cell in m.cells() {
            assert!((cell.address as usize) < bytes.len());
            assert!(seen.insert((cell.address, cell.mask)));
        }
    }
}
