// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Decoder for the font ROM of the Toshiba TMP47C434N (TLCS-47 family).
//!
//! The layout is close to a plain top-to-bottom read, except:
//! - Bytes are interleaved within each row.  Logical byte `i` lives at
//!   physical position `i/2` when `i` is even and `i/2 + n/2` when odd.
//!   Bytes are read from the right hand end of the row.
//! - Every other band of 8 rows runs bottom to top.
//!
//! Only the exact 48 x 64 font array is accepted.  Program ROMs from the same
//! family are larger and may reverse on a different period.

use super::{DecodeTarget, Decoder};
use crate::error::RomError;

const ROWS: usize = 48;
const COLS: usize = 64;
const BAND: usize = 8;
const MAX_WORDS: usize = 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct Tlcs47FontDecoder;

/// Logical word index to physical word index, evens first then odds.
fn interleave_table(words: usize) -> Vec<usize> {
    let mut order = vec![0; words];
    for i in 0..words {
        if i & 1 == 1 {
            order[(i >> 1) + words / 2] = i;
        } else {
            order[i >> 1] = i;
        }
    }
    order
}

/// Physical row visited for logical row `row`.
fn band_row(row: usize) -> usize {
    if row & BAND != 0 {
        (row & !(BAND - 1)) | (BAND - 1 - (row & (BAND - 1)))
    } else {
        row
    }
}

impl Decoder for Tlcs47FontDecoder {
    fn name(&self) -> &'static str {
        "tlcs47font"
    }

    fn decode(&self, target: &mut DecodeTarget<'_>) -> Result<Vec<u8>, RomError> {
        let mut bytes = Vec::new();

        let words = target.cols() / 8;
        if target.word_size() != 8 || words >= MAX_WORDS {
            return Ok(bytes);
        }
        if target.cols() % 8 != 0 || target.rows() % 8 != 0 {
            return Ok(bytes);
        }
        if target.rows() != ROWS || target.cols() != COLS {
            return Ok(bytes);
        }

        let order = interleave_table(words);

        let mut adr: u32 = 0;
        for row in 0..target.rows() {
            let rowi = band_row(row);

            for word in (0..words).rev() {
                let wordi = order[word];
                let mut w: u8 = 0;
                for bit in 0..8 {
                    let coli = bit * 8 + wordi;
                    // Sizes don't line up, give up on the whole decode
                    let Some(cell) = target.bit_mut(rowi, coli)? else {
                        return Ok(Vec::new());
                    };

                    cell.assign(adr, 1 << bit);
                    if cell.effective_value() {
                        w |= 1 << bit;
                    }
                }
                bytes.push(w);
                adr += 1;
            }
        }

        Ok(bytes)
    }
}
