// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Bit art, the plain text form of a bit matrix.
//!
//! One line per row, `1` for a set bit and `0` for a clear one.  Spaces,
//! tabs and carriage returns are ignored so rows may be grouped for
//! readability, and blank lines are skipped.

use crate::bit::BitCell;
use crate::error::RomError;
use crate::matrix::BitMatrix;

// Pretty output puts a space after this many columns
const PRETTY_GROUP: usize = 8;

/// Parses bit art into a matrix.
pub fn parse(text: &str) -> Result<BitMatrix, RomError> {
    let mut cells = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (ii, line) in text.split('\n').enumerate() {
        let mut width = 0;
        for ch in line.chars() {
            match ch {
                '0' => cells.push(BitCell::new(false)),
                '1' => cells.push(BitCell::new(true)),
                ' ' | '\t' | '\r' => continue,
                _ => {
                    return Err(RomError::MalformedBitArt {
                        line: ii + 1,
                        reason: format!("unexpected character '{}'", ch.escape_debug()),
                    });
                }
            }
            width += 1;
        }

        if width == 0 {
            continue;
        }
        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(RomError::MalformedBitArt {
                    line: ii + 1,
                    reason: format!("row has {} bits, expected {}", width, expected),
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let cols = cols.unwrap_or(0);
    BitMatrix::from_cells(rows, cols, cells).ok_or_else(|| RomError::MalformedBitArt {
        line: rows,
        reason: "inconsistent row lengths".to_string(),
    })
}

/// Renders the effective values of a matrix as bit art.
pub fn render(matrix: &BitMatrix, pretty: bool) -> String {
    let mut out = String::with_capacity(matrix.rows() * (matrix.cols() + 1));
    for row in 0..matrix.rows() {
        if let Some(cells) = matrix.row(row) {
            for (col, cell) in cells.iter().enumerate() {
                if pretty && col > 0 && col % PRETTY_GROUP == 0 {
                    out.push(' ');
                }
                out.push(if cell.effective_value() { '1' } else { '0' });
            }
        }
        out.push('\n');
    }
    out
}
