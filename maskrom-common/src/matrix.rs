// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Row-major storage for a two dimensional array of bits.

use crate::bit::BitCell;

/// A `rows` x `cols` array of cells held in one buffer, indexed
/// `row * cols + col`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<BitCell>,
}

impl BitMatrix {
    /// Creates an all-zero matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![BitCell::default(); rows * cols],
        }
    }

    /// Wraps an existing buffer.  Returns `None` if the buffer length
    /// doesn't match the dimensions.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<BitCell>) -> Option<Self> {
        if cells.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, cells })
    }

    /// Builds a matrix from plain values, one inner `Vec` per row.  Returns
    /// `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let cells = rows
            .iter()
            .flat_map(|r| r.iter().map(|&v| BitCell::new(v)))
            .collect();
        Some(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Buffer index of a position, if it's in range.
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&BitCell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut BitCell> {
        self.index(row, col).map(|i| &mut self.cells[i])
    }

    pub fn row(&self, row: usize) -> Option<&[BitCell]> {
        if row < self.rows {
            Some(&self.cells[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[BitCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [BitCell] {
        &mut self.cells
    }

    /// Effective values, one `Vec` per row.
    pub fn values(&self) -> Vec<Vec<bool>> {
        (0..self.rows)
            .map(|r| {
                self.cells[r * self.cols..(r + 1) * self.cols]
                    .iter()
                    .map(BitCell::effective_value)
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing() {
        let mut m = BitMatrix::new(2, 3);
        assert_eq!(m.index(1, 2), Some(5));
        assert_eq!(m.index(2, 0), None);
        assert_eq!(m.index(0, 3), None);

        m.get_mut(1, 0).unwrap().value = true;
        assert!(m.cells()[3].value);
        assert_eq!(m.row(1).unwrap().len(), 3);
        assert!(m.row(2).is_none());
    }

    #[test]
    fn test_from_rows() {
        let m = BitMatrix::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 2));
        assert_eq!(m.values(), vec![vec![true, false], vec![false, true]]);

        assert!(BitMatrix::from_rows(&[vec![true], vec![true, false]]).is_none());
        assert!(BitMatrix::from_rows(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_from_cells_length_check() {
        assert!(BitMatrix::from_cells(2, 2, vec![BitCell::default(); 3]).is_none());
        assert!(BitMatrix::from_cells(2, 2, vec![BitCell::default(); 4]).is_some());
    }
}
