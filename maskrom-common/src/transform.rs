// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Geometric transforms from the input matrix to the output matrix.
//!
//! Transforms never touch cells.  They are evaluated on an [`IndexGrid`],
//! which records for every output position the buffer index of the input
//! cell that lands there.  The engine then copies cells through the grid in
//! one pass.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

use crate::error::RomError;

/// Clockwise rotation in multiples of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    pub fn try_from_degrees(degrees: u32) -> Result<Self, RomError> {
        Self::from_degrees(degrees).ok_or_else(|| RomError::invalid("rotation", degrees))
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Composes two rotations.
    pub fn then(self, other: Rotation) -> Rotation {
        // Both inputs are valid, so the sum mod 360 always is too
        match (self.degrees() + other.degrees()) % 360 {
            90 => Rotation::R90,
            180 => Rotation::R180,
            270 => Rotation::R270,
            _ => Rotation::R0,
        }
    }

    /// True if the rotation swaps rows and columns.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

impl Serialize for Rotation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.degrees())
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let degrees = u32::deserialize(deserializer)?;
        Rotation::from_degrees(degrees).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "Invalid rotation: {}, must be 0, 90, 180 or 270",
                degrees
            ))
        })
    }
}

/// Half of each row exposed to the decoder, for chips with two banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bank {
    #[default]
    None,
    Left,
    Right,
}

impl Bank {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Bank::None),
            1 => Some(Bank::Left),
            2 => Some(Bank::Right),
            _ => None,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            Bank::None => 0,
            Bank::Left => 1,
            Bank::Right => 2,
        }
    }
}

impl Serialize for Bank {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.index())
    }
}

impl<'de> Deserialize<'de> for Bank {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let index = u32::deserialize(deserializer)?;
        Bank::from_index(index).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid bank: {}, must be 0, 1 or 2", index))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TransformStep {
    Rotate,
    FlipX,
    FlipY,
    Invert,
    Bank,
}

/// The fixed sequence of steps `eval()` runs.
///
/// | Order               | Steps                                  |
/// |---------------------|----------------------------------------|
/// | `Standard`          | Rotate, FlipX, FlipY, Invert, Bank     |
/// | `LegacyRotateFirst` | Rotate, FlipY, FlipX, Invert, Bank     |
/// | `LegacyFlipFirst`   | FlipX, FlipY, Rotate, Invert, Bank     |
///
/// The legacy orders reproduce the companion tool's compatibility mode,
/// which mirrors the unrotated array unless asked to rotate first.
///
/// The two flips commute, so `LegacyRotateFirst` always gives the same
/// output as `Standard`.  It is kept as its own variant so the mode a
/// description asked for is still reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum TransformOrder {
    Standard,
    LegacyRotateFirst,
    LegacyFlipFirst,
}

impl TransformOrder {
    pub fn select(compat: bool, zero_first: bool) -> Self {
        match (compat, zero_first) {
            (false, _) => TransformOrder::Standard,
            (true, true) => TransformOrder::LegacyRotateFirst,
            (true, false) => TransformOrder::LegacyFlipFirst,
        }
    }

    pub fn steps(&self) -> &'static [TransformStep] {
        use TransformStep::*;
        match self {
            TransformOrder::Standard => &[Rotate, FlipX, FlipY, Invert, Bank],
            TransformOrder::LegacyRotateFirst => &[Rotate, FlipY, FlipX, Invert, Bank],
            TransformOrder::LegacyFlipFirst => &[FlipX, FlipY, Rotate, Invert, Bank],
        }
    }
}

/// Everything `eval()` needs to know about the requested orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformParams {
    pub rotation: Rotation,
    pub flip_x: bool,
    pub flip_y: bool,
    pub invert: bool,
    pub bank: Bank,
}

/// Maps each output position to an input buffer index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGrid {
    pub rows: usize,
    pub cols: usize,
    pub src: Vec<usize>,
}

impl IndexGrid {
    pub fn identity(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            src: (0..rows * cols).collect(),
        }
    }

    fn at(&self, row: usize, col: usize) -> usize {
        self.src[row * self.cols + col]
    }

    fn remap(&self, rows: usize, cols: usize, f: impl Fn(usize, usize) -> usize) -> Self {
        let mut src = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                src.push(f(r, c));
            }
        }
        Self { rows, cols, src }
    }

    pub fn rotate(&self, rotation: Rotation) -> Self {
        let (rows, cols) = (self.rows, self.cols);
        match rotation {
            Rotation::R0 => self.clone(),
            Rotation::R90 => self.remap(cols, rows, |r, c| self.at(rows - 1 - c, r)),
            Rotation::R180 => self.remap(rows, cols, |r, c| self.at(rows - 1 - r, cols - 1 - c)),
            Rotation::R270 => self.remap(cols, rows, |r, c| self.at(c, cols - 1 - r)),
        }
    }

    pub fn flip_x(&self) -> Self {
        self.remap(self.rows, self.cols, |r, c| self.at(r, self.cols - 1 - c))
    }

    pub fn flip_y(&self) -> Self {
        self.remap(self.rows, self.cols, |r, c| self.at(self.rows - 1 - r, c))
    }

    /// Keeps the left or right half of every row.  An odd column goes to the
    /// right bank.
    pub fn bank(&self, bank: Bank) -> Self {
        let half = self.cols / 2;
        match bank {
            Bank::None => self.clone(),
            Bank::Left => self.remap(self.rows, half, |r, c| self.at(r, c)),
            Bank::Right => self.remap(self.rows, self.cols - half, |r, c| self.at(r, half + c)),
        }
    }
}

/// Runs `order` over an input of `rows` x `cols`.  Returns the index grid
/// and whether the output cells are inverted.
pub fn evaluate(
    order: TransformOrder,
    params: &TransformParams,
    rows: usize,
    cols: usize,
) -> (IndexGrid, bool) {
    let mut grid = IndexGrid::identity(rows, cols);
    let mut inverted = false;

    for step in order.steps() {
        match step {
            TransformStep::Rotate => grid = grid.rotate(params.rotation),
            TransformStep::FlipX if params.flip_x => grid = grid.flip_x(),
            TransformStep::FlipY if params.flip_y => grid = grid.flip_y(),
            TransformStep::Invert => inverted = params.invert,
            TransformStep::Bank => grid = grid.bank(params.bank),
            _ => {}
        }
    }

    (grid, inverted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    // 2x3 grid:
    // 0 1 2
    // 3 4 5
    fn grid() -> IndexGrid {
        IndexGrid::identity(2, 3)
    }

    #[test]
    fn test_rotate_90() {
        let g = grid().rotate(Rotation::R90);
        assert_eq!((g.rows, g.cols), (3, 2));
        assert_eq!(g.src, vec![3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn test_rotate_180() {
        let g = grid().rotate(Rotation::R180);
        assert_eq!((g.rows, g.cols), (2, 3));
        assert_eq!(g.src, vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_rotate_270() {
        let g = grid().rotate(Rotation::R270);
        assert_eq!((g.rows, g.cols), (3, 2));
        assert_eq!(g.src, vec![2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn test_rotation_composition() {
        for a in Rotation::iter() {
            for b in Rotation::iter() {
                let composed = grid().rotate(a).rotate(b);
                assert_eq!(composed, grid().rotate(a.then(b)), "{} then {}", a, b);
            }
        }
        assert_eq!(
            grid().rotate(Rotation::R90).rotate(Rotation::R270),
            grid()
        );
    }

    #[test]
    fn test_flips() {
        assert_eq!(grid().flip_x().src, vec![2, 1, 0, 5, 4, 3]);
        assert_eq!(grid().flip_y().src, vec![3, 4, 5, 0, 1, 2]);
        assert_eq!(grid().flip_x().flip_x(), grid());
        assert_eq!(grid().flip_y().flip_y(), grid());
        assert_eq!(grid().flip_x().flip_y(), grid().rotate(Rotation::R180));
    }

    #[test]
    fn test_bank() {
        let g = IndexGrid::identity(2, 4);
        let left = g.bank(Bank::Left);
        assert_eq!((left.rows, left.cols), (2, 2));
        assert_eq!(left.src, vec![0, 1, 4, 5]);
        let right = g.bank(Bank::Right);
        assert_eq!(right.src, vec![2, 3, 6, 7]);

        // Odd widths give the spare column to the right bank
        let right = grid().bank(Bank::Right);
        assert_eq!(right.cols, 2);
        assert_eq!(right.src, vec![1, 2, 4, 5]);
        assert_eq!(grid().bank(Bank::Left).cols, 1);
    }

    #[test]
    fn test_empty_grid() {
        let g = IndexGrid::identity(0, 0);
        for r in Rotation::iter() {
            assert!(g.rotate(r).src.is_empty());
        }
        assert!(g.flip_x().src.is_empty());
        assert!(g.bank(Bank::Right).src.is_empty());
    }

    #[test]
    fn test_order_selection() {
        assert_eq!(TransformOrder::select(false, true), TransformOrder::Standard);
        assert_eq!(TransformOrder::select(false, false), TransformOrder::Standard);
        assert_eq!(
            TransformOrder::select(true, true),
            TransformOrder::LegacyRotateFirst
        );
        assert_eq!(
            TransformOrder::select(true, false),
            TransformOrder::LegacyFlipFirst
        );
        for order in TransformOrder::iter() {
            assert_eq!(order.steps().len(), TransformStep::iter().count());
            assert_eq!(TransformOrder::from_str(&order.to_string()).unwrap(), order);
        }
    }

    #[test]
    fn test_legacy_flip_first_differs() {
        let params = TransformParams {
            rotation: Rotation::R90,
            flip_x: true,
            ..Default::default()
        };
        let (standard, _) = evaluate(TransformOrder::Standard, &params, 2, 3);
        let (legacy, _) = evaluate(TransformOrder::LegacyFlipFirst, &params, 2, 3);
        let (rotate_first, _) = evaluate(TransformOrder::LegacyRotateFirst, &params, 2, 3);

        // Rotate then mirror columns
        assert_eq!(standard.src, vec![0, 3, 1, 4, 2, 5]);
        // Mirror columns then rotate
        assert_eq!(legacy.src, vec![5, 2, 4, 1, 3, 0]);
        assert_eq!(rotate_first, standard);
    }

    #[test]
    fn test_rotate_first_matches_standard() {
        for degrees in [0, 90, 180, 270] {
            for i in 0..16 {
                let params = TransformParams {
                    rotation: Rotation::from_degrees(degrees).unwrap(),
                    flip_x: i & 1 != 0,
                    flip_y: i & 2 != 0,
                    invert: i & 4 != 0,
                    bank: if i & 8 != 0 { Bank::Right } else { Bank::None },
                };
                assert_eq!(
                    evaluate(TransformOrder::LegacyRotateFirst, &params, 3, 5),
                    evaluate(TransformOrder::Standard, &params, 3, 5),
                    "{:?}",
                    params
                );
            }
        }
    }

    #[test]
    fn test_invert_flag() {
        let params = TransformParams {
            invert: true,
            ..Default::default()
        };
        let (g, inverted) = evaluate(TransformOrder::Standard, &params, 2, 3);
        assert!(inverted);
        assert_eq!(g, grid());
    }

    #[test]
    fn test_rotation_serde() {
        let json = serde_json::to_string(&Rotation::R270).unwrap();
        assert_eq!(json, "270");
        let r: Rotation = serde_json::from_str("90").unwrap();
        assert_eq!(r, Rotation::R90);
        assert!(serde_json::from_str::<Rotation>("45").is_err());
        assert!(serde_json::from_str::<Bank>("3").is_err());
    }
}
