// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Decoders turn a transformed bit matrix into bytes.
//!
//! Each chip family gets its own [`Decoder`], keyed by a short unique name.
//! Decoders are selected by name from a [`DecoderRegistry`].  The built in
//! decoders live in the process-wide registry returned by [`registry()`];
//! front ends wanting extra families build their own registry.
//!
//! A decoder reports "not applicable" by returning an empty byte vector.
//! Errors are reserved for fetch failures, see [`DecodeTarget::bit_mut`].

pub mod msp430;
pub mod tlcs47font;

use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;

use crate::bit::BitCell;
use crate::error::RomError;
use crate::matrix::BitMatrix;

pub use msp430::Msp430Decoder;
pub use tlcs47font::Tlcs47FontDecoder;

pub trait Decoder: Send + Sync {
    /// Unique, case-sensitive name used for selection.
    fn name(&self) -> &'static str;

    /// Decodes the output matrix.  Every visited cell should be tagged with
    /// [`BitCell::assign`].
    fn decode(&self, target: &mut DecodeTarget<'_>) -> Result<Vec<u8>, RomError>;
}

/// The part of the engine a decoder gets to see: the output matrix, and the
/// settings that change how bits may be fetched or grouped.
pub struct DecodeTarget<'a> {
    matrix: &'a mut BitMatrix,
    word_size: u32,
    strict: bool,
}

impl<'a> DecodeTarget<'a> {
    pub fn new(matrix: &'a mut BitMatrix, word_size: u32, strict: bool) -> Self {
        Self {
            matrix,
            word_size,
            strict,
        }
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    pub fn word_size(&self) -> u32 {
        self.word_size
    }

    /// Fetches an output bit for reading and tagging.
    ///
    /// Out of range positions are `Ok(None)` normally, and
    /// [`RomError::OutOfRange`] in strict mode.
    pub fn bit_mut(&mut self, row: usize, col: usize) -> Result<Option<&mut BitCell>, RomError> {
        let (rows, cols, strict) = (self.matrix.rows(), self.matrix.cols(), self.strict);
        match self.matrix.get_mut(row, col) {
            Some(bit) => Ok(Some(bit)),
            None if strict => Err(RomError::OutOfRange {
                row,
                col,
                rows,
                cols,
            }),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every decoder this crate ships.
    pub fn with_builtin() -> Self {
        let decoders: Vec<Arc<dyn Decoder>> =
            vec![Arc::new(Msp430Decoder), Arc::new(Tlcs47FontDecoder)];
        Self { decoders }
    }

    pub fn register<D: Decoder + 'static>(&mut self, decoder: D) -> Result<(), RomError> {
        if self.get(decoder.name()).is_some() {
            return Err(RomError::DuplicateDecoder(decoder.name().to_string()));
        }
        debug!("Registered decoder {}", decoder.name());
        self.decoders.push(Arc::new(decoder));
        Ok(())
    }

    /// Exact match lookup.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Decoder>> {
        self.decoders.iter().find(|d| d.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Decoder>> {
        self.decoders.iter()
    }
}

static REGISTRY: Lazy<DecoderRegistry> = Lazy::new(DecoderRegistry::with_builtin);

/// The process-wide registry of built in decoders.
pub fn registry() -> &'static DecoderRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Decoder for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn decode(&self, _target: &mut DecodeTarget<'_>) -> Result<Vec<u8>, RomError> {
            Ok(vec![0xAA])
        }
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(registry().names(), vec!["msp430", "tlcs47font"]);
        assert!(registry().get("msp430").is_some());
        assert!(registry().get("MSP430").is_none());
        assert!(registry().get("msp").is_none());
    }

    #[test]
    fn test_register() {
        let mut reg = DecoderRegistry::new();
        assert!(reg.get("fixed").is_none());
        reg.register(Fixed).unwrap();
        assert_eq!(reg.names(), vec!["fixed"]);
        assert_eq!(
            reg.register(Fixed),
            Err(RomError::DuplicateDecoder("fixed".to_string()))
        );

        let mut reg = DecoderRegistry::with_builtin();
        assert!(reg.register(Msp430Decoder).is_err());
        reg.register(Fixed).unwrap();
        assert_eq!(reg.iter().count(), 3);
    }

    #[test]
    fn test_target_fetch_policies() {
        let mut m = BitMatrix::new(2, 2);
        let mut target = DecodeTarget::new(&mut m, 8, false);
        assert!(target.bit_mut(1, 1).unwrap().is_some());
        assert!(target.bit_mut(2, 0).unwrap().is_none());

        let mut target = DecodeTarget::new(&mut m, 8, true);
        let err = target.bit_mut(0, 2).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            err,
            RomError::OutOfRange {
                row: 0,
                col: 2,
                rows: 2,
                cols: 2
            }
        );
    }
}
