// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! maskrom-common
//!
//! Recovers logically ordered bytes from the physically ordered bit arrays
//! marked up from mask ROM die photographs.
//!
//! The work is split into two halves:
//! - [`Rom`] holds the bits exactly as they were marked (the input matrix)
//!   and applies rotation, mirroring, inversion and bank selection to
//!   produce the output matrix.
//! - A [`Decoder`], chosen by name from the [`DecoderRegistry`], walks the
//!   output matrix and turns it into bytes, tagging every bit it visits with
//!   the address and bit mask it ended up in.
//!
//! Typically used like this:
//!
//! ```rust ignore
//! use maskrom_common::Rom;
//! let mut rom = Rom::from_bit_art(&std::fs::read_to_string("rom.txt")?)?;
//! rom.rotate(90, false)?;
//! rom.flip_x(true);
//! rom.set_decoder_by_name("msp430");
//! let bytes = rom.decode()?;
//! ```

pub mod art;
pub mod bit;
pub mod decoder;
pub mod description;
pub mod disasm;
pub mod error;
pub mod matrix;
pub mod rom;
pub mod settings;
pub mod transform;

pub use bit::{BitCell, CellHandle, UNASSIGNED};
pub use decoder::{DecodeTarget, Decoder, DecoderRegistry, registry};
pub use disasm::{Disassembler, ExternalDisassembler};
pub use error::RomError;
pub use matrix::BitMatrix;
pub use rom::Rom;
pub use settings::RomSettings;
pub use transform::{Bank, Rotation, TransformOrder, TransformStep};
