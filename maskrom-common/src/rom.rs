// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! The transform engine.
//!
//! A [`Rom`] holds the physically ordered input bits and the output matrix
//! produced from them by the current transform settings.  Every setter
//! re-evaluates the output from scratch, so the output always reflects the
//! settings and the input is never changed by a transform.
//!
//! Output cells are copies of input cells.  [`Rom::output_origin`] maps an
//! output position back to the input position it was copied from, which is
//! how a decoder's annotations can be shown against the physical bits.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};

use crate::art;
use crate::bit::BitCell;
use crate::decoder::{DecodeTarget, Decoder, DecoderRegistry, registry};
use crate::description;
use crate::disasm::Disassembler;
use crate::error::RomError;
use crate::matrix::BitMatrix;
use crate::settings::{DEFAULT_WORD_SIZE, RomSettings, validate_arch, validate_word_size};
use crate::transform::{self, Bank, Rotation, TransformOrder, TransformParams};

// Number of bytes shown by preview()
const PREVIEW_BYTES: usize = 8;

pub struct Rom {
    input: BitMatrix,
    output: BitMatrix,
    // Input buffer index of each output cell
    origin: Vec<usize>,

    params: TransformParams,
    compat: bool,
    zero_first: bool,
    strict: bool,
    word_size: u32,
    arch: Option<String>,
    decoder: Option<Arc<dyn Decoder>>,

    // None until decode() succeeds with a decoder, and again after any change
    decoded: Option<Vec<u8>>,
}

impl Default for Rom {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Rom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rom")
            .field("input", &(self.input.rows(), self.input.cols()))
            .field("output", &(self.output.rows(), self.output.cols()))
            .field("description", &self.description())
            .field("strict", &self.strict)
            .finish()
    }
}

impl Rom {
    /// An empty ROM, to be loaded later.
    pub fn new() -> Self {
        Self {
            input: BitMatrix::default(),
            output: BitMatrix::default(),
            origin: Vec::new(),
            params: TransformParams::default(),
            compat: false,
            zero_first: false,
            strict: false,
            word_size: DEFAULT_WORD_SIZE,
            arch: None,
            decoder: None,
            decoded: None,
        }
    }

    /// A ROM loaded from bit art.
    pub fn from_bit_art(text: &str) -> Result<Self, RomError> {
        let mut rom = Self::new();
        rom.load_from_string(text)?;
        Ok(rom)
    }

    /// A ROM loaded from a raw dump, `width` bits per row.
    pub fn from_binary(bytes: &[u8], width: usize) -> Result<Self, RomError> {
        let mut rom = Self::new();
        rom.load_binary(bytes, width)?;
        Ok(rom)
    }

    /// Replaces the input with bit art.  Transform settings are kept.
    pub fn load_from_string(&mut self, text: &str) -> Result<(), RomError> {
        let matrix = art::parse(text)?;
        self.load_matrix(matrix);
        Ok(())
    }

    /// Replaces the input with a raw dump, expanded MSB first into rows of
    /// `width` bits.  Bits left over after the last full row are dropped.
    pub fn load_binary(&mut self, bytes: &[u8], width: usize) -> Result<(), RomError> {
        if width == 0 {
            return Err(RomError::invalid("width", width));
        }

        let total = bytes.len() * 8;
        let rows = total / width;
        if total % width != 0 {
            warn!(
                "{} bits don't fill rows of {}, dropping the last {}",
                total,
                width,
                total % width
            );
        }

        let cells = (0..rows * width)
            .map(|i| BitCell::new((bytes[i / 8] >> (7 - i % 8)) & 1 == 1))
            .collect();
        let matrix = BitMatrix::from_cells(rows, width, cells)
            .ok_or_else(|| RomError::invalid("width", width))?;
        self.load_matrix(matrix);
        Ok(())
    }

    /// Replaces the input matrix.
    pub fn load_matrix(&mut self, matrix: BitMatrix) {
        debug!("Loaded {}x{} input", matrix.rows(), matrix.cols());
        self.input = matrix;
        self.eval();
    }

    pub fn input(&self) -> &BitMatrix {
        &self.input
    }

    pub fn output(&self) -> &BitMatrix {
        &self.output
    }

    pub fn input_rows(&self) -> usize {
        self.input.rows()
    }

    pub fn input_cols(&self) -> usize {
        self.input.cols()
    }

    pub fn output_rows(&self) -> usize {
        self.output.rows()
    }

    pub fn output_cols(&self) -> usize {
        self.output.cols()
    }

    fn range_error(&self, matrix: &BitMatrix, row: usize, col: usize) -> Result<(), RomError> {
        if self.strict && matrix.index(row, col).is_none() {
            return Err(RomError::OutOfRange {
                row,
                col,
                rows: matrix.rows(),
                cols: matrix.cols(),
            });
        }
        Ok(())
    }

    /// Fetches an input bit.  Out of range is `Ok(None)`, or an error in
    /// strict mode.
    pub fn input_bit(&self, row: usize, col: usize) -> Result<Option<&BitCell>, RomError> {
        self.range_error(&self.input, row, col)?;
        Ok(self.input.get(row, col))
    }

    /// Mutable access to an input bit, for editing the marked bits.  Call
    /// [`Rom::eval`] once the edits are done.
    pub fn input_bit_mut(
        &mut self,
        row: usize,
        col: usize,
    ) -> Result<Option<&mut BitCell>, RomError> {
        self.range_error(&self.input, row, col)?;
        self.decoded = None;
        Ok(self.input.get_mut(row, col))
    }

    /// Fetches an output bit.  Out of range is `Ok(None)`, or an error in
    /// strict mode.
    pub fn output_bit(&self, row: usize, col: usize) -> Result<Option<&BitCell>, RomError> {
        self.range_error(&self.output, row, col)?;
        Ok(self.output.get(row, col))
    }

    pub fn output_bit_mut(
        &mut self,
        row: usize,
        col: usize,
    ) -> Result<Option<&mut BitCell>, RomError> {
        self.range_error(&self.output, row, col)?;
        Ok(self.output.get_mut(row, col))
    }

    /// Input position an output cell was copied from.
    pub fn output_origin(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let index = self.output.index(row, col)?;
        let src = *self.origin.get(index)?;
        let cols = self.input.cols();
        Some((src / cols, src % cols))
    }

    /// Clears every transform and copies the input to the output unchanged.
    pub fn reset(&mut self) {
        self.params = TransformParams::default();
        self.eval();
    }

    /// Rotates a further `degrees` clockwise.  `zero_first` asks for the
    /// rotation to happen before the flips when in compatibility mode.
    pub fn rotate(&mut self, degrees: u32, zero_first: bool) -> Result<(), RomError> {
        let rotation = Rotation::try_from_degrees(degrees)?;
        self.params.rotation = self.params.rotation.then(rotation);
        self.zero_first = zero_first;
        self.eval();
        Ok(())
    }

    /// Sets the rotation outright.
    pub fn set_angle(&mut self, degrees: u32) -> Result<(), RomError> {
        self.params.rotation = Rotation::try_from_degrees(degrees)?;
        self.eval();
        Ok(())
    }

    /// Mirrors left to right again if `flip` is set, so two calls undo each
    /// other.  `false` leaves the mirroring alone.
    pub fn flip_x(&mut self, flip: bool) {
        self.set_flip_x(self.params.flip_x ^ flip);
    }

    /// Mirrors top to bottom again if `flip` is set.
    pub fn flip_y(&mut self, flip: bool) {
        self.set_flip_y(self.params.flip_y ^ flip);
    }

    /// Toggles inversion if `invert` is set.  Raw values are never touched.
    pub fn invert(&mut self, invert: bool) {
        self.set_invert(self.params.invert ^ invert);
    }

    pub fn set_flip_x(&mut self, flipped: bool) {
        self.params.flip_x = flipped;
        self.eval();
    }

    pub fn set_flip_y(&mut self, flipped: bool) {
        self.params.flip_y = flipped;
        self.eval();
    }

    pub fn set_invert(&mut self, inverted: bool) {
        self.params.invert = inverted;
        self.eval();
    }

    /// 0 for the whole row, 1 for the left half, 2 for the right half.
    pub fn set_bank(&mut self, bank: u32) -> Result<(), RomError> {
        self.params.bank = Bank::from_index(bank).ok_or_else(|| RomError::invalid("bank", bank))?;
        self.eval();
        Ok(())
    }

    pub fn set_word_size(&mut self, word_size: u32) -> Result<(), RomError> {
        validate_word_size(word_size)?;
        self.word_size = word_size;
        self.eval();
        Ok(())
    }

    /// Turns on the legacy transform order.
    pub fn set_compat(&mut self, compat: bool) {
        self.compat = compat;
        self.eval();
    }

    pub fn set_zero_first(&mut self, zero_first: bool) {
        self.zero_first = zero_first;
        self.eval();
    }

    /// In strict mode out of range fetches are errors rather than `None`.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Architecture name handed to the disassembler.  An empty name clears
    /// it.
    pub fn set_arch(&mut self, arch: &str) -> Result<(), RomError> {
        if arch.is_empty() {
            self.arch = None;
        } else {
            validate_arch(arch)?;
            self.arch = Some(arch.to_string());
        }
        Ok(())
    }

    pub fn rotation(&self) -> Rotation {
        self.params.rotation
    }

    pub fn flipped_x(&self) -> bool {
        self.params.flip_x
    }

    pub fn flipped_y(&self) -> bool {
        self.params.flip_y
    }

    pub fn inverted(&self) -> bool {
        self.params.invert
    }

    pub fn bank(&self) -> Bank {
        self.params.bank
    }

    pub fn word_size(&self) -> u32 {
        self.word_size
    }

    pub fn compat(&self) -> bool {
        self.compat
    }

    pub fn zero_first(&self) -> bool {
        self.zero_first
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    pub fn transform_order(&self) -> TransformOrder {
        TransformOrder::select(self.compat, self.zero_first)
    }

    /// Rebuilds the output matrix from the input.
    pub fn eval(&mut self) {
        let order = self.transform_order();
        let (grid, inverted) =
            transform::evaluate(order, &self.params, self.input.rows(), self.input.cols());

        let cells = grid
            .src
            .iter()
            .map(|&i| {
                let mut cell = self.input.cells()[i].clone();
                cell.inverted = inverted;
                cell.clear_assignment();
                cell
            })
            .collect();

        // The grid length always matches its dimensions
        self.output = BitMatrix::from_cells(grid.rows, grid.cols, cells).unwrap_or_default();
        self.origin = grid.src;
        self.decoded = None;

        debug!(
            "Evaluated {}x{} -> {}x{} ({}, {})",
            self.input.rows(),
            self.input.cols(),
            self.output.rows(),
            self.output.cols(),
            order,
            self.description()
        );
    }

    /// Selects a decoder from the built in registry.  Returns false, leaving
    /// no decoder selected, if the name isn't known.
    pub fn set_decoder_by_name(&mut self, name: &str) -> bool {
        self.set_decoder_from(registry(), name)
    }

    /// Selects a decoder from a caller supplied registry.
    pub fn set_decoder_from(&mut self, registry: &DecoderRegistry, name: &str) -> bool {
        self.decoder = registry.get(name);
        self.decoded = None;
        if self.decoder.is_none() {
            warn!("No decoder named '{}'", name);
        }
        self.decoder.is_some()
    }

    pub fn set_decoder(&mut self, decoder: Option<Arc<dyn Decoder>>) {
        self.decoder = decoder;
        self.decoded = None;
    }

    pub fn decoder_name(&self) -> Option<&'static str> {
        self.decoder.as_ref().map(|d| d.name())
    }

    /// Runs the selected decoder over the output matrix.
    ///
    /// With no decoder this returns no bytes.  An empty result otherwise
    /// means the decoder doesn't apply to this matrix.  Any annotations from
    /// a previous decode are cleared first.
    pub fn decode(&mut self) -> Result<Vec<u8>, RomError> {
        self.decoded = None;
        for cell in self.output.cells_mut() {
            cell.clear_assignment();
        }

        let Some(decoder) = self.decoder.clone() else {
            return Ok(Vec::new());
        };

        let mut target = DecodeTarget::new(&mut self.output, self.word_size, self.strict);
        let bytes = decoder.decode(&mut target)?;
        debug!("{} produced {} bytes", decoder.name(), bytes.len());

        self.decoded = Some(bytes.clone());
        Ok(bytes)
    }

    /// Bytes from the last decode, if nothing has changed since.
    pub fn decoded(&self) -> Option<&[u8]> {
        self.decoded.as_deref()
    }

    /// Checks the last decode looks plausible: it produced bytes, and every
    /// bit the decoder tagged points at one of them with a distinct one bit
    /// mask.
    pub fn check_sanity(&self) -> bool {
        let Some(bytes) = self.decoded.as_deref() else {
            return false;
        };
        if bytes.is_empty() {
            return false;
        }

        let mut seen = HashSet::new();
        for cell in self.output.cells().iter().filter(|c| c.is_assigned()) {
            if cell.address as usize >= bytes.len() || cell.mask.count_ones() != 1 {
                return false;
            }
            if !seen.insert((cell.address, cell.mask)) {
                return false;
            }
        }
        true
    }

    /// The first few decoded bytes as hex, or an empty string.
    pub fn preview(&self) -> String {
        self.decoded
            .as_deref()
            .unwrap_or_default()
            .iter()
            .take(PREVIEW_BYTES)
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Output matrix as bit art.
    pub fn export_string(&self, pretty: bool) -> String {
        art::render(&self.output, pretty)
    }

    pub fn settings(&self) -> RomSettings {
        RomSettings {
            rotation: self.params.rotation,
            flip_x: self.params.flip_x,
            flip_y: self.params.flip_y,
            invert: self.params.invert,
            bank: self.params.bank,
            word_size: self.word_size,
            compat: self.compat,
            zero_first: self.zero_first,
            arch: self.arch.clone(),
            decoder: self.decoder_name().map(str::to_string),
        }
    }

    /// Replaces every setting at once.  Nothing changes if the settings are
    /// invalid or name an unknown decoder.
    ///
    /// Decoder names resolve to the decoder already selected, then to the
    /// built in registry.
    pub fn apply_settings(&mut self, settings: &RomSettings) -> Result<(), RomError> {
        self.apply_settings_with(registry(), settings)
    }

    /// As [`Rom::apply_settings`], looking decoders up in `registry`.
    pub fn apply_settings_with(
        &mut self,
        registry: &DecoderRegistry,
        settings: &RomSettings,
    ) -> Result<(), RomError> {
        settings.validate()?;
        let decoder = match &settings.decoder {
            Some(name) => Some(
                self.lookup_decoder(registry, name)
                    .ok_or_else(|| RomError::invalid("decoder", name))?,
            ),
            None => None,
        };

        self.params = TransformParams {
            rotation: settings.rotation,
            flip_x: settings.flip_x,
            flip_y: settings.flip_y,
            invert: settings.invert,
            bank: settings.bank,
        };
        self.word_size = settings.word_size;
        self.compat = settings.compat;
        self.zero_first = settings.zero_first;
        self.arch = settings.arch.clone();
        self.decoder = decoder;
        self.eval();
        Ok(())
    }

    fn lookup_decoder(&self, registry: &DecoderRegistry, name: &str) -> Option<Arc<dyn Decoder>> {
        match &self.decoder {
            Some(current) if current.name() == name => Some(current.clone()),
            _ => registry.get(name),
        }
    }

    /// One line summary of every setting, see [`crate::description`].
    pub fn description(&self) -> String {
        description::format(&self.settings())
    }

    /// Restores the settings from [`Rom::description`] output.  Works for
    /// any decoder currently selected, wherever it came from.
    pub fn config_from_description(&mut self, text: &str) -> Result<(), RomError> {
        self.config_from_description_with(registry(), text)
    }

    /// As [`Rom::config_from_description`], looking decoders up in
    /// `registry`.
    pub fn config_from_description_with(
        &mut self,
        registry: &DecoderRegistry,
        text: &str,
    ) -> Result<(), RomError> {
        let settings =
            description::parse_with(text, |name| self.lookup_decoder(registry, name).is_some())?;
        self.apply_settings_with(registry, &settings)
    }

    pub fn descriptive_filename(&self) -> String {
        description::filename(&self.settings())
    }

    /// Disassembles the last decode with the configured architecture.
    pub fn disassemble(&self, disassembler: &dyn Disassembler) -> Result<String, RomError> {
        let bytes = self.decoded.as_deref().ok_or(RomError::NotDecoded)?;
        let arch = self
            .arch
            .as_deref()
            .ok_or_else(|| RomError::invalid("architecture", "<none>"))?;
        disassembler.disassemble(arch, bytes)
    }
}
