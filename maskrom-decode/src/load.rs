// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::Path;

use maskrom_common::{Rom, RomSettings};

use crate::args::RomArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    BitArt,
    Binary,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::BitArt => write!(f, "bit art"),
            FileType::Binary => write!(f, "raw binary"),
        }
    }
}

/// Works out how to read an input.  `.txt` files are bit art, anything with
/// a width is binary, and otherwise the content decides.
pub fn detect_file_type(path: &Path, data: &[u8], width: Option<usize>) -> FileType {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext == "txt" {
        return FileType::BitArt;
    }
    if width.is_some() {
        return FileType::Binary;
    }
    if data
        .iter()
        .all(|b| matches!(b, b'0' | b'1' | b' ' | b'\t' | b'\r' | b'\n'))
    {
        FileType::BitArt
    } else {
        FileType::Binary
    }
}

/// Loads the input file named in `args` without applying any settings.
pub fn load_rom<P: AsRef<Path>>(path: P, width: Option<usize>) -> Result<Rom> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let file_type = detect_file_type(path, &data, width);
    debug!("Loading {} as {}", path.display(), file_type);

    let rom = match file_type {
        FileType::BitArt => {
            let text = String::from_utf8(data)
                .with_context(|| format!("{} is not valid text", path.display()))?;
            Rom::from_bit_art(&text)
                .with_context(|| format!("Failed to parse bit art in {}", path.display()))?
        }
        FileType::Binary => {
            let Some(width) = width else {
                bail!(
                    "{} looks like a raw binary, use --width to give the row width in bits",
                    path.display()
                );
            };
            Rom::from_binary(&data, width)?
        }
    };

    info!(
        "Loaded {}x{} bits from {}",
        rom.input_rows(),
        rom.input_cols(),
        path.display()
    );
    Ok(rom)
}

/// The settings `args` asks for, from a settings file, a description, or the
/// individual options.
pub fn settings_from_args(args: &RomArgs) -> Result<RomSettings> {
    if let Some(path) = &args.settings {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        return RomSettings::from_json(&json)
            .with_context(|| format!("Invalid settings file {}", path.display()));
    }

    if let Some(description) = &args.description {
        let mut rom = Rom::new();
        rom.config_from_description(description)?;
        return Ok(rom.settings());
    }

    let settings = RomSettings {
        rotation: args.rotate,
        flip_x: args.flipx,
        flip_y: args.flipy,
        invert: args.invert,
        bank: args.bank,
        word_size: args.word_size,
        compat: args.compat,
        zero_first: args.zero_first,
        arch: args.arch.clone(),
        decoder: args.decoder.clone(),
    };
    settings.validate()?;
    Ok(settings)
}

/// Loads the input and applies every setting from `args`.
pub fn load_configured(args: &RomArgs) -> Result<Rom> {
    let settings = settings_from_args(args)?;
    let mut rom = load_rom(&args.input, args.width)?;
    rom.set_strict(args.strict);
    rom.apply_settings(&settings)
        .with_context(|| "Failed to apply settings")?;
    debug!("Configured as {}", rom.description());
    Ok(rom)
}
