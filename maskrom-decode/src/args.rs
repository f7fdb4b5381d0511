// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use maskrom_common::{Bank, Rotation, registry};

#[derive(Parser)]
#[command(name = "maskrom-decode")]
#[command(about = "Transforms and decodes bits marked from mask ROM die photographs")]
#[command(version)]
#[command(after_help = "Use 'help <subcommand>' for detailed options (e.g., 'help decode')")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log more (-v info, -vv debug, -vvv trace).  RUST_LOG overrides this
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decodes the bits with the selected decoder.
    ///
    /// Bytes are written to --output as binary, or printed as a hex dump if
    /// no output file is given.  A sanity check of the decode is reported
    /// either way.
    Decode {
        #[command(flatten)]
        rom: RomArgs,
        /// File to write the decoded bytes to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints the transformed bits as bit art
    Export {
        #[command(flatten)]
        rom: RomArgs,
        /// Group columns in eights
        #[arg(long)]
        pretty: bool,
    },
    /// Prints the description of the settings, a matching file name and,
    /// if a decoder is selected, a preview of the decoded bytes
    Describe {
        #[command(flatten)]
        rom: RomArgs,
        /// Also save the settings as JSON to this file
        #[arg(long)]
        save_settings: Option<PathBuf>,
    },
    /// Lists the available decoders
    Decoders,
    /// Tries every decoder in every orientation (4 rotations, with and
    /// without each flip) and lists the combinations that pass the sanity
    /// check.
    ///
    /// Inversion, bank and word size are taken from the options and left
    /// alone.
    Probe {
        #[command(flatten)]
        rom: RomArgs,
    },
    /// Decodes the bits and disassembles the result with an external
    /// disassembler.  Requires --arch (or an arch in the description or
    /// settings).
    Dis {
        #[command(flatten)]
        rom: RomArgs,
        /// Disassembler to run, as `<program> <file> -arch <arch>`
        #[arg(long, default_value = "unidasm")]
        disassembler: String,
    },
}

/// Input file and transform settings, shared by every subcommand that loads
/// bits.
#[derive(clap::Args, Debug, Clone)]
pub struct RomArgs {
    /// Bits to load (.txt bit art, or a raw binary with --width)
    pub input: PathBuf,

    /// Row width in bits, for raw binary input
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Clockwise rotation (0, 90, 180 or 270)
    #[arg(short, long, default_value = "0", value_parser = parse_rotation)]
    pub rotate: Rotation,

    /// Mirror horizontally
    #[arg(long)]
    pub flipx: bool,

    /// Mirror vertically
    #[arg(long)]
    pub flipy: bool,

    /// Invert every bit
    #[arg(short, long)]
    pub invert: bool,

    /// Bank to decode (0 whole row, 1 left half, 2 right half)
    #[arg(short, long, default_value = "0", value_parser = parse_bank)]
    pub bank: Bank,

    /// Bits per word
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..=64))]
    pub word_size: u32,

    /// Use the legacy transform order
    #[arg(long)]
    pub compat: bool,

    /// In legacy order, rotate before flipping
    #[arg(long, requires = "compat")]
    pub zero_first: bool,

    /// Treat out of range bit fetches as fatal
    #[arg(long)]
    pub strict: bool,

    /// Architecture name for the disassembler
    #[arg(short, long)]
    pub arch: Option<String>,

    /// Decoder to use (see the decoders subcommand)
    #[arg(short, long, value_parser = parse_decoder)]
    pub decoder: Option<String>,

    /// Settings as a description string, replacing the options above
    #[arg(
        long,
        conflicts_with_all = ["rotate", "flipx", "flipy", "invert", "bank", "word_size", "compat", "zero_first", "arch", "decoder"]
    )]
    pub description: Option<String>,

    /// Settings from a JSON file, replacing the options above
    #[arg(
        long,
        conflicts_with_all = ["description", "rotate", "flipx", "flipy", "invert", "bank", "word_size", "compat", "zero_first", "arch", "decoder"]
    )]
    pub settings: Option<PathBuf>,
}

fn parse_rotation(s: &str) -> Result<Rotation, String> {
    s.parse::<u32>()
        .ok()
        .and_then(Rotation::from_degrees)
        .ok_or_else(|| format!("Invalid rotation: {}. Valid values are: 0, 90, 180, 270", s))
}

fn parse_bank(s: &str) -> Result<Bank, String> {
    s.parse::<u32>()
        .ok()
        .and_then(Bank::from_index)
        .ok_or_else(|| format!("Invalid bank: {}. Valid values are: 0, 1 (left), 2 (right)", s))
}

fn parse_decoder(s: &str) -> Result<String, String> {
    if registry().get(s).is_some() {
        Ok(s.to_string())
    } else {
        Err(format!(
            "Unknown decoder: {}. Valid values are: {}",
            s,
            registry().names().join(", ")
        ))
    }
}
