// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! maskrom-decode
//!
//! Turns the bits marked up from a mask ROM die photograph into the bytes
//! they hold.
//!
//! It works by:
//! - Loading the marked bits, either as bit art (one text line per row of
//!   `0`s and `1`s) or as a raw binary dump with a given row width
//! - Rotating, mirroring, inverting and bank selecting them to the
//!   orientation the chip's decoder expects
//! - Running the decoder for the chip family, which knows how the address
//!   lines and word interleaving map bit positions to bytes
//! - Writing or printing the bytes, optionally via a disassembler

mod args;
mod load;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, warn};
use std::fs;
use std::process::ExitCode;

use maskrom_common::{ExternalDisassembler, Rom, RomError, registry};

use args::{Cli, Commands, RomArgs};
use load::load_configured;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(rom_err) = e.downcast_ref::<RomError>() {
                if rom_err.is_fatal() {
                    error!("Fatal: {}", rom_err);
                }
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Decode { rom, output } => decode(&rom, output),
        Commands::Export { rom, pretty } => {
            let rom = load_configured(&rom)?;
            print!("{}", rom.export_string(pretty));
            Ok(())
        }
        Commands::Describe { rom, save_settings } => describe(&rom, save_settings),
        Commands::Decoders => {
            println!("Available decoders:");
            for name in registry().names() {
                println!("  {}", name);
            }
            Ok(())
        }
        Commands::Probe { rom } => probe(&rom),
        Commands::Dis { rom, disassembler } => dis(&rom, &disassembler),
    }
}

/// Loads, configures and decodes, failing if no decoder was chosen.
fn decode_rom(args: &RomArgs) -> Result<Rom> {
    let mut rom = load_configured(args)?;
    if rom.decoder_name().is_none() {
        anyhow::bail!("No decoder selected, use --decoder (see the decoders subcommand)");
    }
    rom.decode()?;
    Ok(rom)
}

fn decode(args: &RomArgs, output: Option<std::path::PathBuf>) -> Result<()> {
    let rom = decode_rom(args)?;
    let bytes = rom.decoded().unwrap_or_default();

    if bytes.is_empty() {
        println!(
            "Decoder {} does not apply to a {}x{} matrix with these settings",
            rom.decoder_name().unwrap_or("<none>"),
            rom.output_rows(),
            rom.output_cols()
        );
        return Ok(());
    }

    match output {
        Some(path) => {
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("- Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => print_hex_dump(bytes),
    }

    let sanity = if rom.check_sanity() { "passed" } else { "FAILED" };
    println!("- Sanity check: {}", sanity);
    Ok(())
}

fn print_hex_dump(bytes: &[u8]) {
    for (ii, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:06x}: {}", ii * 16, hex.join(" "));
    }
}

fn describe(args: &RomArgs, save_settings: Option<std::path::PathBuf>) -> Result<()> {
    let mut rom = load_configured(args)?;
    if rom.decoder_name().is_some() {
        rom.decode()?;
    }

    println!("Input:       {}x{}", rom.input_rows(), rom.input_cols());
    println!("Output:      {}x{}", rom.output_rows(), rom.output_cols());
    println!("Order:       {}", rom.transform_order());
    println!("Description: {}", rom.description());
    println!("Filename:    {}", rom.descriptive_filename());
    if let Some(bytes) = rom.decoded() {
        println!("Bytes:       {}", bytes.len());
        println!("Preview:     {}", rom.preview());
        println!("Sanity:      {}", rom.check_sanity());
    }

    if let Some(path) = save_settings {
        fs::write(&path, rom.settings().to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("- Saved settings to {}", path.display());
    }
    Ok(())
}

fn probe(args: &RomArgs) -> Result<()> {
    let mut rom = load_configured(args)?;
    let mut found = 0;

    for decoder in registry().iter() {
        rom.set_decoder(Some(decoder.clone()));
        for (degrees, flip_x, flip_y) in orientations() {
            rom.set_angle(degrees)?;
            rom.set_flip_x(flip_x);
            rom.set_flip_y(flip_y);
            if let Err(e) = rom.decode() {
                warn!("{} failed at {}: {}", decoder.name(), rom.description(), e);
                continue;
            }
            if rom.check_sanity() {
                println!("{}  [{}]", rom.description(), rom.preview());
                found += 1;
            }
        }
    }

    if found == 0 {
        println!("No decoder and orientation passed the sanity check");
    } else {
        println!("- {} candidate(s)", found);
    }
    Ok(())
}

/// Every rotation, with and without each flip.
fn orientations() -> impl Iterator<Item = (u32, bool, bool)> {
    [0, 90, 180, 270].into_iter().flat_map(|degrees| {
        [(false, false), (true, false), (false, true), (true, true)]
            .into_iter()
            .map(move |(x, y)| (degrees, x, y))
    })
}

fn dis(args: &RomArgs, program: &str) -> Result<()> {
    let rom = decode_rom(args)?;
    if rom.arch().is_none() {
        anyhow::bail!("No architecture selected, use --arch");
    }
    let listing = rom
        .disassemble(&ExternalDisassembler::new(program))
        .with_context(|| format!("Failed to disassemble with {}", program))?;
    print!("{}", listing);
    Ok(())
}
