// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Hands decoded bytes to an external disassembler.
//!
//! The architecture name is passed through untouched.  What names are valid
//! is up to the disassembler.

use std::io::Write;
use std::process::Command;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::RomError;

pub trait Disassembler {
    fn disassemble(&self, arch: &str, bytes: &[u8]) -> Result<String, RomError>;
}

/// Runs a disassembler program as `<program> <file> -arch <arch> [args...]`,
/// the command line MAME's `unidasm` takes, and returns its stdout.
#[derive(Debug, Clone)]
pub struct ExternalDisassembler {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ExternalDisassembler {
    fn default() -> Self {
        Self::new("unidasm")
    }
}

impl ExternalDisassembler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Disassembler for ExternalDisassembler {
    fn disassemble(&self, arch: &str, bytes: &[u8]) -> Result<String, RomError> {
        let mut file = NamedTempFile::new()
            .map_err(|e| RomError::Disassembler(format!("Failed to create temp file: {}", e)))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| RomError::Disassembler(format!("Failed to write temp file: {}", e)))?;

        debug!(
            "Running {} on {} bytes as {}",
            self.program,
            bytes.len(),
            arch
        );
        let output = Command::new(&self.program)
            .arg(file.path())
            .arg("-arch")
            .arg(arch)
            .args(&self.args)
            .output()
            .map_err(|e| RomError::Disassembler(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(RomError::Disassembler(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program() {
        let dis = ExternalDisassembler::new("maskrom-no-such-disassembler");
        let err = dis.disassemble("z80", &[0x00]).unwrap_err();
        assert!(matches!(err, RomError::Disassembler(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_program() {
        // `echo` stands in for a disassembler and repeats its arguments
        let dis = ExternalDisassembler::new("echo").with_args(["done"]);
        let out = dis.disassemble("tlcs47", &[1, 2, 3]).unwrap();
        assert!(out.contains("-arch tlcs47 done"), "{}", out);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program() {
        let dis = ExternalDisassembler::new("false");
        assert!(matches!(
            dis.disassemble("z80", &[]),
            Err(RomError::Disassembler(_))
        ));
    }
}
