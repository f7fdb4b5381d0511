// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! The one line description of a ROM's settings, and its parser.
//!
//! Format is a comma separated list of `key=value` pairs and bare flags, for
//! example:
//!
//! ```text
//! rotate=90,flipx,invert,bank=1,wordsize=8,arch=tlcs47,decoder=tlcs47font
//! ```
//!
//! `rotate` and `wordsize` are always written.  Flags, `bank`, `arch` and
//! `decoder` are only written when set.  The generator always writes keys in
//! the order above.

use std::collections::HashSet;

use crate::decoder::DecoderRegistry;
use crate::error::RomError;
use crate::settings::{RomSettings, validate_arch, validate_word_size};
use crate::transform::{Bank, Rotation};

pub fn format(settings: &RomSettings) -> String {
    let mut parts = vec![format!("rotate={}", settings.rotation.degrees())];
    if settings.flip_x {
        parts.push("flipx".to_string());
    }
    if settings.flip_y {
        parts.push("flipy".to_string());
    }
    if settings.invert {
        parts.push("invert".to_string());
    }
    if settings.bank != Bank::None {
        parts.push(format!("bank={}", settings.bank.index()));
    }
    parts.push(format!("wordsize={}", settings.word_size));
    if settings.compat {
        parts.push("compat".to_string());
    }
    if settings.zero_first {
        parts.push("zerofirst".to_string());
    }
    if let Some(arch) = &settings.arch {
        parts.push(format!("arch={}", arch));
    }
    if let Some(decoder) = &settings.decoder {
        parts.push(format!("decoder={}", decoder));
    }
    parts.join(",")
}

/// Parses a description.  Keys not given take their default values.
/// Decoder names are checked against `registry`.
pub fn parse(description: &str, registry: &DecoderRegistry) -> Result<RomSettings, RomError> {
    parse_with(description, |name| registry.get(name).is_some())
}

/// As [`parse`], with `is_known` deciding which decoder names are valid.
pub fn parse_with<F>(description: &str, is_known: F) -> Result<RomSettings, RomError>
where
    F: Fn(&str) -> bool,
{
    let malformed = |reason: String| RomError::MalformedDescription {
        description: description.to_string(),
        reason,
    };

    let mut settings = RomSettings::default();
    let mut seen = HashSet::new();

    if description.trim().is_empty() {
        return Ok(settings);
    }

    for pair in description.split(',') {
        let parts: Vec<&str> = pair.trim().splitn(2, '=').collect();
        let key = parts[0];
        let value = parts.get(1).copied();

        if key.is_empty() {
            return Err(malformed("empty entry".to_string()));
        }
        if !seen.insert(key) {
            return Err(malformed(format!("{} specified multiple times", key)));
        }

        match (key, value) {
            ("rotate", Some(v)) => {
                settings.rotation = v
                    .parse()
                    .ok()
                    .and_then(Rotation::from_degrees)
                    .ok_or_else(|| malformed(format!("invalid rotation: {}", v)))?;
            }
            ("bank", Some(v)) => {
                settings.bank = v
                    .parse()
                    .ok()
                    .and_then(Bank::from_index)
                    .ok_or_else(|| malformed(format!("invalid bank: {}", v)))?;
            }
            ("wordsize", Some(v)) => {
                let word_size = v
                    .parse()
                    .map_err(|_| malformed(format!("invalid word size: {}", v)))?;
                validate_word_size(word_size)
                    .map_err(|_| malformed(format!("invalid word size: {}", v)))?;
                settings.word_size = word_size;
            }
            ("arch", Some(v)) => {
                validate_arch(v).map_err(|_| malformed(format!("invalid architecture: {}", v)))?;
                settings.arch = Some(v.to_string());
            }
            ("decoder", Some(v)) => {
                if !is_known(v) {
                    return Err(malformed(format!("unknown decoder: {}", v)));
                }
                settings.decoder = Some(v.to_string());
            }
            ("flipx", None) => settings.flip_x = true,
            ("flipy", None) => settings.flip_y = true,
            ("invert", None) => settings.invert = true,
            ("compat", None) => settings.compat = true,
            ("zerofirst", None) => settings.zero_first = true,
            ("rotate" | "bank" | "wordsize" | "arch" | "decoder", None) => {
                return Err(malformed(format!("{} requires a value", key)));
            }
            ("flipx" | "flipy" | "invert" | "compat" | "zerofirst", Some(_)) => {
                return Err(malformed(format!("{} doesn't take a value", key)));
            }
            _ => return Err(malformed(format!("unknown key: {}", key))),
        }
    }

    Ok(settings)
}

/// A file name that identifies the settings, for saving decoded output.
pub fn filename(settings: &RomSettings) -> String {
    let mut name = format!(
        "{}-r{}",
        settings.decoder.as_deref().unwrap_or("raw"),
        settings.rotation.degrees()
    );
    if settings.flip_x {
        name.push_str("-fx");
    }
    if settings.flip_y {
        name.push_str("-fy");
    }
    if settings.invert {
        name.push_str("-inv");
    }
    if settings.bank != Bank::None {
        name.push_str(&format!("-b{}", settings.bank.index()));
    }
    if settings.compat {
        name.push_str("-compat");
    }
    name.push_str(".bin");
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::registry;

    fn full() -> RomSettings {
        RomSettings {
            rotation: Rotation::R270,
            flip_x: true,
            flip_y: true,
            invert: true,
            bank: Bank::Left,
            word_size: 16,
            compat: true,
            zero_first: true,
            arch: Some("msp430".to_string()),
            decoder: Some("msp430".to_string()),
        }
    }

    #[test]
    fn test_format_defaults() {
        assert_eq!(format(&RomSettings::default()), "rotate=0,wordsize=8");
    }

    #[test]
    fn test_format_full() {
        assert_eq!(
            format(&full()),
            "rotate=270,flipx,flipy,invert,bank=1,wordsize=16,compat,zerofirst,arch=msp430,decoder=msp430"
        );
    }

    #[test]
    fn test_round_trip() {
        for settings in [RomSettings::default(), full()] {
            let text = format(&settings);
            let parsed = parse(&text, registry()).unwrap();
            assert_eq!(parsed, settings);
            assert_eq!(format(&parsed), text);
        }
    }

    #[test]
    fn test_parse_is_order_and_space_tolerant() {
        let settings = parse("decoder=tlcs47font, invert ,rotate=180", registry()).unwrap();
        assert_eq!(settings.rotation, Rotation::R180);
        assert!(settings.invert);
        assert_eq!(settings.decoder.as_deref(), Some("tlcs47font"));
        assert_eq!(settings.word_size, 8);

        assert_eq!(parse("", registry()).unwrap(), RomSettings::default());
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "rotate=45",
            "rotate",
            "rotate=90,rotate=90",
            "bank=3",
            "wordsize=0",
            "wordsize=x",
            "flipx=1",
            "decoder=nosuch",
            "decoder=MSP430",
            "colour=blue",
            "rotate=0,,flipx",
            "arch=",
        ] {
            let err = parse(bad, registry()).unwrap_err();
            assert!(
                matches!(err, RomError::MalformedDescription { .. }),
                "{} gave {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_parse_with_custom_names() {
        let settings = parse_with("rotate=0,decoder=parity", |name| name == "parity").unwrap();
        assert_eq!(settings.decoder.as_deref(), Some("parity"));
        assert!(parse_with("decoder=msp430", |name| name == "parity").is_err());
        assert!(parse("decoder=parity", registry()).is_err());
    }

    #[test]
    fn test_filename() {
        assert_eq!(filename(&RomSettings::default()), "raw-r0.bin");
        assert_eq!(filename(&full()), "msp430-r270-fx-fy-inv-b1-compat.bin");
    }
}
