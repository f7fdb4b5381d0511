// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Transform and decode settings, as a plain value.
//!
//! This is what the description string and JSON settings files encode, and
//! what [`crate::Rom::apply_settings`] consumes.

use serde::{Deserialize, Serialize};

use crate::error::RomError;
use crate::transform::{Bank, Rotation};

pub const DEFAULT_WORD_SIZE: u32 = 8;
pub const MAX_WORD_SIZE: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RomSettings {
    pub rotation: Rotation,
    pub flip_x: bool,
    pub flip_y: bool,
    pub invert: bool,
    pub bank: Bank,
    pub word_size: u32,
    /// Legacy transform order, see [`crate::TransformOrder`].
    pub compat: bool,
    pub zero_first: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoder: Option<String>,
}

impl Default for RomSettings {
    fn default() -> Self {
        Self {
            rotation: Rotation::R0,
            flip_x: false,
            flip_y: false,
            invert: false,
            bank: Bank::None,
            word_size: DEFAULT_WORD_SIZE,
            compat: false,
            zero_first: false,
            arch: None,
            decoder: None,
        }
    }
}

impl RomSettings {
    pub fn from_json(json: &str) -> Result<Self, RomError> {
        let settings: RomSettings =
            serde_json::from_str(json).map_err(|e| RomError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, RomError> {
        serde_json::to_string_pretty(self).map_err(|e| RomError::Settings(e.to_string()))
    }

    /// Checks the values serde can't.
    pub fn validate(&self) -> Result<(), RomError> {
        validate_word_size(self.word_size)?;
        if let Some(arch) = &self.arch {
            validate_arch(arch)?;
        }
        Ok(())
    }
}

pub fn validate_word_size(word_size: u32) -> Result<(), RomError> {
    if word_size == 0 || word_size > MAX_WORD_SIZE {
        return Err(RomError::invalid("word size", word_size));
    }
    Ok(())
}

/// Architecture names travel inside the description string, so must not
/// contain its separators.
pub fn validate_arch(arch: &str) -> Result<(), RomError> {
    if arch.is_empty() || arch.chars().any(|c| c == ',' || c == '=' || c.is_whitespace()) {
        return Err(RomError::invalid("architecture", arch));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings = RomSettings::from_json("{}").unwrap();
        assert_eq!(settings, RomSettings::default());
        assert_eq!(settings.word_size, 8);
    }

    #[test]
    fn test_json() {
        let json = r#"{
            "rotation": 180,
            "flip_x": true,
            "bank": 2,
            "word_size": 16,
            "arch": "msp430",
            "decoder": "msp430"
        }"#;
        let settings = RomSettings::from_json(json).unwrap();
        assert_eq!(settings.rotation, Rotation::R180);
        assert!(settings.flip_x);
        assert!(!settings.flip_y);
        assert_eq!(settings.bank, Bank::Right);
        assert_eq!(settings.arch.as_deref(), Some("msp430"));

        let again = RomSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(again, settings);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            RomSettings::from_json(r#"{"rotation": 45}"#),
            Err(RomError::Settings(_))
        ));
        assert!(matches!(
            RomSettings::from_json(r#"{"colour": "blue"}"#),
            Err(RomError::Settings(_))
        ));
        assert!(matches!(
            RomSettings::from_json(r#"{"word_size": 0}"#),
            Err(RomError::InvalidParameter { .. })
        ));
        assert!(matches!(
            RomSettings::from_json(r#"{"arch": "z80,6502"}"#),
            Err(RomError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_arch() {
        assert!(validate_arch("tlcs47").is_ok());
        assert!(validate_arch("").is_err());
        assert!(validate_arch("a=b").is_err());
        assert!(validate_arch("two words").is_err());
    }
}
