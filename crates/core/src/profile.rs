//! Response modes and profiles.
//!
//! [`ModelMode`] is what the student picks in the UI. [`ResponseProfile`] is
//! what is actually bound to the live backend conversation; it is derived from
//! the mode and whether an image is attached, so `ImageForced` can never be
//! requested directly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SetupError;

/// The response mode the student selects for a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelMode {
    #[default]
    Standard,
    Fast,
    Thinking,
}

impl ModelMode {
    pub const ALL: [ModelMode; 3] = [Self::Standard, Self::Fast, Self::Thinking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Fast => "fast",
            Self::Thinking => "thinking",
        }
    }

    /// Short label for mode pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Default",
            Self::Fast => "Fast AI",
            Self::Thinking => "Think More",
        }
    }

    /// Status text shown while waiting for the first fragment.
    pub fn waiting_text(&self) -> &'static str {
        match self {
            Self::Thinking => "Thinking deeply...",
            _ => "Thinking...",
        }
    }
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelMode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "fast" => Ok(Self::Fast),
            "thinking" | "think" => Ok(Self::Thinking),
            other => Err(SetupError::UnknownModelMode(other.to_string())),
        }
    }
}

/// The combination of model and generation settings bound to a live
/// conversation handle. Handle swaps happen exactly when this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseProfile {
    Standard,
    Fast,
    Thinking,
    ImageForced,
}

impl ResponseProfile {
    /// Derive the effective profile for a turn. An attached image wins over any
    /// requested mode.
    pub fn resolve(mode: ModelMode, has_image: bool) -> Self {
        if has_image {
            return Self::ImageForced;
        }
        match mode {
            ModelMode::Thinking => Self::Thinking,
            ModelMode::Fast => Self::Fast,
            ModelMode::Standard => Self::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Fast => "fast",
            Self::Thinking => "thinking",
            Self::ImageForced => "image-forced",
        }
    }
}

impl std::fmt::Display for ResponseProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_always_forces_image_profile() {
        for mode in ModelMode::ALL {
            assert_eq!(ResponseProfile::resolve(mode, true), ResponseProfile::ImageForced);
        }
    }

    #[test]
    fn modes_map_to_profiles_without_image() {
        assert_eq!(
            ResponseProfile::resolve(ModelMode::Standard, false),
            ResponseProfile::Standard
        );
        assert_eq!(ResponseProfile::resolve(ModelMode::Fast, false), ResponseProfile::Fast);
        assert_eq!(
            ResponseProfile::resolve(ModelMode::Thinking, false),
            ResponseProfile::Thinking
        );
    }

    #[test]
    fn model_mode_parses_aliases() {
        assert_eq!("Default".parse::<ModelMode>().unwrap(), ModelMode::Standard);
        assert_eq!(" fast ".parse::<ModelMode>().unwrap(), ModelMode::Fast);
        assert_eq!("think".parse::<ModelMode>().unwrap(), ModelMode::Thinking);
        assert!("turbo".parse::<ModelMode>().is_err());
    }

    #[test]
    fn profile_serializes_kebab_case() {
        let json = serde_json::to_string(&ResponseProfile::ImageForced).unwrap();
        assert_eq!(json, r#""image-forced""#);
    }

    #[test]
    fn waiting_text_depends_on_mode() {
        assert_eq!(ModelMode::Thinking.waiting_text(), "Thinking deeply...");
        assert_eq!(ModelMode::Fast.waiting_text(), "Thinking...");
    }
}
