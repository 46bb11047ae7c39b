//! Icon variants a manifest can advertise.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of icon a caller wants for a source app.
///
/// Each type pairs a manifest tag with the exact logical pixel size the
/// manifest must provide. New types can be expressed with
/// [`IconType::Custom`] without changing the manifest schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    /// 29x29 icon used for spotlight and settings.
    #[default]
    Spotlight,
    /// Any other tag/size pairing.
    Custom {
        /// Manifest `type` value.
        tag: String,
        /// Required logical pixel size.
        size: u32,
    },
}

impl IconType {
    /// Manifest tag for [`IconType::Spotlight`].
    pub const SPOTLIGHT_TAG: &'static str = "spotlight";
    /// Logical size for [`IconType::Spotlight`].
    pub const SPOTLIGHT_SIZE: u32 = 29;

    /// Create a custom icon type.
    pub fn custom(tag: impl Into<String>, size: u32) -> Self {
        Self::Custom {
            tag: tag.into(),
            size,
        }
    }

    /// The manifest `type` value this icon type matches.
    pub fn tag(&self) -> &str {
        match self {
            Self::Spotlight => Self::SPOTLIGHT_TAG,
            Self::Custom { tag, .. } => tag,
        }
    }

    /// The logical pixel size an entry must have to match.
    pub fn size(&self) -> u32 {
        match self {
            Self::Spotlight => Self::SPOTLIGHT_SIZE,
            Self::Custom { size, .. } => *size,
        }
    }
}

impl fmt::Display for IconType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tag(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotlight() {
        let ty = IconType::Spotlight;
        assert_eq!(ty.tag(), "spotlight");
        assert_eq!(ty.size(), 29);
        assert_eq!(ty.to_string(), "spotlight@29");
        assert_eq!(IconType::default(), ty);
    }

    #[test]
    fn test_custom() {
        let ty = IconType::custom("settings", 58);
        assert_eq!(ty.tag(), "settings");
        assert_eq!(ty.size(), 58);
        assert_ne!(ty, IconType::Spotlight);
    }
}
