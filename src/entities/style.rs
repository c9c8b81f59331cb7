//! Aging style presets offered by the generator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed aging transformation presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgingStyle {
    /// Deep marks of time, weathered skin
    Rustico,
    /// Balanced aging that keeps the original traits
    #[default]
    Natural,
    /// Well-groomed, sophisticated elderly look
    Elegante,
}

impl AgingStyle {
    /// All styles in display order.
    pub const ALL: [Self; 3] = [Self::Rustico, Self::Natural, Self::Elegante];

    /// Identifier stored in the database and used in blob paths.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Rustico => "rustico",
            Self::Natural => "natural",
            Self::Elegante => "elegante",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rustico => "Rústico",
            Self::Natural => "Natural",
            Self::Elegante => "Elegante",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Rustico => "Marcas profundas do tempo, pele castigada e visual cansado.",
            Self::Natural => "Envelhecimento equilibrado, mantendo seus traços originais.",
            Self::Elegante => "Sofisticação, pele bem cuidada e um ar de sabedoria.",
        }
    }

    /// Instruction sent to the image model alongside the photo.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Rustico => {
                "Transform this image to make the person look significantly older (approx 85 years old). \
                 Apply deep, pronounced wrinkles, weathered and sun-damaged skin texture, heavy eye bags, \
                 and a tired, rugged look. Focus on intense aging signs. Maintain original facial structure \
                 and background."
            }
            Self::Natural => {
                "Transform this image to make the person look like a natural older version of themselves \
                 (approx 75-80 years old). Add realistic wrinkles, age spots, and grey hair while maintaining \
                 a balanced, healthy, and authentic appearance. Keep original facial structure and background."
            }
            Self::Elegante => {
                "Transform this image to make the person look like a sophisticated and well-groomed elderly \
                 person. Add refined wrinkles, elegant white/grey hair, and healthy, glowing skin. The look \
                 should convey wisdom and sophistication. Maintain original facial structure and background."
            }
        }
    }
}

impl fmt::Display for AgingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AgingStyle {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::errors::Error::Validation {
                message: format!("Estilo desconhecido: {s}"),
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_default_style_is_natural() {
        assert_eq!(AgingStyle::default(), AgingStyle::Natural);
    }

    #[test]
    fn test_parse_style_ids() {
        assert_eq!("rustico".parse::<AgingStyle>().unwrap(), AgingStyle::Rustico);
        assert_eq!(" Elegante ".parse::<AgingStyle>().unwrap(), AgingStyle::Elegante);
        assert!("vintage".parse::<AgingStyle>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_ids() {
        let json = serde_json::to_string(&AgingStyle::Rustico).unwrap();
        assert_eq!(json, "\"rustico\"");
        let style: AgingStyle = serde_json::from_str("\"elegante\"").unwrap();
        assert_eq!(style, AgingStyle::Elegante);
    }
}
