use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The closed set of platforms the generation API supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Twitter,
    Instagram,
    LinkedIn,
}

pub const ALL_PLATFORMS: [Platform; 4] = [
    Platform::Facebook,
    Platform::Twitter,
    Platform::Instagram,
    Platform::LinkedIn,
];

/// Immutable display metadata for one platform.
pub struct PlatformConfig {
    pub name: &'static str,
    pub icon: &'static str,
    pub max_chars: usize,
    pub accent: Color,
}

impl Platform {
    pub fn config(self) -> &'static PlatformConfig {
        match self {
            Platform::Facebook => &PlatformConfig {
                name: "Facebook",
                icon: "f",
                max_chars: 63_206,
                accent: Color::Blue,
            },
            Platform::Twitter => &PlatformConfig {
                name: "Twitter",
                icon: "𝕏",
                max_chars: 280,
                accent: Color::Cyan,
            },
            Platform::Instagram => &PlatformConfig {
                name: "Instagram",
                icon: "◉",
                max_chars: 2_200,
                accent: Color::Magenta,
            },
            Platform::LinkedIn => &PlatformConfig {
                name: "LinkedIn",
                icon: "in",
                max_chars: 3_000,
                accent: Color::LightBlue,
            },
        }
    }

    /// Identifier used on the wire (request bodies and stream events).
    pub fn id(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::LinkedIn => "linkedin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().name)
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" => Ok(Platform::Facebook),
            "twitter" => Ok(Platform::Twitter),
            "instagram" => Ok(Platform::Instagram),
            "linkedin" => Ok(Platform::LinkedIn),
            other => Err(AppError::StreamProtocol(format!(
                "Unknown platform id: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_round_trip() {
        for platform in ALL_PLATFORMS {
            assert_eq!(platform.id().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn limits_match_upstream_product() {
        assert_eq!(Platform::Twitter.config().max_chars, 280);
        assert_eq!(Platform::Instagram.config().max_chars, 2_200);
        assert_eq!(Platform::LinkedIn.config().max_chars, 3_000);
        assert_eq!(Platform::Facebook.config().max_chars, 63_206);
    }
}
