// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::error::BloomError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of emotions understood by the bloom pipeline.
///
/// Every per-emotion table in the crate matches exhaustively on this enum, so
/// a new variant cannot be added without extending all of them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Joy,
    Grief,
    Awe,
    Rage,
    Longing,
    Fear,
    Curiosity,
}

impl EmotionLabel {
    /// All labels in canonical order (hex keys `0x0`..`0x6`).
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Joy,
        EmotionLabel::Grief,
        EmotionLabel::Awe,
        EmotionLabel::Rage,
        EmotionLabel::Longing,
        EmotionLabel::Fear,
        EmotionLabel::Curiosity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Joy => "joy",
            EmotionLabel::Grief => "grief",
            EmotionLabel::Awe => "awe",
            EmotionLabel::Rage => "rage",
            EmotionLabel::Longing => "longing",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Curiosity => "curiosity",
        }
    }

    /// Position of the label in the hex-keyed expression vector.
    pub fn hex_key(self) -> u8 {
        match self {
            EmotionLabel::Joy => 0x0,
            EmotionLabel::Grief => 0x1,
            EmotionLabel::Awe => 0x2,
            EmotionLabel::Rage => 0x3,
            EmotionLabel::Longing => 0x4,
            EmotionLabel::Fear => 0x5,
            EmotionLabel::Curiosity => 0x6,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = BloomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| BloomError::UnknownEmotionLabel(s.to_string()))
    }
}
