// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Bloom signatures: immutable `(emotion, resonance, timestamp)` records with
//! a symbolic trace and gradient vector derived once at construction.
//!
//! A trace looks like `JO-4b-609f`: the upper-cased label prefix, the
//! resonance in hundredths as two hex digits, and four hex digits of a rolling
//! hash over `label + scale`. The gradient rotates the resonance by the scale
//! (in degrees) in the xy-plane and lifts it by the label prefix read as hex.

use crate::emotion::EmotionLabel;
use crate::error::{BloomError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Three-component gradient derived from a symbolic trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Deserialize)]
struct SignatureRecord {
    emotion: EmotionLabel,
    resonance: f64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<SignatureRecord> for BloomSignature {
    type Error = BloomError;

    fn try_from(record: SignatureRecord) -> Result<Self> {
        BloomSignature::new(record.emotion, record.resonance, record.timestamp)
    }
}

/// Immutable bloom record. Deserialising recomputes the derived fields, so a
/// stored trace can never drift from its emotion and resonance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SignatureRecord")]
pub struct BloomSignature {
    emotion: EmotionLabel,
    resonance: f64,
    timestamp: DateTime<Utc>,
    symbolic_trace: String,
    gradient_vector: GradientVector,
}

impl BloomSignature {
    /// Fails with [`BloomError::ResonanceOutOfRange`] unless `resonance` is a
    /// finite value in `[0, 1]`.
    pub fn new(emotion: EmotionLabel, resonance: f64, timestamp: DateTime<Utc>) -> Result<Self> {
        if !resonance.is_finite() || !(0.0..=1.0).contains(&resonance) {
            return Err(BloomError::ResonanceOutOfRange(resonance));
        }
        let symbolic_trace = symbolic_trace(emotion, resonance);
        let gradient_vector = gradient_from_trace(&symbolic_trace, resonance);
        Ok(Self {
            emotion,
            resonance,
            timestamp,
            symbolic_trace,
            gradient_vector,
        })
    }

    pub fn emotion(&self) -> EmotionLabel {
        self.emotion
    }

    pub fn resonance(&self) -> f64 {
        self.resonance
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn symbolic_trace(&self) -> &str {
        &self.symbolic_trace
    }

    pub fn gradient_vector(&self) -> GradientVector {
        self.gradient_vector
    }

    pub fn as_sigil(&self) -> Sigil {
        Sigil {
            pattern: self.symbolic_trace.clone(),
            vector: self.gradient_vector,
            emotional_aura: self.emotion,
            bloom_level: (self.resonance * 10.0).round() as u8,
        }
    }
}

/// Render-facing projection of a signature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sigil {
    pub pattern: String,
    pub vector: GradientVector,
    pub emotional_aura: EmotionLabel,
    /// Resonance on a `0..=10` scale.
    pub bloom_level: u8,
}

/// Parses `label` and builds its signature.
pub fn derive_signature(
    label: &str,
    resonance: f64,
    timestamp: DateTime<Utc>,
) -> Result<BloomSignature> {
    BloomSignature::new(label.parse()?, resonance, timestamp)
}

/// `{CORE}-{scale}-{entropy}` for the given emotion and resonance.
pub fn symbolic_trace(emotion: EmotionLabel, resonance: f64) -> String {
    let label = emotion.as_str();
    let core: String = label.chars().take(2).collect::<String>().to_uppercase();
    let scale = format!("{:02x}", (resonance * 100.0).floor() as u32);
    let hash = rolling_hash(&format!("{label}{scale}")).unsigned_abs();
    let entropy: String = format!("{hash:x}").chars().take(4).collect();
    format!("{core}-{scale}-{entropy}")
}

/// 32-bit `h = h * 31 + unit` hash over UTF-16 code units, wrapping.
pub fn rolling_hash(input: &str) -> i32 {
    let mut hash = 0i32;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    hash
}

fn gradient_from_trace(trace: &str, resonance: f64) -> GradientVector {
    let mut segments = trace.split('-');
    let core = segments.next().map(hex_prefix_value).unwrap_or(0);
    let scale = segments.next().map(hex_prefix_value).unwrap_or(0);
    let theta = (scale % 360) as f64 * (PI / 180.0);
    GradientVector {
        x: theta.cos() * resonance,
        y: theta.sin() * resonance,
        z: (core % 8) as f64 / 8.0,
    }
}

/// Value of the longest leading run of hex digits; 0 when there is none.
fn hex_prefix_value(segment: &str) -> u64 {
    let mut value = 0u64;
    for digit in segment.chars().map_while(|c| c.to_digit(16)) {
        value = value.saturating_mul(16).saturating_add(u64::from(digit));
    }
    value
}
