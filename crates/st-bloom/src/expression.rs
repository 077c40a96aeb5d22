// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Emotion intensities → embodied expression channels.
//!
//! Each emotion drives exactly three named channels through a fixed
//! multiplier. The floating-point table is canonical; the 4-bit hex form is a
//! lossy display encoding of the same values.

use crate::emotion::EmotionLabel;
use crate::error::{BloomError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

/// One output channel and its gain relative to the emotion's intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelSpec {
    pub name: &'static str,
    pub multiplier: f64,
}

const fn ch(name: &'static str, multiplier: f64) -> ChannelSpec {
    ChannelSpec { name, multiplier }
}

const JOY: [ChannelSpec; 3] = [ch("cheeks", 1.0), ch("chest", 0.8), ch("eyes", 0.6)];
const GRIEF: [ChannelSpec; 3] = [ch("jaw", 1.0), ch("shoulders", 0.9), ch("eyes", 1.0)];
const AWE: [ChannelSpec; 3] = [ch("gaze", 1.0), ch("breath", 0.8), ch("hands", 0.7)];
const RAGE: [ChannelSpec; 3] = [ch("fists", 1.0), ch("spine", 0.8), ch("mouth", 0.9)];
const LONGING: [ChannelSpec; 3] = [ch("pelvis", 0.9), ch("hands", 0.6), ch("lips", 0.7)];
const FEAR: [ChannelSpec; 3] = [ch("pupils", 1.0), ch("shoulders", 0.9), ch("breath", 0.6)];
const CURIOSITY: [ChannelSpec; 3] = [ch("headTilt", 1.0), ch("gaze", 0.7), ch("fingers", 0.8)];

/// Channel schema driven by `label`.
pub fn channels(label: EmotionLabel) -> &'static [ChannelSpec; 3] {
    match label {
        EmotionLabel::Joy => &JOY,
        EmotionLabel::Grief => &GRIEF,
        EmotionLabel::Awe => &AWE,
        EmotionLabel::Rage => &RAGE,
        EmotionLabel::Longing => &LONGING,
        EmotionLabel::Fear => &FEAR,
        EmotionLabel::Curiosity => &CURIOSITY,
    }
}

/// Bloom intensities keyed by emotion. Absent labels read as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BloomState {
    levels: BTreeMap<EmotionLabel, f64>,
}

impl BloomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every label present at zero.
    pub fn zeroed() -> Self {
        Self {
            levels: EmotionLabel::ALL.into_iter().map(|l| (l, 0.0)).collect(),
        }
    }

    pub fn with(mut self, label: EmotionLabel, intensity: f64) -> Self {
        self.set(label, intensity);
        self
    }

    /// Non-finite intensities are stored as zero.
    pub fn set(&mut self, label: EmotionLabel, intensity: f64) {
        self.levels.insert(label, sanitize(intensity));
    }

    pub fn get(&self, label: EmotionLabel) -> f64 {
        self.levels.get(&label).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, label: EmotionLabel) -> bool {
        self.levels.contains_key(&label)
    }

    /// Overlays every label present in `other`.
    pub fn merge(&mut self, other: &BloomState) {
        self.levels.extend(other.levels.iter().map(|(l, v)| (*l, *v)));
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        self.levels.iter().map(|(l, v)| (*l, *v))
    }

    /// Builds a state from loosely typed JSON. Unknown labels are rejected;
    /// values that are not finite numbers read as zero.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => {
                let map = Map::<String, Value>::deserialize(other)?;
                Self::from_map(&map)
            }
        }
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut state = BloomState::new();
        for (key, value) in map {
            let label: EmotionLabel = key.parse()?;
            let intensity = value.as_f64().unwrap_or_else(|| {
                trace!(%label, %value, "non-numeric bloom intensity coerced to 0");
                0.0
            });
            state.set(label, intensity);
        }
        Ok(state)
    }
}

impl<'de> Deserialize<'de> for BloomState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(&map).map_err(D::Error::custom)
    }
}

impl FromIterator<(EmotionLabel, f64)> for BloomState {
    fn from_iter<I: IntoIterator<Item = (EmotionLabel, f64)>>(iter: I) -> Self {
        let mut state = BloomState::new();
        for (label, intensity) in iter {
            state.set(label, intensity);
        }
        state
    }
}

fn sanitize(intensity: f64) -> f64 {
    if intensity.is_finite() {
        intensity
    } else {
        0.0
    }
}

/// Per-emotion channel values. Always holds all seven emotions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionMap<T> {
    emotions: BTreeMap<EmotionLabel, BTreeMap<String, T>>,
}

impl<T: Copy> ExpressionMap<T> {
    pub fn get(&self, label: EmotionLabel, channel: &str) -> Option<T> {
        self.emotions.get(&label)?.get(channel).copied()
    }

    pub fn channels_of(&self, label: EmotionLabel) -> Option<&BTreeMap<String, T>> {
        self.emotions.get(&label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, &BTreeMap<String, T>)> {
        self.emotions.iter().map(|(l, c)| (*l, c))
    }

    fn map_values<U>(&self, f: impl Fn(T) -> U) -> ExpressionMap<U> {
        ExpressionMap {
            emotions: self
                .emotions
                .iter()
                .map(|(label, chans)| {
                    (
                        *label,
                        chans.iter().map(|(name, v)| (name.clone(), f(*v))).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Channel intensities as floats.
pub type ExpressionVector = ExpressionMap<f64>;

/// Channel intensities on the 4-bit display scale.
pub type HexExpressionVector = ExpressionMap<HexLevel>;

impl ExpressionVector {
    pub fn to_hex(&self) -> HexExpressionVector {
        self.map_values(HexLevel::encode)
    }
}

/// A `0..=15` level, written as `"0xF"` on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HexLevel(u8);

impl HexLevel {
    pub const MAX: HexLevel = HexLevel(15);

    /// `round(value * 15)` clamped to `0..=15`; NaN encodes as zero.
    pub fn encode(value: f64) -> Self {
        let scaled = (value * 15.0).round();
        if scaled.is_nan() {
            HexLevel(0)
        } else {
            HexLevel(scaled.clamp(0.0, 15.0) as u8)
        }
    }

    pub fn new(level: u8) -> Option<Self> {
        (level <= 15).then_some(HexLevel(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Back onto the unit interval.
    pub fn to_unit(self) -> f64 {
        f64::from(self.0) / 15.0
    }
}

impl fmt::Display for HexLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl Serialize for HexLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let level = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .and_then(HexLevel::new);
        match level {
            Some(level) => Ok(level),
            None => Err(D::Error::custom(format!("invalid hex level {raw:?}"))),
        }
    }
}

/// Maps bloom intensities onto every emotion's channel set.
pub fn map_bloom_to_expression(bloom: &BloomState) -> ExpressionVector {
    let emotions = EmotionLabel::ALL
        .into_iter()
        .map(|label| {
            let intensity = bloom.get(label);
            let chans = channels(label)
                .iter()
                .map(|spec| (spec.name.to_string(), intensity * spec.multiplier))
                .collect();
            (label, chans)
        })
        .collect();
    ExpressionMap { emotions }
}

/// Pull-style entry point for schedulers that poll the current bloom state.
pub fn compute_expression(bloom: &BloomState) -> ExpressionVector {
    map_bloom_to_expression(bloom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn joy_only_bloom_matches_the_table() {
        let vector = map_bloom_to_expression(&BloomState::new().with(EmotionLabel::Joy, 1.0));
        assert_eq!(vector.get(EmotionLabel::Joy, "cheeks"), Some(1.0));
        assert_eq!(vector.get(EmotionLabel::Joy, "chest"), Some(0.8));
        assert_eq!(vector.get(EmotionLabel::Joy, "eyes"), Some(0.6));
        for label in EmotionLabel::ALL.into_iter().filter(|l| *l != EmotionLabel::Joy) {
            let chans = vector.channels_of(label).unwrap();
            assert_eq!(chans.len(), 3);
            assert!(chans.values().all(|v| *v == 0.0), "{label}");
        }
    }

    #[test]
    fn every_emotion_is_populated_from_empty_input() {
        let vector = map_bloom_to_expression(&BloomState::new());
        assert_eq!(vector.iter().count(), 7);
        assert_eq!(vector.get(EmotionLabel::Curiosity, "headTilt"), Some(0.0));
    }

    #[test]
    fn channel_values_scale_with_intensity() {
        let bloom: BloomState = [
            (EmotionLabel::Grief, 0.5),
            (EmotionLabel::Longing, 0.5),
            (EmotionLabel::Curiosity, 0.25),
        ]
        .into_iter()
        .collect();
        let vector = compute_expression(&bloom);
        assert_relative_eq!(vector.get(EmotionLabel::Grief, "shoulders").unwrap(), 0.45);
        assert_relative_eq!(vector.get(EmotionLabel::Grief, "eyes").unwrap(), 0.5);
        assert_relative_eq!(vector.get(EmotionLabel::Longing, "pelvis").unwrap(), 0.45);
        assert_relative_eq!(vector.get(EmotionLabel::Curiosity, "gaze").unwrap(), 0.175);
    }

    #[test]
    fn json_input_coerces_values_and_rejects_labels() {
        let state = BloomState::from_json(&json!({
            "rage": 0.5,
            "fear": "loud",
            "awe": null
        }))
        .unwrap();
        assert_eq!(state.get(EmotionLabel::Rage), 0.5);
        assert_eq!(state.get(EmotionLabel::Fear), 0.0);
        assert_eq!(state.get(EmotionLabel::Awe), 0.0);
        assert_eq!(state.get(EmotionLabel::Joy), 0.0);

        let err = BloomState::from_json(&json!({"joy": 1.0, "ennui": 0.3})).unwrap_err();
        assert_eq!(err.to_string(), "unknown emotion label \"ennui\"");
        for not_an_object in [json!([1, 2]), json!(0.5), json!("joy")] {
            let err = BloomState::from_json(&not_an_object).unwrap_err();
            match err {
                BloomError::Serde(inner) => {
                    assert!(inner.to_string().contains("expected a map"), "{inner}")
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        let parsed: BloomState = serde_json::from_str(r#"{"joy": 0.25}"#).unwrap();
        assert_eq!(parsed.get(EmotionLabel::Joy), 0.25);
        let unknown = serde_json::from_str::<BloomState>(r#"{"dread": 0.25}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn merge_overlays_present_labels() {
        let mut state = BloomState::zeroed();
        state.merge(&BloomState::new().with(EmotionLabel::Awe, 0.4));
        assert_eq!(state.get(EmotionLabel::Awe), 0.4);
        assert!(state.contains(EmotionLabel::Joy));
        assert_eq!(state.iter().count(), 7);
        state.set(EmotionLabel::Joy, f64::NAN);
        assert_eq!(state.get(EmotionLabel::Joy), 0.0);
    }

    #[test]
    fn hex_encoding_rounds_and_clamps() {
        assert_eq!(HexLevel::encode(1.0), HexLevel::MAX);
        assert_eq!(HexLevel::encode(0.8).get(), 12);
        assert_eq!(HexLevel::encode(0.6).get(), 9);
        assert_eq!(HexLevel::encode(2.0).get(), 15);
        assert_eq!(HexLevel::encode(-1.0).get(), 0);
        assert_eq!(HexLevel::encode(f64::NAN).get(), 0);
        assert_eq!(HexLevel::new(16), None);
        assert_eq!(HexLevel::MAX.to_unit(), 1.0);
        assert_relative_eq!(HexLevel::encode(0.6).to_unit(), 0.6);
        assert_relative_eq!(HexLevel::encode(0.5).to_unit(), 8.0 / 15.0);

        let hex = map_bloom_to_expression(&BloomState::new().with(EmotionLabel::Joy, 1.0)).to_hex();
        let value = serde_json::to_value(&hex).unwrap();
        assert_eq!(value["joy"]["cheeks"], "0xF");
        assert_eq!(value["joy"]["chest"], "0xC");
        assert_eq!(value["grief"]["jaw"], "0x0");

        let back: HexExpressionVector = serde_json::from_value(value).unwrap();
        assert_eq!(back, hex);
        assert!(serde_json::from_str::<HexLevel>("\"0x1F\"").is_err());
        assert!(serde_json::from_str::<HexLevel>("\"F\"").is_err());
    }
}
