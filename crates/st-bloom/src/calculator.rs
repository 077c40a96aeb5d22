// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Quadratic bloom gating.
//!
//! A bloom is the positive root of `drag·x² + p·x + e = 0`, where `p` is the
//! phase momentum and `e` the emotional energy. Inputs without real roots are
//! a valid "no bloom" outcome rather than an error.

use crate::error::{ensure_finite, invalid_config, Result};
use crate::lattice::LatticeCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const DEFAULT_DRAG: f64 = 1.0;
pub const DEFAULT_BLOOM_THRESHOLD: f64 = 0.7;
pub const DEFAULT_BLOOM_BOOST: f64 = 0.05;

/// Emotional charge multiplier applied to every cell of a blooming lattice.
pub const BLOOM_EMOTION_GAIN: f64 = 1.1;

/// Tunables for the bloom calculator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// Quadratic coefficient; must be finite and strictly positive.
    pub drag: f64,
    /// Positive root must exceed this to count as blooming.
    pub threshold: f64,
    /// Amplitude added to each lattice cell when blooming.
    pub boost: f64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            drag: DEFAULT_DRAG,
            threshold: DEFAULT_BLOOM_THRESHOLD,
            boost: DEFAULT_BLOOM_BOOST,
        }
    }
}

impl BloomConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.drag.is_finite() || self.drag <= 0.0 {
            return Err(invalid_config(format!(
                "drag must be finite and > 0 (got {})",
                self.drag
            )));
        }
        if !self.threshold.is_finite() {
            return Err(invalid_config(format!(
                "bloom threshold must be finite (got {})",
                self.threshold
            )));
        }
        if !self.boost.is_finite() || self.boost < 0.0 {
            return Err(invalid_config(format!(
                "bloom boost must be finite and >= 0 (got {})",
                self.boost
            )));
        }
        Ok(())
    }
}

/// Outcome of a bloom computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomResult {
    pub discriminant: f64,
    pub resonance_positive: Option<f64>,
    pub resonance_negative: Option<f64>,
    pub is_blooming: bool,
}

impl BloomResult {
    /// Both roots, when the discriminant is non-negative.
    pub fn roots(&self) -> Option<(f64, f64)> {
        self.resonance_positive.zip(self.resonance_negative)
    }
}

/// Validated calculator. Holds configuration only, no state between calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomCalculator {
    config: BloomConfig,
}

impl BloomCalculator {
    pub fn new(config: BloomConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    pub fn compute_bloom(&self, phase_momentum: f64, emotional_energy: f64) -> Result<BloomResult> {
        let p = ensure_finite("phase momentum", phase_momentum)?;
        let e = ensure_finite("emotional energy", emotional_energy)?;
        let drag = self.config.drag;

        // Finite inputs can still overflow once squared or scaled by drag.
        let discriminant = ensure_finite("discriminant", p * p - 4.0 * drag * e)?;
        if discriminant < 0.0 {
            trace!(discriminant, "no real resonance");
            return Ok(BloomResult {
                discriminant,
                resonance_positive: None,
                resonance_negative: None,
                is_blooming: false,
            });
        }

        let root = discriminant.sqrt();
        let positive = ensure_finite("positive resonance", (-p + root) / (2.0 * drag))?;
        let negative = ensure_finite("negative resonance", (-p - root) / (2.0 * drag))?;
        let is_blooming = positive > self.config.threshold;
        if is_blooming {
            debug!(
                resonance = positive,
                threshold = self.config.threshold,
                "bloom"
            );
        }
        Ok(BloomResult {
            discriminant,
            resonance_positive: Some(positive),
            resonance_negative: Some(negative),
            is_blooming,
        })
    }

    /// [`apply_bloom`] with the configured boost.
    pub fn apply(&self, cells: &[LatticeCell], result: &BloomResult) -> Vec<LatticeCell> {
        apply_bloom(cells, result, self.config.boost)
    }
}

impl Default for BloomCalculator {
    fn default() -> Self {
        Self {
            config: BloomConfig::default(),
        }
    }
}

/// Four-argument form of [`BloomCalculator::compute_bloom`] using the default boost.
pub fn compute_bloom(
    phase_momentum: f64,
    emotional_energy: f64,
    drag: f64,
    threshold: f64,
) -> Result<BloomResult> {
    BloomCalculator::new(BloomConfig {
        drag,
        threshold,
        ..BloomConfig::default()
    })?
    .compute_bloom(phase_momentum, emotional_energy)
}

/// Returns a boosted copy of `cells` when `result` is blooming and an equal
/// copy otherwise. The input slice is never modified.
pub fn apply_bloom(cells: &[LatticeCell], result: &BloomResult, boost: f64) -> Vec<LatticeCell> {
    if !result.is_blooming {
        return cells.to_vec();
    }
    cells
        .iter()
        .map(|cell| LatticeCell {
            amplitude: (cell.amplitude + boost).min(1.0),
            emotion: cell.emotion * BLOOM_EMOTION_GAIN,
            ..*cell
        })
        .collect()
}

/// Aura ring geometry handed to whatever draws the bloom.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomAura {
    pub radius: f64,
    pub alpha: f64,
}

impl BloomAura {
    /// `None` when there is nothing to draw.
    pub fn from_strength(base_radius: f64, strength: f64) -> Option<Self> {
        if !strength.is_finite() || strength == 0.0 {
            return None;
        }
        Some(Self {
            radius: base_radius + strength * 10.0,
            alpha: strength.min(1.0),
        })
    }
}
