// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Caller-owned resonance lattice fed into and boosted by the bloom
//! calculator.

use crate::calculator::{apply_bloom, BloomResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Single cell of the resonance lattice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeCell {
    /// Amplitude in `[0, 1]`.
    pub amplitude: f64,
    /// Phase in radians, `[0, 2π)`.
    pub phase: f64,
    /// Accumulated emotional charge.
    pub emotion: f64,
}

impl LatticeCell {
    pub fn new(amplitude: f64, phase: f64, emotion: f64) -> Self {
        Self {
            amplitude,
            phase,
            emotion,
        }
    }

    /// Amplitude quantised onto the 4-bit grid scale.
    pub fn hex_level(&self) -> u8 {
        let level = (self.amplitude * 15.0).floor();
        if level.is_nan() {
            0
        } else {
            level.clamp(0.0, 15.0) as u8
        }
    }

    /// Grid label such as `0xA`.
    pub fn hex_label(&self) -> String {
        format!("0x{:X}", self.hex_level())
    }
}

/// Ordered collection of lattice cells. Plain value, never shared.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lattice {
    cells: Vec<LatticeCell>,
}

impl Lattice {
    pub fn new(cells: Vec<LatticeCell>) -> Self {
        Self { cells }
    }

    /// Random superposition: amplitudes in `[0, 1)`, phases in `[0, 2π)`,
    /// zero emotional charge.
    pub fn superposition<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let cells = (0..len)
            .map(|_| LatticeCell {
                amplitude: rng.gen_range(0.0..1.0),
                phase: rng.gen_range(0.0..TAU),
                emotion: 0.0,
            })
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[LatticeCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<LatticeCell> {
        self.cells
    }

    /// Mean phase, used as the calculator's phase momentum. Zero when empty.
    pub fn mean_phase(&self) -> f64 {
        self.mean_by(|cell| cell.phase)
    }

    /// Mean emotional charge, used as the calculator's emotional energy.
    pub fn mean_emotion(&self) -> f64 {
        self.mean_by(|cell| cell.emotion)
    }

    /// Returns the lattice after a bloom; `self` is left untouched.
    pub fn bloom(&self, result: &BloomResult, boost: f64) -> Lattice {
        Lattice::new(apply_bloom(&self.cells, result, boost))
    }

    fn mean_by(&self, f: impl Fn(&LatticeCell) -> f64) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().map(f).sum::<f64>() / self.cells.len() as f64
    }
}

impl From<Vec<LatticeCell>> for Lattice {
    fn from(cells: Vec<LatticeCell>) -> Self {
        Lattice::new(cells)
    }
}
