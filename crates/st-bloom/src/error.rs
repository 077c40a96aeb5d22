// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BloomError>;

/// Precondition failures raised by the bloom pipeline.
#[derive(Debug, Error)]
pub enum BloomError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unknown emotion label {0:?}")]
    UnknownEmotionLabel(String),
    #[error("{name} must be finite (got {value})")]
    NonFiniteInput { name: &'static str, value: f64 },
    #[error("resonance {0} is outside [0, 1]")]
    ResonanceOutOfRange(f64),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub fn invalid_config(m: impl Into<String>) -> BloomError {
    BloomError::InvalidConfiguration(m.into())
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BloomError::NonFiniteInput { name, value })
    }
}
