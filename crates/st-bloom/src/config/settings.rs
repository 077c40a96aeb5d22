// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use super::layered::LayeredConfig;
use crate::aggregator::{BloomAggregator, DEFAULT_SIGNIFICANCE};
use crate::calculator::{BloomCalculator, BloomConfig};
use crate::emitter::{ExpressionEmitter, DEFAULT_UPDATE_RATE};
use crate::error::{invalid_config, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    pub significance: f64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    pub update_rate_ms: u64,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            update_rate_ms: DEFAULT_UPDATE_RATE.as_millis() as u64,
        }
    }
}

/// Typed view over the `[bloom]`, `[aggregator]` and `[emitter]` sections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub bloom: BloomConfig,
    pub aggregator: AggregatorSettings,
    pub emitter: EmitterSettings,
}

impl BloomSettings {
    /// Reads and validates the sections; missing sections take defaults.
    pub fn from_layered(config: &LayeredConfig) -> Result<Self> {
        let settings = BloomSettings {
            bloom: config.section(&["bloom"])?.unwrap_or_default(),
            aggregator: config.section(&["aggregator"])?.unwrap_or_default(),
            emitter: config.section(&["emitter"])?.unwrap_or_default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.bloom.validate()?;
        if !self.aggregator.significance.is_finite() {
            return Err(invalid_config("aggregator significance must be finite"));
        }
        if self.emitter.update_rate_ms == 0 {
            return Err(invalid_config("emitter update_rate_ms must be > 0"));
        }
        Ok(())
    }

    pub fn calculator(&self) -> Result<BloomCalculator> {
        BloomCalculator::new(self.bloom)
    }

    pub fn aggregator(&self) -> Result<BloomAggregator> {
        BloomAggregator::new(self.aggregator.significance)
    }

    pub fn emitter(&self) -> ExpressionEmitter {
        ExpressionEmitter::new(Duration::from_millis(self.emitter.update_rate_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layered::ConfigLayering;
    use crate::error::BloomError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn empty_config_yields_defaults() {
        let settings = BloomSettings::from_layered(&LayeredConfig::empty()).unwrap();
        assert_eq!(settings, BloomSettings::default());
        assert_eq!(settings.bloom.drag, 1.0);
        assert_eq!(settings.bloom.threshold, 0.7);
        assert_eq!(settings.aggregator.significance, 0.7);
        assert_eq!(settings.emitter().update_rate(), Duration::from_secs(1));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let root = tempdir().unwrap();
        let base = root.path().join("base.toml");
        fs::write(
            &base,
            "[bloom]\nthreshold = 0.5\n\n[emitter]\nupdate_rate_ms = 250\n",
        )
        .unwrap();
        let layered = LayeredConfig::load(ConfigLayering::default().with_base(&base)).unwrap();
        let settings = BloomSettings::from_layered(&layered).unwrap();
        assert_eq!(settings.bloom.threshold, 0.5);
        assert_eq!(settings.bloom.drag, 1.0);
        assert_eq!(settings.emitter.update_rate_ms, 250);
        assert_eq!(settings.aggregator().unwrap().significance(), 0.7);
    }

    #[test]
    fn zero_drag_in_config_is_rejected() {
        let root = tempdir().unwrap();
        let run = root.path().join("run.json");
        fs::write(&run, r#"{"bloom": {"drag": 0.0}}"#).unwrap();
        let layered = LayeredConfig::load(ConfigLayering::default().with_run(&run)).unwrap();
        assert!(matches!(
            BloomSettings::from_layered(&layered),
            Err(BloomError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_update_rate_is_rejected() {
        let settings = BloomSettings {
            emitter: EmitterSettings { update_rate_ms: 0 },
            ..BloomSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
