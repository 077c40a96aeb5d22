// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

pub mod layered;
pub mod settings;

pub use layered::{
    ConfigDiffEvent, ConfigLayer, ConfigLayering, LayeredConfig, LayeredConfigError,
};
pub use settings::{AggregatorSettings, BloomSettings, EmitterSettings};
