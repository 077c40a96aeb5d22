// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Batching of timestamped bloom events into signatures and per-emotion
//! summaries.

use crate::emotion::EmotionLabel;
use crate::error::{invalid_config, Result};
use crate::signature::BloomSignature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use tracing::debug;

/// Default resonance a signature needs to count as significant.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.7;

/// Raw ingestion record; every field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomEvent {
    pub emotion: Option<String>,
    pub resonance: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl BloomEvent {
    pub fn new(emotion: impl Into<String>, resonance: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion: Some(emotion.into()),
            resonance: Some(resonance),
            timestamp: Some(timestamp),
        }
    }
}

/// Signatures for every event carrying both an emotion and a resonance.
///
/// Incomplete events are skipped. Unknown labels and out-of-range resonance
/// surface as per-item errors. Events without a timestamp are stamped with
/// `fallback`. The iterator is lazy; cloning it (for cloneable inputs)
/// restarts compilation from the same position.
pub fn compile_from_events<I>(
    events: I,
    fallback: DateTime<Utc>,
) -> impl Iterator<Item = Result<BloomSignature>> + Clone
where
    I: IntoIterator,
    I::Item: Borrow<BloomEvent>,
    I::IntoIter: Clone,
{
    events.into_iter().filter_map(move |item| {
        let event: &BloomEvent = item.borrow();
        let emotion = event.emotion.as_deref()?;
        let resonance = event.resonance?;
        let timestamp = event.timestamp.unwrap_or(fallback);
        Some(
            emotion
                .parse::<EmotionLabel>()
                .and_then(|label| BloomSignature::new(label, resonance, timestamp)),
        )
    })
}

/// Keeps signatures whose resonance is at least `threshold`.
pub fn filter_significant<'a, I>(
    signatures: I,
    threshold: f64,
) -> impl Iterator<Item = &'a BloomSignature>
where
    I: IntoIterator<Item = &'a BloomSignature>,
{
    signatures
        .into_iter()
        .filter(move |signature| signature.resonance() >= threshold)
}

/// Count and mean resonance for one emotion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionTally {
    pub count: usize,
    pub avg_resonance: f64,
}

/// Per-emotion tallies. Only emotions that occurred have an entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloomSummary {
    tallies: BTreeMap<EmotionLabel, EmotionTally>,
}

impl BloomSummary {
    pub fn get(&self, label: EmotionLabel) -> Option<&EmotionTally> {
        self.tallies.get(&label)
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, &EmotionTally)> {
        self.tallies.iter().map(|(l, t)| (*l, t))
    }
}

/// Groups signatures by emotion. Input order does not matter.
pub fn summarize<'a, I>(signatures: I) -> BloomSummary
where
    I: IntoIterator<Item = &'a BloomSignature>,
{
    let mut sums: BTreeMap<EmotionLabel, (usize, f64)> = BTreeMap::new();
    for signature in signatures {
        let slot = sums.entry(signature.emotion()).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += signature.resonance();
    }
    let tallies = sums
        .into_iter()
        .map(|(label, (count, total))| {
            (
                label,
                EmotionTally {
                    count,
                    avg_resonance: total / count as f64,
                },
            )
        })
        .collect();
    BloomSummary { tallies }
}

/// Significant signatures of a batch together with their summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BloomDigest {
    pub signatures: Vec<BloomSignature>,
    pub summary: BloomSummary,
}

/// Compile → filter → summarise with a fixed significance threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomAggregator {
    significance: f64,
}

impl BloomAggregator {
    pub fn new(significance: f64) -> Result<Self> {
        if !significance.is_finite() {
            return Err(invalid_config(format!(
                "significance threshold must be finite (got {significance})"
            )));
        }
        Ok(Self { significance })
    }

    pub fn significance(&self) -> f64 {
        self.significance
    }

    /// Fails on the first event with an unknown label or invalid resonance.
    pub fn digest(&self, events: &[BloomEvent], fallback: DateTime<Utc>) -> Result<BloomDigest> {
        let compiled = compile_from_events(events, fallback);
        let compiled: Vec<BloomSignature> = compiled.collect::<Result<_>>()?;
        let significant = filter_significant(&compiled, self.significance);
        let signatures: Vec<BloomSignature> = significant.cloned().collect();
        let summary = summarize(&signatures);
        debug!(
            events = events.len(),
            compiled = compiled.len(),
            significant = signatures.len(),
            emotions = summary.len(),
            "digested bloom events"
        );
        Ok(BloomDigest {
            signatures,
            summary,
        })
    }
}

impl Default for BloomAggregator {
    fn default() -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}
