// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Expression frames for subscribers.
//!
//! The emitter never schedules itself; whoever owns the clock calls
//! [`ExpressionEmitter::emit`] every [`ExpressionEmitter::update_rate`].

use crate::error::Result;
use crate::expression::{map_bloom_to_expression, BloomState, HexExpressionVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_UPDATE_RATE: Duration = Duration::from_millis(1000);

/// One emitted snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionFrame {
    pub timestamp: DateTime<Utc>,
    pub bloom: BloomState,
    pub expression: HexExpressionVector,
}

type Subscriber = Box<dyn FnMut(&ExpressionFrame) + Send>;

pub struct ExpressionEmitter {
    bloom: BloomState,
    subscribers: Vec<Subscriber>,
    update_rate: Duration,
}

impl ExpressionEmitter {
    pub fn new(update_rate: Duration) -> Self {
        Self {
            bloom: BloomState::zeroed(),
            subscribers: Vec::new(),
            update_rate,
        }
    }

    pub fn update_rate(&self) -> Duration {
        self.update_rate
    }

    pub fn bloom(&self) -> &BloomState {
        &self.bloom
    }

    /// Overlays `update` on the current bloom state.
    pub fn inject(&mut self, update: &BloomState) {
        self.bloom.merge(update);
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&ExpressionFrame) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn hex_expression(&self) -> HexExpressionVector {
        map_bloom_to_expression(&self.bloom).to_hex()
    }

    pub fn frame(&self, now: DateTime<Utc>) -> ExpressionFrame {
        ExpressionFrame {
            timestamp: now,
            bloom: self.bloom.clone(),
            expression: self.hex_expression(),
        }
    }

    /// Builds a frame, hands it to every subscriber and returns it.
    pub fn emit(&mut self, now: DateTime<Utc>) -> ExpressionFrame {
        let frame = self.frame(now);
        for subscriber in &mut self.subscribers {
            subscriber(&frame);
        }
        debug!(
            subscribers = self.subscribers.len(),
            "emitted expression frame"
        );
        frame
    }

    /// Pretty JSON of the current frame.
    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.frame(now))?)
    }
}

impl Default for ExpressionEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_RATE)
    }
}

impl fmt::Debug for ExpressionEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionEmitter")
            .field("bloom", &self.bloom)
            .field("subscribers", &self.subscribers.len())
            .field("update_rate", &self.update_rate)
            .finish()
    }
}

/// `{label}_{unix millis}.json`.
pub fn export_file_name(label: &str, now: DateTime<Utc>) -> String {
    format!("{label}_{}.json", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionLabel;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn starts_zeroed_with_every_label() {
        let emitter = ExpressionEmitter::default();
        assert_eq!(emitter.update_rate(), Duration::from_secs(1));
        assert_eq!(emitter.bloom().iter().count(), 7);
        let hex = emitter.hex_expression();
        for (_, chans) in hex.iter() {
            assert!(chans.values().all(|v| v.get() == 0));
        }
    }

    #[test]
    fn inject_merges_and_emit_reaches_subscribers() {
        let mut emitter = ExpressionEmitter::new(Duration::from_millis(250));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        emitter.subscribe(move |frame| sink.lock().unwrap().push(frame.clone()));

        emitter.inject(&BloomState::new().with(EmotionLabel::Joy, 1.0));
        emitter.inject(&BloomState::new().with(EmotionLabel::Fear, 0.5));
        let frame = emitter.emit(at(1_000));

        assert_eq!(frame.bloom.get(EmotionLabel::Joy), 1.0);
        assert_eq!(frame.bloom.get(EmotionLabel::Fear), 0.5);
        let cheeks = frame.expression.get(EmotionLabel::Joy, "cheeks");
        let pupils = frame.expression.get(EmotionLabel::Fear, "pupils");
        assert_eq!(cheeks.unwrap().get(), 15);
        assert_eq!(pupils.unwrap().get(), 8);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], frame);
    }

    #[test]
    fn export_payload_uses_hex_strings() {
        let mut emitter = ExpressionEmitter::default();
        emitter.inject(&BloomState::new().with(EmotionLabel::Rage, 1.0));
        let json = emitter.export_json(at(0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["expression"]["rage"]["fists"], "0xF");
        assert_eq!(value["bloom"]["rage"], 1.0);
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn file_names_carry_millis() {
        let name = export_file_name("bloomframe", at(1_700_000_000_123));
        assert_eq!(name, "bloomframe_1700000000123.json");
    }
}
