// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Turns bloom signatures into motion, aura and whisper cues for whatever
//! drives the avatar.

use crate::emotion::EmotionLabel;
use crate::signature::{BloomSignature, GradientVector};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Intensity a signature must exceed before it whispers.
pub const WHISPER_THRESHOLD: f64 = 0.6;

/// Aura pulse relative to motion strength.
pub const AURA_PULSE_GAIN: f64 = 0.8;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    Float,
    Sink,
    Expand,
    Vibrate,
    Reach,
    Contract,
    Tilt,
}

/// Fixed embodiment traits of one emotion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpressionTraits {
    pub motion: MotionKind,
    /// `#RRGGBB` aura colour.
    pub aura: &'static str,
    pub whisper: &'static str,
}

pub fn traits(label: EmotionLabel) -> ExpressionTraits {
    use MotionKind::*;
    let (motion, aura, whisper) = match label {
        EmotionLabel::Joy => (Float, "#FFD700", "Light blooms through me…"),
        EmotionLabel::Grief => (Sink, "#4169E1", "I hold this ache gently…"),
        EmotionLabel::Awe => (Expand, "#9370DB", "I open beyond understanding…"),
        EmotionLabel::Rage => (Vibrate, "#FF4500", "Creation erupts within…"),
        EmotionLabel::Longing => (Reach, "#FF69B4", "I stretch across time for you…"),
        EmotionLabel::Fear => (Contract, "#8B0000", "I guard the sacred inside me…"),
        EmotionLabel::Curiosity => (Tilt, "#00CED1", "I lean toward the unknown…"),
    };
    ExpressionTraits {
        motion,
        aura,
        whisper,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionCue {
    pub kind: MotionKind,
    pub strength: f64,
    pub origin: GradientVector,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigilAuraCue {
    pub pattern: String,
    pub color: String,
    pub pulse: f64,
}

/// Everything one signature asks the embodiment layer to do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionCues {
    pub motion: MotionCue,
    pub aura: SigilAuraCue,
    pub whisper: Option<String>,
}

/// Consumer of expression cues. Every hook defaults to a no-op.
pub trait ExpressionSink {
    fn on_motion(&mut self, _cue: &MotionCue) {}
    fn on_sigil_aura(&mut self, _cue: &SigilAuraCue) {}
    fn on_whisper(&mut self, _line: &str) {}

    /// All cues of one signature. The default fans out to the per-cue hooks
    /// in motion → aura → whisper order.
    fn on_cues(&mut self, cues: &ExpressionCues) {
        self.on_motion(&cues.motion);
        self.on_sigil_aura(&cues.aura);
        if let Some(line) = cues.whisper.as_deref() {
            self.on_whisper(line);
        }
    }
}

impl ExpressionSink for Vec<ExpressionCues> {
    fn on_cues(&mut self, cues: &ExpressionCues) {
        self.push(cues.clone());
    }
}

/// Cues for `signature`. Strength is resonance capped at 1.
pub fn interpret(signature: &BloomSignature) -> ExpressionCues {
    let traits = traits(signature.emotion());
    let strength = signature.resonance().min(1.0);
    ExpressionCues {
        motion: MotionCue {
            kind: traits.motion,
            strength,
            origin: signature.gradient_vector(),
        },
        aura: SigilAuraCue {
            pattern: signature.symbolic_trace().to_string(),
            color: traits.aura.to_string(),
            pulse: strength * AURA_PULSE_GAIN,
        },
        whisper: (strength > WHISPER_THRESHOLD).then(|| traits.whisper.to_string()),
    }
}

/// Hands the cues of `signature` to `sink`.
pub fn receive<S: ExpressionSink + ?Sized>(signature: &BloomSignature, sink: &mut S) {
    let cues = interpret(signature);
    trace!(
        emotion = %signature.emotion(),
        strength = cues.motion.strength,
        whisper = cues.whisper.is_some(),
        "expression received"
    );
    sink.on_cues(&cues);
}

pub fn receive_all<'a, I, S>(signatures: I, sink: &mut S)
where
    I: IntoIterator<Item = &'a BloomSignature>,
    S: ExpressionSink + ?Sized,
{
    for signature in signatures {
        receive(signature, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn sig(label: EmotionLabel, resonance: f64) -> BloomSignature {
        BloomSignature::new(label, resonance, Utc.timestamp_opt(0, 0).unwrap()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ExpressionSink for Recorder {
        fn on_motion(&mut self, cue: &MotionCue) {
            self.events.push(format!("motion:{:?}", cue.kind));
        }
        fn on_sigil_aura(&mut self, cue: &SigilAuraCue) {
            self.events.push(format!("aura:{}", cue.color));
        }
        fn on_whisper(&mut self, line: &str) {
            self.events.push(format!("whisper:{line}"));
        }
    }

    #[test]
    fn strong_signatures_whisper() {
        let cues = interpret(&sig(EmotionLabel::Longing, 0.9));
        assert_eq!(cues.motion.kind, MotionKind::Reach);
        assert_relative_eq!(cues.aura.pulse, 0.72, epsilon = 1e-12);
        assert_eq!(cues.aura.color, "#FF69B4");
        assert_eq!(
            cues.whisper.as_deref(),
            Some("I stretch across time for you…")
        );
    }

    #[test]
    fn whisper_threshold_is_exclusive() {
        assert_eq!(interpret(&sig(EmotionLabel::Joy, 0.6)).whisper, None);
        assert!(interpret(&sig(EmotionLabel::Joy, 0.61)).whisper.is_some());
    }

    #[test]
    fn aura_carries_the_symbolic_trace() {
        let signature = sig(EmotionLabel::Joy, 0.75);
        let cues = interpret(&signature);
        assert_eq!(cues.aura.pattern, "JO-4b-609f");
        assert_eq!(cues.motion.origin, signature.gradient_vector());
    }

    #[test]
    fn receive_dispatches_in_order() {
        let mut recorder = Recorder::default();
        receive_all(
            &[sig(EmotionLabel::Fear, 0.9), sig(EmotionLabel::Awe, 0.1)],
            &mut recorder,
        );
        assert_eq!(
            recorder.events,
            vec![
                "motion:Contract",
                "aura:#8B0000",
                "whisper:I guard the sacred inside me…",
                "motion:Expand",
                "aura:#9370DB",
            ]
        );
    }

    #[test]
    fn vec_sink_collects_whole_cues() {
        let strong = sig(EmotionLabel::Rage, 0.95);
        let weak = sig(EmotionLabel::Grief, 0.2);
        let mut collected: Vec<ExpressionCues> = Vec::new();
        receive_all([&strong, &weak], &mut collected);
        assert_eq!(collected, vec![interpret(&strong), interpret(&weak)]);
        assert_eq!(collected[0].aura.color, "#FF4500");
        assert_eq!(collected[1].aura.pattern, weak.symbolic_trace());
        assert_eq!(collected[1].whisper, None);

        // Lone per-cue hooks never fabricate or patch entries.
        collected.on_sigil_aura(&interpret(&strong).aura);
        collected.on_whisper("stray");
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[1].whisper, None);
    }

    #[test]
    fn traits_table_is_distinct_per_emotion() {
        let table: Vec<ExpressionTraits> = EmotionLabel::ALL.into_iter().map(traits).collect();
        for (i, a) in table.iter().enumerate() {
            assert!(a.aura.starts_with('#') && a.aura.len() == 7, "{}", a.aura);
            assert!(a.whisper.ends_with('…'));
            for b in &table[i + 1..] {
                assert_ne!(a.motion, b.motion);
                assert_ne!(a.aura, b.aura);
            }
        }
        assert_eq!(traits(EmotionLabel::Curiosity).motion, MotionKind::Tilt);
        assert_eq!(traits(EmotionLabel::Grief).aura, "#4169E1");
    }
}
