// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Emotion bloom → expression pipeline.
//!
//! Raw emotion intensities flow one way through a set of pure transforms:
//!
//! * [`calculator`] gates a bloom from phase momentum and emotional energy via
//!   the quadratic formula and boosts a caller-owned [`lattice`];
//! * [`expression`] maps intensities onto fixed per-emotion body channels;
//! * [`signature`] derives a symbolic trace and gradient for an
//!   `(emotion, resonance)` pair;
//! * [`aggregator`] compiles events into signatures, filters and summarises;
//! * [`receiver`] and [`emitter`] turn signatures and bloom state into cues and
//!   frames for rendering collaborators, and [`export`] bundles everything into
//!   one JSON document.
//!
//! Nothing here performs I/O or keeps process-wide state apart from the
//! optional [`telemetry`] subscriber and [`config`] file loading.

pub mod aggregator;
pub mod calculator;
pub mod config;
pub mod emitter;
pub mod emotion;
pub mod error;
pub mod export;
pub mod expression;
pub mod lattice;
pub mod receiver;
pub mod signature;
pub mod telemetry;

pub use aggregator::{
    compile_from_events, filter_significant, summarize, BloomAggregator, BloomDigest, BloomEvent,
    BloomSummary, EmotionTally, DEFAULT_SIGNIFICANCE,
};
pub use calculator::{
    apply_bloom, compute_bloom, BloomAura, BloomCalculator, BloomConfig, BloomResult,
};
pub use emitter::{export_file_name, ExpressionEmitter, ExpressionFrame};
pub use emotion::EmotionLabel;
pub use error::{BloomError, Result};
pub use export::{BloomDocument, ExportedExpression};
pub use expression::{
    channels, compute_expression, map_bloom_to_expression, BloomState, ChannelSpec,
    ExpressionVector, HexExpressionVector, HexLevel,
};
pub use lattice::{Lattice, LatticeCell};
pub use receiver::{interpret, receive, receive_all, ExpressionCues, ExpressionSink, MotionKind};
pub use signature::{derive_signature, BloomSignature, GradientVector, Sigil};
