// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::aggregator::{BloomDigest, BloomSummary};
use crate::calculator::BloomResult;
use crate::error::Result;
use crate::expression::{BloomState, ExpressionVector, HexExpressionVector};
use crate::signature::BloomSignature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Expression payload in either encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportedExpression {
    Hex(HexExpressionVector),
    Float(ExpressionVector),
}

/// JSON document bundling any mix of pipeline outputs for download or
/// archival. Absent sections are omitted from the output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomDocument {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_result: Option<BloomResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom: Option<BloomState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExportedExpression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<BloomSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<BloomSummary>,
}

impl BloomDocument {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            bloom_result: None,
            bloom: None,
            expression: None,
            signatures: Vec::new(),
            summary: None,
        }
    }

    pub fn with_bloom_result(mut self, result: BloomResult) -> Self {
        self.bloom_result = Some(result);
        self
    }

    pub fn with_bloom(mut self, bloom: BloomState) -> Self {
        self.bloom = Some(bloom);
        self
    }

    pub fn with_expression(mut self, expression: ExpressionVector) -> Self {
        self.expression = Some(ExportedExpression::Float(expression));
        self
    }

    pub fn with_hex_expression(mut self, expression: HexExpressionVector) -> Self {
        self.expression = Some(ExportedExpression::Hex(expression));
        self
    }

    pub fn with_digest(mut self, digest: BloomDigest) -> Self {
        self.signatures = digest.signatures;
        self.summary = Some(digest.summary);
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
