// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! `base.toml` → `site.toml` → `run.json` stacking for the bloom pipeline.
//!
//! Every layer is optional. Tables merge key by key; any other value in a
//! later layer replaces the earlier one wholesale. Each replaced leaf is
//! recorded as a [`ConfigDiffEvent`] so callers can see which layer won.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const ROOT_ENV: &str = "BLOOM_CONFIG_ROOT";

/// Layer a configuration value came from, lowest precedence first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLayer {
    Base,
    Site,
    Run,
}

impl ConfigLayer {
    pub const ORDER: [ConfigLayer; 3] = [ConfigLayer::Base, ConfigLayer::Site, ConfigLayer::Run];

    /// File looked up under the config root.
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigLayer::Base => "base.toml",
            ConfigLayer::Site => "site.toml",
            ConfigLayer::Run => "run.json",
        }
    }

    /// Variable that points this layer at an explicit file.
    pub fn env_var(self) -> &'static str {
        match self {
            ConfigLayer::Base => "BLOOM_CONFIG_BASE",
            ConfigLayer::Site => "BLOOM_CONFIG_SITE",
            ConfigLayer::Run => "BLOOM_CONFIG_RUN",
        }
    }

    fn is_json(self) -> bool {
        matches!(self, ConfigLayer::Run)
    }
}

/// A leaf that a layer introduced, replaced or removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigDiffEvent {
    pub layer: ConfigLayer,
    pub path: String,
    pub previous: Option<Value>,
    pub current: Option<Value>,
}

/// Paths of the layers to stack; `None` skips a layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigLayering {
    pub base: Option<PathBuf>,
    pub site: Option<PathBuf>,
    pub run: Option<PathBuf>,
}

impl ConfigLayering {
    /// Resolves layers under `BLOOM_CONFIG_ROOT`, falling back to
    /// `~/.spiraltorch/bloom`. Files that do not exist are dropped.
    pub fn discover() -> Self {
        let root = match std::env::var_os(ROOT_ENV) {
            Some(root) => PathBuf::from(root),
            None => default_root(),
        };
        Self::discover_in(root)
    }

    /// Resolves layers under `root`. Per-layer environment overrides still win.
    pub fn discover_in(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let mut layering = ConfigLayering::default();
        for layer in ConfigLayer::ORDER {
            let candidate = std::env::var_os(layer.env_var())
                .map(PathBuf::from)
                .unwrap_or_else(|| root.join(layer.file_name()));
            if candidate.is_file() {
                *layering.slot_mut(layer) = Some(candidate);
            }
        }
        layering
    }

    pub fn with_base<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.base = Some(path.into());
        self
    }

    pub fn with_site<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.site = Some(path.into());
        self
    }

    pub fn with_run<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.run = Some(path.into());
        self
    }

    pub fn path(&self, layer: ConfigLayer) -> Option<&Path> {
        match layer {
            ConfigLayer::Base => self.base.as_deref(),
            ConfigLayer::Site => self.site.as_deref(),
            ConfigLayer::Run => self.run.as_deref(),
        }
    }

    fn slot_mut(&mut self, layer: ConfigLayer) -> &mut Option<PathBuf> {
        match layer {
            ConfigLayer::Base => &mut self.base,
            ConfigLayer::Site => &mut self.site,
            ConfigLayer::Run => &mut self.run,
        }
    }
}

fn default_root() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".spiraltorch").join("bloom"),
        None => PathBuf::from("."),
    }
}

/// Merged view of every layer that was present.
#[derive(Clone, Debug)]
pub struct LayeredConfig {
    layering: ConfigLayering,
    value: Value,
    events: Vec<ConfigDiffEvent>,
}

impl LayeredConfig {
    pub fn load(layering: ConfigLayering) -> Result<Self, LayeredConfigError> {
        let mut value = Value::Object(Map::new());
        let mut events = Vec::new();

        for layer in ConfigLayer::ORDER {
            let Some(path) = layering.path(layer) else {
                continue;
            };
            let Some(overlay) = read_layer(layer, path)? else {
                continue;
            };
            let mut cursor = String::new();
            overlay_value(&mut value, overlay, layer, &mut cursor, &mut events);
        }

        for event in &events {
            debug!(
                layer = ?event.layer,
                path = %event.path,
                previous = ?event.previous,
                current = ?event.current,
                "bloom config override"
            );
        }

        Ok(Self {
            layering,
            value,
            events,
        })
    }

    /// No layers at all; every section reads as absent.
    pub fn empty() -> Self {
        Self {
            layering: ConfigLayering::default(),
            value: Value::Object(Map::new()),
            events: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn layering(&self) -> &ConfigLayering {
        &self.layering
    }

    pub fn events(&self) -> &[ConfigDiffEvent] {
        &self.events
    }

    /// Deserialises the table at `path`, `None` when any key is missing.
    pub fn section<T>(&self, path: &[&str]) -> Result<Option<T>, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        path.iter()
            .try_fold(&self.value, |node, key| node.as_object()?.get(*key))
            .map(|node| T::deserialize(node))
            .transpose()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayeredConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_layer(layer: ConfigLayer, path: &Path) -> Result<Option<Value>, LayeredConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let owned = || path.to_path_buf();
    let text = fs::read_to_string(path).map_err(|source| LayeredConfigError::Io {
        path: owned(),
        source,
    })?;
    let parsed = if layer.is_json() {
        serde_json::from_str(&text).map_err(|source| LayeredConfigError::Json {
            path: owned(),
            source,
        })?
    } else {
        let table: toml::Table = toml::from_str(&text).map_err(|source| LayeredConfigError::Toml {
            path: owned(),
            source,
        })?;
        serde_json::to_value(table).map_err(|source| LayeredConfigError::Json {
            path: owned(),
            source,
        })?
    };
    Ok(Some(parsed))
}

/// Folds `overlay` into `slot`, logging every leaf that changes.
fn overlay_value(
    slot: &mut Value,
    overlay: Value,
    layer: ConfigLayer,
    cursor: &mut String,
    events: &mut Vec<ConfigDiffEvent>,
) {
    match (slot, overlay) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, child) in incoming {
                let mark = cursor.len();
                if !cursor.is_empty() {
                    cursor.push('.');
                }
                cursor.push_str(&key);
                match current.get_mut(&key) {
                    Some(existing) => overlay_value(existing, child, layer, cursor, events),
                    None => {
                        record_leaves(None, Some(&child), layer, cursor, events);
                        current.insert(key, child);
                    }
                }
                cursor.truncate(mark);
            }
        }
        (slot, overlay) => {
            if *slot != overlay {
                record_leaves(Some(&*slot), Some(&overlay), layer, cursor, events);
                *slot = overlay;
            }
        }
    }
}

/// Emits one event per differing leaf between `previous` and `current`.
fn record_leaves(
    previous: Option<&Value>,
    current: Option<&Value>,
    layer: ConfigLayer,
    cursor: &mut String,
    events: &mut Vec<ConfigDiffEvent>,
) {
    if previous == current {
        return;
    }
    let tables = (
        previous.and_then(Value::as_object),
        current.and_then(Value::as_object),
    );
    let descend = match tables {
        (Some(_), Some(_)) => true,
        (Some(_), None) => current.is_none(),
        (None, Some(_)) => previous.is_none(),
        (None, None) => false,
    };
    if !descend {
        events.push(ConfigDiffEvent {
            layer,
            path: cursor.clone(),
            previous: previous.cloned(),
            current: current.cloned(),
        });
        return;
    }

    let empty = Map::new();
    let before = tables.0.unwrap_or(&empty);
    let after = tables.1.unwrap_or(&empty);
    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();
    for key in keys {
        let mark = cursor.len();
        if !cursor.is_empty() {
            cursor.push('.');
        }
        cursor.push_str(key);
        record_leaves(before.get(key), after.get(key), layer, cursor, events);
        cursor.truncate(mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stacks_layers_and_tracks_overrides() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("base.toml"),
            "[bloom]\ndrag = 1.0\nthreshold = 0.7\n",
        )
        .unwrap();
        fs::write(
            root.path().join("site.toml"),
            "[bloom]\nthreshold = 0.6\nboost = 0.1\n",
        )
        .unwrap();
        fs::write(root.path().join("run.json"), r#"{"bloom":{"drag":2.5}}"#).unwrap();

        let layering = ConfigLayering::discover_in(root.path());
        for layer in ConfigLayer::ORDER {
            assert!(layering.path(layer).is_some(), "{layer:?}");
        }
        let stacked = LayeredConfig::load(layering).unwrap();

        let bloom: Value = stacked.section(&["bloom"]).unwrap().unwrap();
        assert_eq!(bloom["drag"], 2.5);
        assert_eq!(bloom["threshold"], 0.6);
        assert_eq!(bloom["boost"], 0.1);

        let events = stacked.events();
        let find = |layer: ConfigLayer, path: &str| {
            events.iter().find(|e| e.layer == layer && e.path == path)
        };
        let base_drag = find(ConfigLayer::Base, "bloom.drag").unwrap();
        assert_eq!(base_drag.previous, None);
        let run_drag = find(ConfigLayer::Run, "bloom.drag").unwrap();
        assert_eq!(run_drag.previous, Some(Value::from(1.0)));
        assert_eq!(run_drag.current, Some(Value::from(2.5)));
        let site_boost = find(ConfigLayer::Site, "bloom.boost").unwrap();
        assert_eq!(site_boost.previous, None);
        assert!(find(ConfigLayer::Site, "bloom.drag").is_none());
    }

    #[test]
    fn scalar_replacing_a_table_is_a_single_override() {
        let root = tempdir().unwrap();
        let base = root.path().join("base.toml");
        let run = root.path().join("run.json");
        fs::write(&base, "[emitter]\nupdate_rate_ms = 500\n").unwrap();
        fs::write(&run, r#"{"emitter": 7}"#).unwrap();
        let layering = ConfigLayering::default().with_base(&base).with_run(&run);
        let stacked = LayeredConfig::load(layering).unwrap();
        assert_eq!(stacked.value()["emitter"], 7);
        let run_event = stacked
            .events()
            .iter()
            .find(|e| e.layer == ConfigLayer::Run)
            .unwrap();
        assert_eq!(run_event.path, "emitter");
        assert_eq!(run_event.current, Some(Value::from(7)));
    }

    #[test]
    fn missing_layers_are_skipped() {
        let root = tempdir().unwrap();
        let missing = root.path().join("nope.toml");
        let layering = ConfigLayering::default().with_base(missing);
        let stacked = LayeredConfig::load(layering).unwrap();
        assert!(stacked.events().is_empty());
        assert_eq!(stacked.section::<Value>(&["bloom"]).unwrap(), None);
        assert_eq!(stacked.section::<Value>(&["bloom", "drag"]).unwrap(), None);
    }

    #[test]
    fn malformed_toml_is_reported_with_its_path() {
        let root = tempdir().unwrap();
        let base = root.path().join("base.toml");
        fs::write(&base, "[bloom\ndrag = ").unwrap();
        let layering = ConfigLayering::default().with_base(&base);
        match LayeredConfig::load(layering).unwrap_err() {
            LayeredConfigError::Toml { path, .. } => assert_eq!(path, base),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
