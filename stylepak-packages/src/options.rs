//! Load options, read from `options.toml`.
//!
//! ```toml
//! [diagnostics]
//! log_item_fallbacks = true
//!
//! [content]
//! has_tag_music = true
//!
//! [packages]
//! BEE2_EXTRA_ITEMS = false
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use stylepak_types::ObjectId;
use tracing::{info, warn};

/// Optional warnings emitted during loading. None of them change behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticOptions {
    /// Warn when an item borrows a parent style's data.
    #[serde(default)]
    pub log_item_fallbacks: bool,
    /// Warn when an item has no applicable style data at all.
    #[serde(default)]
    pub log_missing_styles: bool,
    #[serde(default)]
    pub log_missing_ent_count: bool,
    /// Run extra consistency checks on resolved items.
    #[serde(default)]
    pub dev_mode: bool,
}

/// Which optional content the target game has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentOptions {
    #[serde(default)]
    pub has_tag_music: bool,
    #[serde(default)]
    pub has_mel_music: bool,
    /// Fail the load when a mandatory package is absent.
    #[serde(default)]
    pub require_mandatory: bool,
}

/// Persisted per-package enabled flags. Packages default to enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageConfig {
    enabled: BTreeMap<ObjectId, bool>,
}

impl PackageConfig {
    #[must_use]
    pub fn is_enabled(&self, pak_id: &ObjectId) -> bool {
        self.enabled.get(pak_id).copied().unwrap_or(true)
    }

    pub(crate) fn set(&mut self, pak_id: &ObjectId, enabled: bool) {
        self.enabled.insert(pak_id.clone(), enabled);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    #[serde(default)]
    pub diagnostics: DiagnosticOptions,
    #[serde(default)]
    pub content: ContentOptions,
    #[serde(default)]
    pub packages: PackageConfig,
}

impl LoadOptions {
    /// Loads options from a TOML file.
    /// A missing, unreadable or malformed file gives the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No options file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<LoadOptions>(&contents) {
                Ok(options) => {
                    info!("Loaded options from {:?}", path);
                    options
                }
                Err(e) => {
                    warn!("Failed to parse options file {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read options file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Serializes the options back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}
