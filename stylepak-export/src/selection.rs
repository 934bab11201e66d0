//! The user's choices going into an export.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use stylepak_types::ObjectId;
use tracing::{info, warn};

/// Number of slots in the editor palette.
pub const PALETTE_SIZE: usize = 32;
/// Slots per palette row.
pub const PALETTE_WIDTH: usize = 4;

/// Palette positions per item, keyed by subtype index.
pub type PalettePositions = BTreeMap<ObjectId, BTreeMap<usize, (u32, u32)>>;

/// Per-item choices remembered between exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefault {
    /// Chosen version id. `None` uses the item's default version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Property name to value.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

/// Stored [`ItemDefault`]s for every item the user has configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefaults {
    #[serde(default)]
    pub items: BTreeMap<ObjectId, ItemDefault>,
}

impl ItemDefaults {
    /// Loads item defaults from a TOML file.
    /// A missing, unreadable or malformed file gives an empty set.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No item defaults found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ItemDefaults>(&contents) {
                Ok(defaults) => {
                    info!(items = defaults.items.len(), "Loaded item defaults from {:?}", path);
                    defaults
                }
                Err(e) => {
                    warn!("Failed to parse item defaults {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read item defaults {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// The stored choices for an item, if any.
    #[must_use]
    pub fn get(&self, item_id: &ObjectId) -> Option<&ItemDefault> {
        self.items.get(item_id)
    }

    pub fn set(&mut self, item_id: impl Into<ObjectId>, default: ItemDefault) {
        self.items.insert(item_id.into(), default);
    }
}

/// Everything the user picked for one export.
#[derive(Debug, Clone)]
pub struct ExportSelection {
    pub style: ObjectId,
    /// `(item, subtype index)` pairs in palette order.
    pub palette: Vec<(ObjectId, usize)>,
    pub defaults: ItemDefaults,
}

impl ExportSelection {
    pub fn new(style: impl Into<ObjectId>) -> Self {
        Self {
            style: style.into(),
            palette: Vec::new(),
            defaults: ItemDefaults::default(),
        }
    }

    /// Appends a palette slot.
    #[must_use]
    pub fn with_slot(mut self, item_id: impl Into<ObjectId>, subtype: usize) -> Self {
        self.palette.push((item_id.into(), subtype));
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: ItemDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Lays the palette out on the grid, row by row.
    ///
    /// Slots past [`PALETTE_SIZE`] and repeats of an earlier slot are dropped,
    /// with a message pushed to `warnings`.
    pub fn palette_positions(&self, warnings: &mut Vec<String>) -> PalettePositions {
        let mut positions = PalettePositions::new();
        let mut seen = BTreeSet::new();
        let mut index = 0;

        for (item_id, subtype) in &self.palette {
            if !seen.insert((item_id.clone(), *subtype)) {
                warn!(item = %item_id, subtype, "Duplicate palette slot");
                warnings.push(format!(
                    "Palette slot {item_id}:{subtype} is listed twice, ignoring the repeat"
                ));
                continue;
            }
            if index >= PALETTE_SIZE {
                warn!(item = %item_id, subtype, "Palette is full");
                warnings.push(format!(
                    "Palette slot {item_id}:{subtype} does not fit in {PALETTE_SIZE} slots"
                ));
                continue;
            }
            let pos = ((index % PALETTE_WIDTH) as u32, (index / PALETTE_WIDTH) as u32);
            positions.entry(item_id.clone()).or_default().insert(*subtype, pos);
            index += 1;
        }
        positions
    }
}
