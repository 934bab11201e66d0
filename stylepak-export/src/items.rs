//! Flattening resolved items into the exported definitions.

use crate::error::{ExportError, Result};
use crate::replace::apply_replacements;
use crate::selection::{ExportSelection, ItemDefault};
use std::collections::BTreeMap;
use stylepak_packages::{
    EditorItem, Item, ItemConfig, ItemVariant, ObjectType, PackagesSet, PakObjectKind, Style,
    Version,
};
use stylepak_types::{Keyvalues, ObjectId};
use tracing::{debug, info, warn};

/// One item's share of the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedItem {
    pub item_id: ObjectId,
    /// The chosen version, after any fallback.
    pub version: ObjectId,
    /// The item's own block first, then its extra blocks.
    pub editor: Vec<EditorItem>,
    /// This item's config, with variables filled in.
    pub config: Keyvalues,
}

/// The result of an export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// Every loaded item, sorted by id.
    pub items: Vec<ExportedItem>,
    /// The style's config followed by every item's config.
    pub config: Keyvalues,
    pub warnings: Vec<String>,
}

impl ExportOutput {
    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&ExportedItem> {
        let item_id = ObjectId::new(item_id);
        self.items.iter().find(|item| item.item_id == item_id)
    }

    /// Every editor block, in export order.
    pub fn editor_items(&self) -> impl Iterator<Item = &EditorItem> {
        self.items.iter().flat_map(|item| item.editor.iter())
    }
}

/// Builds the export for the selected style, palette and item choices.
///
/// Every item is exported, whether or not it is on the palette. Items off
/// the palette keep their definitions but lose all palette data.
pub fn export_items(packset: &PackagesSet, selection: &ExportSelection) -> Result<ExportOutput> {
    let style = packset
        .by_id::<Style>(selection.style.as_str())
        .ok_or_else(|| ExportError::UnknownStyle(selection.style.clone()))?;

    let mut warnings = Vec::new();
    let palette = selection.palette_positions(&mut warnings);
    for item_id in palette.keys() {
        if packset.by_id::<Item>(item_id.as_str()).is_none() {
            warn!(item = %item_id, "Palette refers to an unknown item");
            warnings.push(format!("Palette refers to unknown item {item_id}"));
        }
    }

    let no_slots = BTreeMap::new();
    let no_prefs = ItemDefault::default();
    let mut config = style.config.clone();
    let mut exported = Vec::with_capacity(packset.count(ObjectType::Item));

    // Sorted by id.
    for item in packset.all::<Item>() {
        let prefs = selection.defaults.get(item.id()).unwrap_or(&no_prefs);
        let slots = palette.get(item.id()).unwrap_or(&no_slots);
        let export = export_item(packset, item, style, slots, prefs, &mut warnings)?;
        config.extend_from(&export.config);
        exported.push(export);
    }

    info!(
        style = %style.id(),
        items = exported.len(),
        palette = selection.palette.len(),
        "Exported items"
    );
    Ok(ExportOutput {
        items: exported,
        config,
        warnings,
    })
}

fn export_item(
    packset: &PackagesSet,
    item: &Item,
    style: &Style,
    slots: &BTreeMap<usize, (u32, u32)>,
    prefs: &ItemDefault,
    warnings: &mut Vec<String>,
) -> Result<ExportedItem> {
    let version = chosen_version(item, prefs, warnings)?;
    let variant = version.variant(style.id()).ok_or_else(|| ExportError::MissingVariant {
        item: item.id().clone(),
        version: version.id.clone(),
        style: style.id().clone(),
    })?;
    debug!(item = %item.id(), version = %version.id, source = %variant.source, "Exporting item");

    let mut editor = variant.editor.clone();
    editor.id = item.id().to_string();
    stamp_palette(&mut editor, item, variant, slots, warnings);
    apply_user_defaults(&mut editor, item.id(), &prefs.defaults, warnings);

    let mut editors = vec![editor];
    editors.extend(variant.editor_extra.iter().cloned());

    // The shared config goes first so its conditions run first.
    let mut config =
        apply_replacements(&item.all_conf.concat(&variant.config), item.id().as_str())?;

    if let Some(aux) = packset.by_id::<ItemConfig>(item.id().as_str()) {
        let aux_all = apply_replacements(&aux.all_conf, &format!("{}:aux_all", item.id()))?;
        config.extend_from(&aux_all);
        if let Some(aux_conf) = aux.config_for(&version.id, style.bases()) {
            config.extend_from(&apply_replacements(aux_conf, &format!("{}:aux", item.id()))?);
        }
    }

    Ok(ExportedItem {
        item_id: item.id().clone(),
        version: version.id.clone(),
        editor: editors,
        config,
    })
}

/// The version the user picked, or the default when the choice is gone.
fn chosen_version<'a>(
    item: &'a Item,
    prefs: &ItemDefault,
    warnings: &mut Vec<String>,
) -> Result<&'a Version> {
    if let Some(choice) = prefs.version.as_deref() {
        if let Some(version) = item.version(choice) {
            return Ok(version);
        }
        warn!(item = %item.id(), version = choice, "Version ID is not valid for item");
        warnings.push(format!("Version ID {choice} is not valid for item {}", item.id()));
    }
    item.default_version()
        .ok_or_else(|| ExportError::NoDefaultVersion(item.id().clone()))
}

fn stamp_palette(
    editor: &mut EditorItem,
    item: &Item,
    variant: &ItemVariant,
    slots: &BTreeMap<usize, (u32, u32)>,
    warnings: &mut Vec<String>,
) {
    // A single slot of a multi-subtype item shows the grouped version.
    let grouped = slots.len() == 1 && item.visual_subtypes().len() > 1 && variant.can_group();

    for (index, subtype) in editor.subtypes.iter_mut().enumerate() {
        match slots.get(&index) {
            Some(&pos) => {
                if grouped {
                    subtype.pal_name = variant.all_name.clone();
                    subtype.pal_icon = variant.all_icon.clone();
                }
                subtype.pal_pos = Some(pos);
            }
            None => subtype.strip_palette(),
        }
    }

    for &index in slots.keys().filter(|&&index| index >= editor.subtypes.len()) {
        warn!(item = %item.id(), subtype = index, "Palette slot refers to a missing subtype");
        warnings.push(format!("Item {} has no subtype {index}", item.id()));
    }
}

fn apply_user_defaults(
    editor: &mut EditorItem,
    item_id: &ObjectId,
    defaults: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) {
    for (name, value) in defaults {
        match editor.property_mut(name) {
            Some(prop) if prop.allow_user_default => prop.default = value.clone(),
            Some(_) => {
                warn!(item = %item_id, property = %name, "Property does not allow user defaults");
                warnings.push(format!(
                    "Property {name} of item {item_id} does not allow user defaults"
                ));
            }
            None => {
                warn!(item = %item_id, property = %name, "Unknown property in item defaults");
                warnings.push(format!("Item {item_id} has no property {name}"));
            }
        }
    }
}
