//! Assigns every item a concrete variant for every style.
//!
//! Runs once per item after all styles have their inheritance chains. Slots
//! are resolved version by version, the default version first, so that other
//! versions can borrow from it. Variants that are already resolved are
//! shared, never edited.

use crate::error::{PackageError, Result};
use crate::item::{
    DefaultStyle, InheritKind, Item, StyleRef, UnresolvedVariant, VariantSlot, VariantSource,
    Version,
};
use crate::options::DiagnosticOptions;
use crate::parsed::Warnings;
use crate::style::StyleChain;
use crate::variant::ItemVariant;
use std::collections::BTreeMap;
use std::sync::Arc;
use stylepak_types::ObjectId;
use tracing::debug;

/// Resolves all of an item's versions against the loaded styles.
///
/// `styles` gives every known style with its `bases`, in the order fallbacks
/// are assigned. Fallbacks are reported to `warnings` when `diagnostics`
/// asks for them. On failure the item is left untouched.
pub fn assign_styled_items(
    item: &mut Item,
    styles: &[StyleChain],
    diagnostics: &DiagnosticOptions,
    warnings: &Warnings,
) -> Result<()> {
    if !item.versions.contains_key(&item.def_ver) {
        return Err(PackageError::NoVersions(item.id.clone()));
    }
    let order: Vec<ObjectId> = std::iter::once(item.def_ver.clone())
        .chain(item.versions.keys().filter(|id| **id != item.def_ver).cloned())
        .collect();

    let mut done: BTreeMap<ObjectId, Version> = BTreeMap::new();
    for ver_id in &order {
        let Some(version) = item.versions.get(ver_id) else {
            continue;
        };
        let resolved = resolve_version(item, version, &done, styles, diagnostics, warnings)?;
        done.insert(ver_id.clone(), resolved);
    }

    item.visual_subtypes = done
        .get(&item.def_ver)
        .and_then(Version::default_variant)
        .map(|variant| {
            variant
                .editor
                .subtypes
                .iter()
                .enumerate()
                .filter(|(_, sub)| sub.pal_name.is_some() || sub.pal_icon.is_some())
                .map(|(ind, _)| ind)
                .collect()
        })
        .unwrap_or_default();
    item.version_id_order = done.keys().cloned().collect();
    item.versions = done;
    debug!(item = %item.id, versions = item.versions.len(), "Assigned styled items");
    Ok(())
}

fn resolve_version(
    item: &Item,
    version: &Version,
    done: &BTreeMap<ObjectId, Version>,
    all_styles: &[StyleChain],
    diagnostics: &DiagnosticOptions,
    warnings: &Warnings,
) -> Result<Version> {
    let mut resolved: BTreeMap<ObjectId, Arc<ItemVariant>> = BTreeMap::new();
    let mut to_change: Vec<(&ObjectId, &UnresolvedVariant)> = Vec::new();
    for (style_id, slot) in &version.styles {
        match slot {
            VariantSlot::Resolved(variant) => {
                resolved.insert(style_id.clone(), Arc::clone(variant));
            }
            VariantSlot::Unresolved(conf) => to_change.push((style_id, conf)),
        }
    }

    while !to_change.is_empty() {
        let mut deferred = Vec::new();
        for &(style_id, conf) in &to_change {
            let invalid = |target: String| PackageError::InvalidStyleRef {
                item: item.id.clone(),
                version: version.id.clone(),
                style: style_id.clone(),
                target,
            };
            let start = match &conf.source {
                VariantSource::Style(StyleRef::Local(target)) => match resolved.get(target) {
                    Some(variant) => Arc::clone(variant),
                    None if version.styles.contains_key(target) => {
                        deferred.push((style_id, conf));
                        continue;
                    }
                    None => return Err(invalid(target.to_string())),
                },
                VariantSource::Style(
                    style_ref @ StyleRef::Versioned {
                        version: ver_id,
                        style,
                    },
                ) => done
                    .get(ver_id)
                    .and_then(|other| other.styles.get(style))
                    .and_then(VariantSlot::resolved)
                    .cloned()
                    .ok_or_else(|| invalid(style_ref.to_string()))?,
                VariantSource::Folder(folder) => {
                    item.folder(&conf.pak_id, folder).cloned().ok_or_else(|| {
                        PackageError::MissingFolder {
                            pak_id: conf.pak_id.clone(),
                            folder: folder.clone(),
                        }
                    })?
                }
            };

            let variant = match &conf.patch {
                None => Arc::new(ItemVariant::clone(&start)),
                Some(patch) => {
                    let source = format!("<{}:{}.{}>", item.id, version.id, style_id);
                    Arc::new(start.modify(&conf.fsys, &conf.pak_id, patch, &source)?)
                }
            };
            resolved.insert(style_id.clone(), variant);
        }

        // Nothing progressed, so the references must form a loop.
        if deferred.len() == to_change.len() {
            let unresolved = deferred
                .iter()
                .map(|(style_id, conf)| match &conf.source {
                    VariantSource::Style(target) => format!("{target} -> {style_id}"),
                    VariantSource::Folder(folder) => format!("{folder} -> {style_id}"),
                })
                .collect();
            return Err(PackageError::StyleRefLoop {
                item: item.id.clone(),
                version: version.id.clone(),
                unresolved,
            });
        }
        to_change = deferred;
    }

    let default_style = match &version.def_style {
        DefaultStyle::Resolved(variant) => Arc::clone(variant),
        DefaultStyle::Pending(style_id) => {
            resolved.get(style_id).cloned().ok_or_else(|| PackageError::InvalidStyleRef {
                item: item.id.clone(),
                version: version.id.clone(),
                style: style_id.clone(),
                target: style_id.to_string(),
            })?
        }
    };

    // Fallbacks only come from styles this version actually has data for,
    // never from other fallbacks.
    let defined = resolved.clone();
    let mut inherit_kind = version.inherit_kind.clone();
    for chain in all_styles {
        if resolved.contains_key(&chain.id) {
            continue;
        }
        let parent = chain
            .bases
            .iter()
            .find_map(|base| defined.get(base).map(|variant| (base, Arc::clone(variant))));
        if let Some((base, variant)) = parent {
            if !item.unstyled && diagnostics.log_item_fallbacks {
                warnings.push(
                    &variant.pak_id,
                    format!(
                        "Item {}:{} using parent {base} for style {}",
                        item.id, version.id, chain.id
                    ),
                );
            }
            inherit_kind.insert(chain.id.clone(), InheritKind::Inherit);
            resolved.insert(chain.id.clone(), variant);
            continue;
        }

        if !item.unstyled && diagnostics.log_missing_styles {
            warnings.push(
                &default_style.pak_id,
                format!("Item {}:{} has no data for style {}", item.id, version.id, chain.id),
            );
        }
        let kind = if item.unstyled {
            InheritKind::Inherit
        } else {
            InheritKind::Unstyled
        };
        inherit_kind.insert(chain.id.clone(), kind);

        // The default version is resolved first and always isolated, so it
        // has an entry for every style by the time others get here.
        let variant = if item.isolate_versions || version.isolate {
            Arc::clone(&default_style)
        } else {
            done.get(&item.def_ver)
                .and_then(|def_ver| def_ver.styles.get(&chain.id))
                .and_then(VariantSlot::resolved)
                .cloned()
                .unwrap_or_else(|| Arc::clone(&default_style))
        };
        resolved.insert(chain.id.clone(), variant);
    }

    // Special ids can only be defaults or reference targets.
    let styles = resolved
        .into_iter()
        .filter(|(style_id, _)| !style_id.is_special())
        .map(|(style_id, variant)| (style_id, VariantSlot::Resolved(variant)))
        .collect();

    Ok(Version {
        id: version.id.clone(),
        name: version.name.clone(),
        isolate: version.isolate,
        styles,
        def_style: DefaultStyle::Resolved(default_style),
        inherit_kind,
    })
}
