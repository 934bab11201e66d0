//! Resolved per-style item data, and the item folders it is read from.

use crate::editoritems::EditorItem;
use crate::error::{PackageError, Result};
use crate::fsys::{FsHandle, read_optional};
use crate::options::DiagnosticOptions;
use crate::parsed::{Warnings, get_config};
use crate::selitem::{join_desc, multiline};
use std::collections::{BTreeMap, BTreeSet};
use stylepak_types::{Keyvalues, ObjectId, sep_values};
use tracing::{debug, warn};

/// Data for an item in one style.
///
/// Variants are shared between styles once resolved and never edited in
/// place; [`ItemVariant::modify`] always builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemVariant {
    pub pak_id: ObjectId,
    pub editor: EditorItem,
    /// Extra editor blocks, such as offset catchers.
    pub editor_extra: Vec<EditorItem>,
    pub config: Keyvalues,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    pub desc: String,
    /// Icons keyed by subtype index, or `all` for the grouped icon.
    pub icons: BTreeMap<String, String>,
    pub ent_count: String,
    pub url: Option<String>,
    pub all_name: Option<String>,
    pub all_icon: Option<String>,
    /// Where the data came from, for messages.
    pub source: String,
}

impl ItemVariant {
    /// Grouping needs both the name and the icon.
    #[must_use]
    pub fn can_group(&self) -> bool {
        self.all_name.as_deref().is_some_and(|name| !name.is_empty()) && self.all_icon.is_some()
    }

    /// Applies a style patch block, returning the patched copy.
    pub fn modify(
        &self,
        fsys: &FsHandle,
        pak_id: &ObjectId,
        patch: &Keyvalues,
        source: &str,
    ) -> Result<ItemVariant> {
        let mut config = if patch.contains("config") {
            get_config(fsys, patch, "items", "config", ".cfg")?
        } else {
            self.config.clone()
        };
        if patch.contains("replace") {
            warn!(source, "Replace blocks in item patches are not supported, ignoring");
        }
        config.extend_from(&get_config(fsys, patch, "items", "append", ".cfg")?);

        let mut desc = if patch.contains("description") {
            multiline(patch, "description")
        } else {
            self.desc.clone()
        };
        if patch.contains("appenddesc") {
            desc = join_desc(&desc, &multiline(patch, "appenddesc"));
        }

        let mut variant = ItemVariant {
            pak_id: pak_id.clone(),
            editor: self.editor.clone(),
            editor_extra: self.editor_extra.clone(),
            config,
            authors: match patch.get("authors") {
                Some(authors) => sep_values(authors),
                None => self.authors.clone(),
            },
            tags: match patch.get("tags") {
                Some(tags) => sep_values(tags),
                None => self.tags.clone(),
            },
            desc,
            icons: self.icons.clone(),
            ent_count: patch.get_or("ent_count", &self.ent_count).to_string(),
            url: patch.get("url").map(str::to_string).or_else(|| self.url.clone()),
            all_name: self.all_name.clone(),
            all_icon: self.all_icon.clone(),
            source: format!("{source} from {}", self.source),
        };

        let mut editors = vec![std::mem::take(&mut variant.editor)];
        variant.modify_editoritems(patch, &mut editors, source, false)?;
        variant.editor = editors.pop().unwrap_or_default();

        if let Some(extra) = patch.find_key("extra") {
            let mut extras = std::mem::take(&mut variant.editor_extra);
            variant.modify_editoritems(extra, &mut extras, source, true)?;
            variant.editor_extra = extras;
        }
        Ok(variant)
    }

    /// Applies `Palette` and `Instances` edits to a set of editor blocks.
    fn modify_editoritems(
        &mut self,
        kv: &Keyvalues,
        editors: &mut [EditorItem],
        source: &str,
        is_extra: bool,
    ) -> Result<()> {
        // Subtypes are numbered across every block in order.
        let lookup: Vec<(usize, usize)> = editors
            .iter()
            .enumerate()
            .flat_map(|(item_ind, item)| {
                (0..item.subtypes.len()).map(move |sub_ind| (item_ind, sub_ind))
            })
            .collect();

        for pal in kv.find_children("Palette") {
            let pal_icon = pal.get("icon");
            let pal_name = pal.get("pal_name");
            let bee2_icon = pal.get("BEE2");

            if pal.is_named("all") {
                if is_extra {
                    return Err(PackageError::PaletteInExtra {
                        what: "\"all\"",
                        source_desc: source.to_string(),
                    });
                }
                if let Some(icon) = pal_icon {
                    self.all_icon = Some(icon.to_string());
                    self.icons.remove("all");
                }
                if let Some(name) = pal_name {
                    self.all_name = Some(name.to_string());
                }
                if let Some(icon) = bee2_icon {
                    self.icons.insert("all".to_string(), icon.to_string());
                }
                continue;
            }

            let invalid = || PackageError::InvalidSubtypeIndex {
                source_desc: source.to_string(),
                index: pal.real_name().to_string(),
            };
            let index: usize = pal.real_name().trim().parse().map_err(|_| invalid())?;
            let &(item_ind, sub_ind) = lookup.get(index).ok_or_else(invalid)?;
            let subtype = &mut editors[item_ind].subtypes[sub_ind];

            if pal.contains("models") || pal.contains("model") {
                subtype.models.clear();
                let models = pal
                    .children()
                    .iter()
                    .filter(|m| m.is_named("models") || m.is_named("model"));
                for model in models {
                    if model.has_children() {
                        subtype
                            .models
                            .extend(model.children().iter().map(|m| m.value().to_string()));
                    } else {
                        subtype.models.push(model.value().to_string());
                    }
                }
            }
            if let Some(name) = pal.get("name") {
                subtype.name = name.to_string();
            }

            let icon_key = pal.real_name().trim().to_string();
            if let Some(icon) = bee2_icon {
                if is_extra {
                    return Err(PackageError::PaletteInExtra {
                        what: "BEE2 icons",
                        source_desc: source.to_string(),
                    });
                }
                self.icons.insert(icon_key, icon.to_string());
            } else if pal_icon.is_some() {
                self.icons.remove(&icon_key);
            }

            if let Some(name) = pal_name {
                subtype.pal_name = Some(name.to_string());
            }
            if let Some(icon) = pal_icon {
                subtype.pal_icon = Some(icon.to_string());
            }
        }

        if kv.contains("Instances") {
            let [editor] = editors else {
                return Err(PackageError::InstancesForMultiple {
                    source_desc: source.to_string(),
                });
            };
            for inst in kv.find_children("Instances") {
                editor.add_instance(inst)?;
            }
        }
        Ok(())
    }
}

/// Reads the variant stored in `items/<folder>/`.
///
/// `editoritems.txt` must exist and hold at least one `Item` block; the
/// first is the item itself and the rest are extra blocks, which may not
/// carry palette data.
pub fn parse_item_folder(
    fsys: &FsHandle,
    pak_id: &ObjectId,
    item_id: &ObjectId,
    folder: &str,
    diagnostics: &DiagnosticOptions,
    warnings: &Warnings,
) -> Result<ItemVariant> {
    let prop_path = format!("items/{folder}/properties.txt");
    let editor_path = format!("items/{folder}/editoritems.txt");
    let config_path = format!("items/{folder}/vbsp_config.cfg");

    let editor_tree = match fsys.read_tree(&editor_path) {
        Ok(tree) => tree,
        Err(err) if err.is_not_found() => {
            return Err(PackageError::MissingFolder {
                pak_id: pak_id.clone(),
                folder: folder.to_string(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    let mut items =
        EditorItem::parse_file(&editor_tree, &format!("{pak_id}:{editor_path}"))?.into_iter();
    let Some(first) = items.next() else {
        return Err(PackageError::NoEditorItems {
            pak_id: pak_id.clone(),
            folder: folder.to_string(),
        });
    };
    if !item_id.matches(&first.id) {
        warn!(
            item = %item_id,
            editor_id = %first.id,
            "Item ID does not match {}:{}, info.txt ID will override",
            pak_id,
            editor_path,
        );
    }

    let mut extras: Vec<EditorItem> = items.collect();
    for extra in &mut extras {
        if extra.subtypes.iter().any(|sub| sub.pal_pos.is_some()) {
            let msg = format!(
                "\"{pak_id}:{editor_path}\" has palette set for extra item blocks, deleting"
            );
            warnings.push(pak_id, msg);
            for sub in &mut extra.subtypes {
                sub.strip_palette();
            }
        }
    }

    let props = read_optional(&**fsys, &prop_path)?
        .and_then(|tree| tree.find_key("Properties").cloned())
        .unwrap_or_else(Keyvalues::empty);

    let mut icons = BTreeMap::new();
    for icon in props.find_all("icon") {
        if icon.has_children() {
            for child in icon.children() {
                icons.insert(child.real_name().to_string(), child.value().to_string());
            }
        } else {
            icons.insert("0".to_string(), icon.value().to_string());
        }
    }

    let source = format!("<{pak_id}>/items/{folder}");
    let variant = ItemVariant {
        pak_id: pak_id.clone(),
        editor: first,
        editor_extra: extras,
        config: read_optional(&**fsys, &config_path)?.unwrap_or_else(Keyvalues::empty),
        authors: sep_values(props.get_or("authors", "")),
        tags: sep_values(props.get_or("tags", "")),
        desc: multiline(&props, "description"),
        icons,
        ent_count: props.get_or("ent_count", "").to_string(),
        url: props.get("infoURL").map(str::to_string),
        all_name: props.get("all_name").filter(|name| !name.is_empty()).map(str::to_string),
        // Written as PNG, but always really a VTF.
        all_icon: props.get("all_icon").map(with_vtf_extension),
        source,
    };

    if variant.ent_count.is_empty() && diagnostics.log_missing_ent_count {
        warn!(package = %pak_id, "\"{}:{}\" has missing entity count", pak_id, prop_path);
    }

    let has_name = variant.all_name.is_some();
    let has_icon = variant.all_icon.is_some();
    if (has_name || has_icon || variant.icons.contains_key("all")) && !(has_name && has_icon) {
        warnings.push(
            pak_id,
            format!("\"{pak_id}:{prop_path}\" has incomplete grouping icon definition"),
        );
    }
    debug!(package = %pak_id, folder, "Parsed item folder");
    Ok(variant)
}

/// Visible subtype indices, numbered from 1, used to check that all folders
/// of an item agree.
pub(crate) fn visible_subtypes(variant: &ItemVariant) -> BTreeSet<usize> {
    variant
        .editor
        .subtypes
        .iter()
        .enumerate()
        .filter(|(_, sub)| sub.is_visible())
        .map(|(ind, _)| ind + 1)
        .collect()
}

fn with_vtf_extension(path: &str) -> String {
    let stem_end = match (path.rfind('.'), path.rfind('/')) {
        (Some(dot), Some(slash)) if dot > slash => dot,
        (Some(dot), None) => dot,
        _ => path.len(),
    };
    format!("{}.vtf", &path[..stem_end])
}
