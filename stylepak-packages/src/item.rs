//! Items, their versions, and the per-style slots resolved after loading.

use crate::error::{PackageError, Result};
use crate::fsys::FsHandle;
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::{ParseData, get_config};
use crate::selitem::multiline;
use crate::variant::{ItemVariant, parse_item_folder, visible_subtypes};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use stylepak_types::{Keyvalues, ObjectId};
use tracing::{debug, warn};

/// Version id used when a version block has none.
pub const DEFAULT_VERSION: &str = "VER_DEFAULT";

const DEFAULT_VERSION_NAME: &str = "Regular";

/// How a style slot got its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InheritKind {
    /// Read directly from a folder.
    Defined,
    /// Another style, patched.
    Modified,
    /// Another style's data as is, through `<STYLE>`.
    Reused,
    /// Borrowed from a parent style.
    Inherit,
    /// No matching style, the default was used.
    Unstyled,
}

impl fmt::Display for InheritKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Defined => "defined",
            Self::Modified => "modified",
            Self::Reused => "reused",
            Self::Inherit => "inherit",
            Self::Unstyled => "unstyled",
        })
    }
}

/// A reference to another style's data, in this version or another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleRef {
    Local(ObjectId),
    /// Written `VERSION:STYLE`.
    Versioned { version: ObjectId, style: ObjectId },
}

impl StyleRef {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value.split_once(':') {
            Some((version, style)) => Self::Versioned {
                version: ObjectId::parse(version)?,
                style: ObjectId::parse(style)?,
            },
            None => Self::Local(ObjectId::parse(value)?),
        })
    }
}

impl fmt::Display for StyleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(style) => write!(f, "{style}"),
            Self::Versioned { version, style } => write!(f, "{version}:{style}"),
        }
    }
}

/// Where an unresolved slot takes its starting data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSource {
    Folder(String),
    Style(StyleRef),
}

/// A style slot as declared, before resolution.
#[derive(Debug, Clone)]
pub struct UnresolvedVariant {
    pub pak_id: ObjectId,
    pub fsys: FsHandle,
    pub source: VariantSource,
    /// Applied with [`ItemVariant::modify`] once the source is known.
    pub patch: Option<Keyvalues>,
}

#[derive(Debug, Clone)]
pub enum VariantSlot {
    Unresolved(UnresolvedVariant),
    Resolved(Arc<ItemVariant>),
}

impl VariantSlot {
    #[must_use]
    pub fn resolved(&self) -> Option<&Arc<ItemVariant>> {
        match self {
            Self::Resolved(variant) => Some(variant),
            Self::Unresolved(_) => None,
        }
    }
}

/// The style used when a version has no data for the selected one.
#[derive(Debug, Clone)]
pub enum DefaultStyle {
    /// The first style declared, not looked up yet.
    Pending(ObjectId),
    Resolved(Arc<ItemVariant>),
}

#[derive(Debug, Clone)]
pub struct Version {
    pub id: ObjectId,
    pub name: String,
    /// Isolated versions never borrow from the default version.
    pub isolate: bool,
    pub styles: BTreeMap<ObjectId, VariantSlot>,
    pub def_style: DefaultStyle,
    pub inherit_kind: BTreeMap<ObjectId, InheritKind>,
}

impl Version {
    /// The variant for a style, or the default style's.
    #[must_use]
    pub fn variant(&self, style: &ObjectId) -> Option<&Arc<ItemVariant>> {
        match self.styles.get(style) {
            Some(VariantSlot::Resolved(variant)) => Some(variant),
            _ => self.default_variant(),
        }
    }

    #[must_use]
    pub fn default_variant(&self) -> Option<&Arc<ItemVariant>> {
        match &self.def_style {
            DefaultStyle::Resolved(variant) => Some(variant),
            DefaultStyle::Pending(_) => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.def_style, DefaultStyle::Resolved(_))
            && self.styles.values().all(|slot| slot.resolved().is_some())
    }
}

/// An item in the editor palette.
#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) id: ObjectId,
    pub(crate) versions: BTreeMap<ObjectId, Version>,
    pub(crate) def_ver: ObjectId,
    /// Never borrow missing styles from the default version.
    pub isolate_versions: bool,
    /// Unstyled items use the same data for every style, quietly.
    pub unstyled: bool,
    pub needs_unlock: bool,
    pub glob_desc: String,
    /// Put the global description after the variant's own.
    pub desc_last: bool,
    pub all_conf: Keyvalues,
    pub(crate) folders: BTreeMap<(ObjectId, String), Arc<ItemVariant>>,
    pub(crate) version_id_order: Vec<ObjectId>,
    pub(crate) visual_subtypes: Vec<usize>,
}

impl Item {
    #[must_use]
    pub fn versions(&self) -> &BTreeMap<ObjectId, Version> {
        &self.versions
    }

    #[must_use]
    pub fn version(&self, id: &str) -> Option<&Version> {
        self.versions.get(&ObjectId::new(id))
    }

    /// Mutable access for attaching data to a version after resolution.
    /// Slots set here are kept as they are when the item is resolved again.
    pub fn version_mut(&mut self, id: &str) -> Option<&mut Version> {
        self.versions.get_mut(&ObjectId::new(id))
    }

    /// Id of the first version declared.
    #[must_use]
    pub fn def_ver_id(&self) -> &ObjectId {
        &self.def_ver
    }

    #[must_use]
    pub fn default_version(&self) -> Option<&Version> {
        self.versions.get(&self.def_ver)
    }

    /// A parsed folder, by owning package and folder name.
    #[must_use]
    pub fn folder(&self, pak_id: &ObjectId, folder: &str) -> Option<&Arc<ItemVariant>> {
        self.folders.get(&(pak_id.clone(), folder.to_lowercase()))
    }

    /// Version ids in display order.
    #[must_use]
    pub fn version_id_order(&self) -> &[ObjectId] {
        &self.version_id_order
    }

    /// Subtype indices shown in the palette UI.
    #[must_use]
    pub fn visual_subtypes(&self) -> &[usize] {
        &self.visual_subtypes
    }

    /// The version for a user choice. Unknown choices fall back to the
    /// default version.
    #[must_use]
    pub fn selected_version(&self, choice: &str) -> Option<&Version> {
        match self.version(choice) {
            Some(version) => Some(version),
            None => {
                warn!(item = %self.id, version = choice, "Version ID is not valid for item");
                self.default_version()
            }
        }
    }

    /// The variant shown for a style, under the chosen version.
    #[must_use]
    pub fn variant(&self, style: &ObjectId, choice: &str) -> Option<&Arc<ItemVariant>> {
        self.selected_version(choice)?.variant(style)
    }

    /// Version ids and names to offer for a style.
    ///
    /// When every version shares one variant for this style, only the first
    /// is returned.
    #[must_use]
    pub fn get_version_names(&self, style: &ObjectId) -> (Vec<ObjectId>, Vec<String>) {
        let variants: Vec<&Arc<ItemVariant>> = self
            .version_id_order
            .iter()
            .filter_map(|ver_id| self.versions.get(ver_id)?.variant(style))
            .collect();
        let all_same = variants
            .split_first()
            .is_some_and(|(first, rest)| rest.iter().all(|other| Arc::ptr_eq(first, other)));

        let count = if all_same { 1 } else { self.version_id_order.len() };
        let ids: Vec<ObjectId> = self.version_id_order.iter().take(count).cloned().collect();
        let names = ids
            .iter()
            .filter_map(|ver_id| self.versions.get(ver_id))
            .map(|version| version.name.clone())
            .collect();
        (ids, names)
    }

    fn parse_style(
        data: &ParseData<'_>,
        version: &ObjectId,
        style_id: &ObjectId,
        style: &Keyvalues,
    ) -> Result<(UnresolvedVariant, InheritKind)> {
        let (source, patch, kind) = if style.has_children() {
            let folder = style.get("folder").filter(|folder| !folder.is_empty());
            let base = match style.get("base") {
                Some(base) if !base.trim().is_empty() => Some(StyleRef::parse(base)?),
                _ => None,
            };
            let source = match (folder, base) {
                (Some(_), Some(_)) => {
                    return Err(PackageError::BothFolderAndStyle {
                        item: data.id.clone(),
                        version: version.clone(),
                        style: style_id.clone(),
                    });
                }
                (Some(folder), None) => VariantSource::Folder(folder.to_string()),
                (None, Some(base)) => VariantSource::Style(base),
                (None, None) => {
                    return Err(PackageError::NoDataSource {
                        item: data.id.clone(),
                        version: version.clone(),
                        style: style_id.clone(),
                    });
                }
            };
            (source, Some(style.clone()), InheritKind::Modified)
        } else {
            let value = style.value();
            if let Some(inner) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
                (VariantSource::Style(StyleRef::parse(inner)?), None, InheritKind::Reused)
            } else if value.is_empty() {
                return Err(PackageError::NoDataSource {
                    item: data.id.clone(),
                    version: version.clone(),
                    style: style_id.clone(),
                });
            } else {
                (VariantSource::Folder(value.to_string()), None, InheritKind::Defined)
            }
        };

        if source == VariantSource::Style(StyleRef::Local(style_id.clone())) {
            return Err(PackageError::SelfInheritance {
                item: data.id.clone(),
                style: style_id.clone(),
            });
        }

        let variant = UnresolvedVariant {
            pak_id: data.pak_id.clone(),
            fsys: data.fsys.clone(),
            source,
            patch,
        };
        Ok((variant, kind))
    }
}

impl PakObjectKind for Item {
    const TYPE: ObjectType = ObjectType::Item;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let info = data.info;
        let mut versions: BTreeMap<ObjectId, Version> = BTreeMap::new();
        let mut def_ver: Option<ObjectId> = None;
        let mut folder_names: BTreeSet<String> = BTreeSet::new();

        for ver in info.find_all("version") {
            let ver_id = ObjectId::parse(ver.get_or("ID", DEFAULT_VERSION))?;
            if versions.contains_key(&ver_id) {
                return Err(PackageError::DuplicateVersion {
                    item: data.id.clone(),
                    version: ver_id,
                });
            }

            let mut styles = BTreeMap::new();
            let mut inherit_kind = BTreeMap::new();
            let mut def_style: Option<ObjectId> = None;
            for style in ver.find_children("styles") {
                let style_id = ObjectId::parse(style.real_name())?;
                let (variant, kind) = Self::parse_style(data, &ver_id, &style_id, style)?;
                if let VariantSource::Folder(folder) = &variant.source {
                    folder_names.insert(folder.clone());
                }
                def_style.get_or_insert_with(|| style_id.clone());
                inherit_kind.insert(style_id.clone(), kind);
                styles.insert(style_id, VariantSlot::Unresolved(variant));
            }
            let Some(def_style) = def_style else {
                return Err(PackageError::EmptyVersion {
                    item: data.id.clone(),
                    version: ver_id,
                });
            };

            // The first version is the default, and is always isolated.
            let is_default = def_ver.is_none();
            if is_default {
                def_ver = Some(ver_id.clone());
            }
            versions.insert(
                ver_id.clone(),
                Version {
                    id: ver_id,
                    name: ver.get_or("name", DEFAULT_VERSION_NAME).to_string(),
                    isolate: is_default || ver.bool("isolated", false),
                    styles,
                    def_style: DefaultStyle::Pending(def_style),
                    inherit_kind,
                },
            );
        }
        let Some(def_ver) = def_ver else {
            return Err(PackageError::NoVersions(data.id.clone()));
        };

        let mut folders = BTreeMap::new();
        for folder in &folder_names {
            let variant = parse_item_folder(
                data.fsys,
                data.pak_id,
                data.id,
                folder,
                &data.options.diagnostics,
                data.warnings,
            )?;
            folders.insert((data.pak_id.clone(), folder.to_lowercase()), Arc::new(variant));
        }

        let subtype_sets: BTreeSet<BTreeSet<usize>> =
            folders.values().map(|v| visible_subtypes(v)).collect();
        if subtype_sets.len() > 1 {
            let counts = subtype_sets
                .iter()
                .map(|set| format!("{set:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PackageError::InconsistentSubtypes {
                item: data.id.clone(),
                counts,
            });
        }
        debug!(item = %data.id, versions = versions.len(), folders = folders.len(), "Parsed item");

        Ok(Self {
            id: data.id.clone(),
            versions,
            def_ver,
            isolate_versions: info.bool("isolate_versions", false),
            unstyled: info.bool("unstyled", false),
            needs_unlock: info.bool("needsUnlock", false),
            glob_desc: multiline(info, "description"),
            desc_last: info.bool("AllDescLast", false),
            all_conf: get_config(data.fsys, info, "items", "all_conf", ".cfg")?,
            folders,
            version_id_order: Vec::new(),
            visual_subtypes: Vec::new(),
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.all_conf.extend_from(&over.all_conf);
        self.folders.extend(over.folders);

        for (ver_id, version) in over.versions {
            let Some(ours) = self.versions.get_mut(&ver_id) else {
                self.versions.insert(ver_id, version);
                continue;
            };
            let Version {
                styles, inherit_kind, ..
            } = version;
            for (style_id, slot) in styles {
                if ours.styles.contains_key(&style_id) {
                    return Err(PackageError::DuplicateStyleDefinition {
                        item: self.id.clone(),
                        version: ver_id,
                        style: style_id,
                    });
                }
                if let Some(kind) = inherit_kind.get(&style_id) {
                    ours.inherit_kind.insert(style_id.clone(), *kind);
                }
                ours.styles.insert(style_id, slot);
            }
        }
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(Item);
}
