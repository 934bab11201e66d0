//! The result of a load: every package and every resolved object.

use crate::error::{PackageError, Result};
use crate::item::Item;
use crate::object::{PakObject, PakObjectKind};
use crate::object_type::{ObjectType, ObjectTypeInfo, TypeRegistry};
use crate::options::{ContentOptions, LoadOptions};
use crate::package::{MANDATORY_PACKAGES, Package, Prerequisite, scan_package};
use crate::parsed::{ObjData, ParseData, ParsedObjectStore, Warnings};
use crate::resolve::assign_styled_items;
use crate::style::{Style, StyleChain, build_style_bases};
use std::collections::{BTreeMap, BTreeSet};
use stylepak_types::ObjectId;
use tracing::{debug, info};

type ObjectMap = BTreeMap<ObjectType, BTreeMap<ObjectId, PakObject>>;

/// Packages and the objects they define, fully resolved.
///
/// Built only by a successful load and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct PackagesSet {
    packages: BTreeMap<ObjectId, Package>,
    loaded: BTreeSet<ObjectId>,
    objects: ObjectMap,
    warnings: Vec<String>,
}

impl PackagesSet {
    /// Loads every enabled package.
    ///
    /// Packages are scanned in the order given. Disabled packages and those
    /// with unmet prerequisites are skipped.
    pub fn load(
        packages: Vec<Package>,
        registry: &TypeRegistry,
        options: &LoadOptions,
    ) -> Result<Self> {
        let warnings = Warnings::new();
        let mut by_id: BTreeMap<ObjectId, Package> = BTreeMap::new();
        let mut order = Vec::with_capacity(packages.len());
        for pkg in packages {
            if by_id.contains_key(pkg.id()) {
                return Err(PackageError::DuplicatePackage(pkg.id().clone()));
            }
            order.push(pkg.id().clone());
            by_id.insert(pkg.id().clone(), pkg);
        }
        info!(count = by_id.len(), "Registered packages");

        if options.content.require_mandatory {
            let missing: Vec<ObjectId> = MANDATORY_PACKAGES
                .iter()
                .map(|id| ObjectId::new(*id))
                .filter(|id| !by_id.contains_key(id))
                .collect();
            if !missing.is_empty() {
                return Err(PackageError::MissingMandatory(missing));
            }
        }

        let mut store = ParsedObjectStore::new();
        let mut loaded = BTreeSet::new();
        for pak_id in &order {
            let Some(pkg) = by_id.get(pak_id) else {
                continue;
            };
            if !pkg.enabled(&options.packages) {
                info!(package = %pak_id, "Package disabled");
                continue;
            }
            if let Some(missing) = unmet_prerequisite(pkg, &by_id, &options.content) {
                warnings.push(
                    pak_id,
                    format!("Package could not be enabled, {missing} is not installed"),
                );
                continue;
            }
            scan_package(&mut store, registry, pkg, &warnings)?;
            loaded.insert(pak_id.clone());
        }

        let objects = build_objects(&store, registry, options, &warnings)?;
        Ok(Self {
            packages: by_id,
            loaded,
            objects,
            warnings: warnings.into_vec(),
        })
    }

    /// Builds a set from records already collected into a store, without any
    /// packages attached.
    pub fn from_store(
        store: &ParsedObjectStore,
        registry: &TypeRegistry,
        options: &LoadOptions,
    ) -> Result<Self> {
        let warnings = Warnings::new();
        let objects = build_objects(store, registry, options, &warnings)?;
        Ok(Self {
            objects,
            warnings: warnings.into_vec(),
            ..Self::default()
        })
    }

    /// Every object of one kind, sorted by id.
    pub fn all<T: PakObjectKind>(&self) -> impl Iterator<Item = &T> {
        self.objects
            .get(&T::TYPE)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter_map(T::from_object)
    }

    /// Looks up an object by id, ignoring case.
    #[must_use]
    pub fn by_id<T: PakObjectKind>(&self, id: &str) -> Option<&T> {
        self.objects.get(&T::TYPE)?.get(&ObjectId::new(id)).and_then(T::from_object)
    }

    #[must_use]
    pub fn count(&self, obj_type: ObjectType) -> usize {
        self.objects.get(&obj_type).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn package(&self, id: &str) -> Option<&Package> {
        self.packages.get(&ObjectId::new(id))
    }

    /// Every registered package, loaded or not.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Whether a package's objects were scanned.
    #[must_use]
    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.contains(&ObjectId::new(id))
    }

    /// Styles with their inheritance chains, sorted by id.
    #[must_use]
    pub fn style_chains(&self) -> Vec<StyleChain> {
        self.all::<Style>().map(Style::chain).collect()
    }

    /// Recoverable problems seen during the load, as `package: message`.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn unmet_prerequisite(
    pkg: &Package,
    known: &BTreeMap<ObjectId, Package>,
    content: &ContentOptions,
) -> Option<String> {
    pkg.prerequisites().iter().find_map(|pre| match pre {
        Prerequisite::TagMusic if !content.has_tag_music => {
            Some("Aperture Tag's music".to_string())
        }
        Prerequisite::MelMusic if !content.has_mel_music => {
            Some("Portal Stories: Mel's music".to_string())
        }
        Prerequisite::Package(id) if !known.contains_key(id) => {
            Some(format!("required package \"{id}\""))
        }
        _ => None,
    })
}

fn parse_record(
    info: &ObjectTypeInfo,
    obj_id: &ObjectId,
    data: &ObjData,
    is_override: bool,
    options: &LoadOptions,
    warnings: &Warnings,
) -> Result<PakObject> {
    debug!(
        obj_type = %info.obj_type,
        obj_id = %obj_id,
        package = %data.pak_id,
        is_override,
        "Parsing object"
    );
    let parse_data = ParseData {
        fsys: &data.fsys,
        id: obj_id,
        info: &data.info,
        pak_id: &data.pak_id,
        is_override,
        options,
        warnings,
    };
    (info.parse_fn)(&parse_data).map_err(|err| err.in_object(info.obj_type, &data.pak_id, obj_id))
}

fn build_objects(
    store: &ParsedObjectStore,
    registry: &TypeRegistry,
    options: &LoadOptions,
    warnings: &Warnings,
) -> Result<ObjectMap> {
    let mut objects = ObjectMap::new();
    for info in registry.iter() {
        let parsed = objects.entry(info.obj_type).or_default();
        for (obj_id, data) in store.primaries(info.obj_type) {
            let obj = parse_record(info, obj_id, data, false, options, warnings)?;
            parsed.insert(obj_id.clone(), obj);
        }
        info!(obj_type = %info.obj_type, count = parsed.len(), "Parsed objects");
    }

    // Every primary exists now, so overrides can be folded in.
    for over in store.overrides() {
        let info = registry
            .info(over.obj_type)
            .ok_or(PackageError::UnregisteredType(over.obj_type))?;
        let target = objects
            .get_mut(&over.obj_type)
            .and_then(|by_id| by_id.get_mut(&over.obj_id))
            .ok_or_else(|| PackageError::OverrideWithoutPrimary {
                obj_type: over.obj_type,
                obj_id: over.obj_id.clone(),
                pak_id: over.data.pak_id.clone(),
            })?;
        let obj =
            parse_record(info, &over.obj_id, &over.data, over.is_override, options, warnings)?;
        target
            .add_over(obj)
            .map_err(|err| err.in_object(over.obj_type, &over.data.pak_id, &over.obj_id))?;
    }
    debug!(overrides = store.overrides().len(), "Applied overrides");

    let mut styles: BTreeMap<ObjectId, Style> = objects
        .remove(&ObjectType::Style)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, obj)| match obj {
            PakObject::Style(style) => Some((id, style)),
            _ => None,
        })
        .collect();
    for style in styles.values_mut() {
        style.fill_suggestion_defaults();
    }
    build_style_bases(&mut styles, warnings)?;
    let chains: Vec<StyleChain> = styles.values().map(Style::chain).collect();
    objects.insert(
        ObjectType::Style,
        styles.into_iter().map(|(id, style)| (id, PakObject::Style(style))).collect(),
    );

    info!(
        items = objects.get(&ObjectType::Item).map_or(0, BTreeMap::len),
        "Allocating styled items"
    );
    for obj in objects.entry(ObjectType::Item).or_default().values_mut() {
        if let Some(item) = Item::from_object_mut(obj) {
            assign_styled_items(item, &chains, &options.diagnostics, warnings)?;
            if options.diagnostics.dev_mode {
                check_variants(item, warnings);
            }
        }
    }
    Ok(objects)
}

/// Extra checks on resolved items, run in development mode.
fn check_variants(item: &Item, warnings: &Warnings) {
    for version in item.versions().values() {
        for (style_id, slot) in &version.styles {
            let Some(variant) = slot.resolved() else {
                continue;
            };
            if variant.editor.subtypes.is_empty() {
                warnings.push(
                    &variant.pak_id,
                    format!(
                        "Item {}:{} in style {} has no subtypes",
                        item.id(),
                        version.id,
                        style_id
                    ),
                );
            }
        }
    }
}
