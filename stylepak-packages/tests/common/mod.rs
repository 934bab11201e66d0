//! Shared builders for package tests.

#![allow(dead_code)]

use std::sync::Arc;
use stylepak_packages::{
    Item, ItemVariant, LoadOptions, MemoryFileSystem, Package, PackagesSet, Result, TypeRegistry,
};
use stylepak_types::{Keyvalues, ObjectId};

pub fn leaf(name: &str, value: &str) -> Keyvalues {
    Keyvalues::leaf(name, value)
}

pub fn block(name: &str, children: Vec<Keyvalues>) -> Keyvalues {
    Keyvalues::block(name, children)
}

/// Installs a test-writer subscriber so `tracing` output shows up on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// An `editoritems.txt` tree with one item. Every subtype is visible, placed
/// along the top row of the palette.
pub fn editoritems(item_type: &str, subtypes: &[&str]) -> Keyvalues {
    let subtype_blocks = subtypes
        .iter()
        .enumerate()
        .map(|(index, name)| {
            block(
                "SubType",
                vec![
                    leaf("Name", name),
                    block(
                        "Model",
                        vec![leaf("ModelName", &format!("{}.mdl", name.to_lowercase()))],
                    ),
                    block(
                        "Palette",
                        vec![
                            leaf("Tooltip", &name.to_uppercase()),
                            leaf("Image", &format!("palette/{}.png", name.to_lowercase())),
                            leaf("Position", &format!("{index} 0 0")),
                        ],
                    ),
                ],
            )
        })
        .collect();

    Keyvalues::root(vec![block(
        "Item",
        vec![
            leaf("Type", item_type),
            block("Editor", subtype_blocks),
            block(
                "Properties",
                vec![
                    block("TimerDelay", vec![leaf("DefaultValue", "3"), leaf("Index", "1")]),
                    block(
                        "ConnectionCount",
                        vec![
                            leaf("DefaultValue", "0"),
                            leaf("Index", "2"),
                            leaf("BEE2_ignore", "1"),
                        ],
                    ),
                ],
            ),
            block(
                "Exporting",
                vec![block(
                    "Instances",
                    vec![block(
                        "0",
                        vec![
                            leaf("Name", &format!("instances/{}.vmf", item_type.to_lowercase())),
                            leaf("EntityCount", "2"),
                        ],
                    )],
                )],
            ),
        ],
    )])
}

/// A `properties.txt` tree.
pub fn item_properties(desc: &str) -> Keyvalues {
    Keyvalues::root(vec![block(
        "Properties",
        vec![
            leaf("Authors", "Valve, Carl"),
            leaf("Tags", "Test; Logic"),
            leaf("Description", desc),
            leaf("ent_count", "2"),
        ],
    )])
}

/// `Item` block with the given versions.
pub fn item(id: &str, versions: Vec<Keyvalues>) -> Keyvalues {
    let mut children = vec![leaf("ID", id)];
    children.extend(versions);
    block("Item", children)
}

/// `Version` block with a `Styles` block holding `styles`.
pub fn version(id: &str, name: &str, styles: Vec<Keyvalues>) -> Keyvalues {
    block(
        "Version",
        vec![leaf("ID", id), leaf("Name", name), block("Styles", styles)],
    )
}

/// Builds a package in memory.
pub struct PackageBuilder {
    fsys: MemoryFileSystem,
    info: Vec<Keyvalues>,
    fingerprint: u64,
}

impl PackageBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            fsys: MemoryFileSystem::new(format!("{id}.bee_pack")),
            info: vec![leaf("ID", id), leaf("Name", &format!("{id} package"))],
            fingerprint: 1,
        }
    }

    /// Appends a raw key to `info.txt`.
    pub fn info(mut self, kv: Keyvalues) -> Self {
        self.info.push(kv);
        self
    }

    pub fn file(mut self, path: &str, tree: Keyvalues) -> Self {
        self.fsys.insert(path, tree);
        self
    }

    pub fn dev(mut self) -> Self {
        self.fsys = self.fsys.dev();
        self
    }

    pub fn fingerprint(mut self, fingerprint: u64) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn prerequisite(self, id: &str) -> Self {
        self.info(block("Prerequisites", vec![leaf("", id)]))
    }

    /// A style stored in `styles/<lowercase id>/`.
    pub fn style(self, id: &str, base: Option<&str>) -> Self {
        let folder = id.to_lowercase();
        let mut children = vec![leaf("ID", id), leaf("Name", id), leaf("Folder", &folder)];
        if let Some(base) = base {
            children.push(leaf("Base", base));
        }
        self.file(
            &format!("styles/{folder}/items.txt"),
            Keyvalues::root(vec![leaf("style", id)]),
        )
        .info(block("Style", children))
    }

    /// An item folder with a single `Button` subtype.
    pub fn item_folder(self, folder: &str, item_type: &str, desc: &str) -> Self {
        self.file(
            &format!("items/{folder}/editoritems.txt"),
            editoritems(item_type, &["Button"]),
        )
        .file(&format!("items/{folder}/properties.txt"), item_properties(desc))
    }

    pub fn build(self) -> Package {
        Package::new(self.fsys.into_handle(), Keyvalues::root(self.info), self.fingerprint)
            .expect("test package should be valid")
    }
}

/// The clean style package every scenario starts from.
pub fn clean_package() -> PackageBuilder {
    PackageBuilder::new("BEE2_CLEAN_STYLE").style("CLEAN", None)
}

pub fn load(packages: Vec<Package>) -> Result<PackagesSet> {
    load_with(packages, &LoadOptions::default())
}

pub fn load_with(packages: Vec<Package>, options: &LoadOptions) -> Result<PackagesSet> {
    PackagesSet::load(packages, &TypeRegistry::builtin(), options)
}

pub fn get_item<'a>(set: &'a PackagesSet, item_id: &str) -> &'a Item {
    set.by_id::<Item>(item_id)
        .unwrap_or_else(|| panic!("item {item_id} should be loaded"))
}

/// The resolved variant stored for an exact (version, style) slot.
pub fn slot<'a>(
    set: &'a PackagesSet,
    item_id: &str,
    version: &str,
    style: &str,
) -> &'a Arc<ItemVariant> {
    get_item(set, item_id)
        .version(version)
        .and_then(|ver| ver.styles.get(&ObjectId::new(style)))
        .and_then(|slot| slot.resolved())
        .unwrap_or_else(|| panic!("{item_id}:{version}.{style} should be resolved"))
}
