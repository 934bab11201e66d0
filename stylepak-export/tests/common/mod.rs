//! Shared builders for export tests.

#![allow(dead_code)]

use stylepak_packages::{LoadOptions, MemoryFileSystem, Package, PackagesSet, Result, TypeRegistry};
use stylepak_types::Keyvalues;

pub fn leaf(name: &str, value: &str) -> Keyvalues {
    Keyvalues::leaf(name, value)
}

pub fn block(name: &str, children: Vec<Keyvalues>) -> Keyvalues {
    Keyvalues::block(name, children)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// One `Item` block. Every subtype starts out on the palette's top row.
pub fn editor_block(item_type: &str, subtypes: &[&str]) -> Keyvalues {
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

    block(
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
        ],
    )
}

/// `Item` block for `info.txt`, with the given versions.
pub fn item(id: &str, extra: Vec<Keyvalues>) -> Keyvalues {
    let mut children = vec![leaf("ID", id)];
    children.extend(extra);
    block("Item", children)
}

/// `Version` block mapping each style to a folder.
pub fn version(id: &str, styles: &[(&str, &str)]) -> Keyvalues {
    block(
        "Version",
        vec![
            leaf("ID", id),
            leaf("Name", id),
            block("Styles", styles.iter().map(|(style, folder)| leaf(style, folder)).collect()),
        ],
    )
}

pub struct PackageBuilder {
    fsys: MemoryFileSystem,
    info: Vec<Keyvalues>,
}

impl PackageBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            fsys: MemoryFileSystem::new(format!("{id}.bee_pack")),
            info: vec![leaf("ID", id), leaf("Name", id)],
        }
    }

    pub fn info(mut self, kv: Keyvalues) -> Self {
        self.info.push(kv);
        self
    }

    pub fn file(mut self, path: &str, tree: Keyvalues) -> Self {
        self.fsys.insert(path, tree);
        self
    }

    /// A style with its own `vbsp_config.cfg`.
    pub fn style(self, id: &str, base: Option<&str>, config: Vec<Keyvalues>) -> Self {
        let folder = id.to_lowercase();
        let mut children = vec![leaf("ID", id), leaf("Name", id), leaf("Folder", &folder)];
        if let Some(base) = base {
            children.push(leaf("Base", base));
        }
        self.file(&format!("styles/{folder}/items.txt"), Keyvalues::empty())
            .file(&format!("styles/{folder}/vbsp_config.cfg"), Keyvalues::root(config))
            .info(block("Style", children))
    }

    /// An item folder holding the given editor blocks, properties and config.
    pub fn folder(
        self,
        folder: &str,
        editor: Vec<Keyvalues>,
        props: Vec<Keyvalues>,
        config: Vec<Keyvalues>,
    ) -> Self {
        self.file(&format!("items/{folder}/editoritems.txt"), Keyvalues::root(editor))
            .file(
                &format!("items/{folder}/properties.txt"),
                Keyvalues::root(vec![block("Properties", props)]),
            )
            .file(&format!("items/{folder}/vbsp_config.cfg"), Keyvalues::root(config))
    }

    pub fn build(self) -> Package {
        Package::new(self.fsys.into_handle(), Keyvalues::root(self.info), 1)
            .expect("test package should be valid")
    }
}

/// CLEAN and 1950S styles, a single-subtype button with two versions and a
/// three-subtype timer that can be grouped.
pub fn scenario() -> PackageBuilder {
    PackageBuilder::new("BEE2_CLEAN_STYLE")
        .style("CLEAN", None, vec![leaf("StyleOption", "clean")])
        .style("1950S", Some("CLEAN"), vec![leaf("StyleOption", "fifties")])
        .folder(
            "button_clean",
            vec![editor_block("ITEM_BUTTON_OLD", &["Button"])],
            vec![leaf("Authors", "Valve")],
            vec![
                block("Replacements", vec![leaf("%speed%", "150")]),
                block("Conditions", vec![leaf("Speed", "%speed%")]),
                leaf("Percent", "100%%"),
            ],
        )
        .folder(
            "button_alt",
            vec![editor_block("ITEM_BUTTON", &["Button"])],
            vec![],
            vec![leaf("AltOption", "1")],
        )
        .folder(
            "timer_clean",
            vec![editor_block("ITEM_TIMER", &["Timer0", "Timer1", "Timer2"])],
            vec![leaf("all_name", "Timer"), leaf("all_icon", "palette/timer_all.png")],
            vec![],
        )
        .info(item(
            "ITEM_BUTTON",
            vec![
                block("all_conf", vec![leaf("AllOption", "1")]),
                version("VER_DEFAULT", &[("CLEAN", "button_clean")]),
                version("VER_ALT", &[("CLEAN", "button_alt")]),
            ],
        ))
        .info(item("ITEM_TIMER", vec![version("VER_DEFAULT", &[("CLEAN", "timer_clean")])]))
}

pub fn load(packages: Vec<Package>) -> Result<PackagesSet> {
    PackagesSet::load(packages, &TypeRegistry::builtin(), &LoadOptions::default())
}

pub fn load_scenario() -> PackagesSet {
    load(vec![scenario().build()]).expect("scenario should load")
}
