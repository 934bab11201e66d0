//! Editor item definitions, read from `editoritems.txt` trees.
//!
//! Only the parts the engine edits are broken out: subtypes and their palette
//! data, properties, and instances. Everything else is carried through
//! untouched so it can be written back out.

use crate::error::{PackageError, Result};
use std::collections::BTreeMap;
use stylepak_types::Keyvalues;

/// One subtype of an editor item, e.g. each timer value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubType {
    pub name: String,
    pub models: Vec<String>,
    pub pal_name: Option<String>,
    pub pal_icon: Option<String>,
    /// Palette grid position, `(x, y)`.
    pub pal_pos: Option<(u32, u32)>,
    /// Remaining keys of the subtype block.
    pub other: Vec<Keyvalues>,
}

impl SubType {
    /// Subtypes with palette data are shown in the editor.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.pal_pos.is_some() || self.pal_name.is_some()
    }

    pub fn strip_palette(&mut self) {
        self.pal_name = None;
        self.pal_icon = None;
        self.pal_pos = None;
    }

    fn parse(block: &Keyvalues) -> Self {
        let mut sub = SubType::default();
        for kv in block.children() {
            if kv.is_named("Name") {
                sub.name = kv.value().to_string();
            } else if kv.is_named("Model") {
                if kv.has_children() {
                    sub.models.extend(kv.children().iter().map(|m| m.value().to_string()));
                } else {
                    sub.models.push(kv.value().to_string());
                }
            } else if kv.is_named("Palette") {
                sub.pal_name = kv.get("Tooltip").map(str::to_string);
                sub.pal_icon = kv.get("Image").map(str::to_string);
                sub.pal_pos = kv.get("Position").and_then(parse_position);
            } else {
                sub.other.push(kv.clone());
            }
        }
        sub
    }

    fn to_keyvalues(&self) -> Keyvalues {
        let mut block = Keyvalues::block("SubType", Vec::new());
        block.push(Keyvalues::leaf("Name", self.name.clone()));
        for model in &self.models {
            block.push(Keyvalues::block(
                "Model",
                vec![Keyvalues::leaf("ModelName", model.clone())],
            ));
        }
        if self.pal_name.is_some() || self.pal_icon.is_some() || self.pal_pos.is_some() {
            let mut palette = Keyvalues::block("Palette", Vec::new());
            if let Some(name) = &self.pal_name {
                palette.push(Keyvalues::leaf("Tooltip", name.clone()));
            }
            if let Some(icon) = &self.pal_icon {
                palette.push(Keyvalues::leaf("Image", icon.clone()));
            }
            if let Some((x, y)) = self.pal_pos {
                palette.push(Keyvalues::leaf("Position", format!("{x} {y} 0")));
            }
            block.push(palette);
        }
        for kv in &self.other {
            block.push(kv.clone());
        }
        block
    }
}

/// A property the item exposes, such as its timer delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProp {
    pub name: String,
    pub default: String,
    pub index: i64,
    /// False when the definition sets `BEE2_ignore`.
    pub allow_user_default: bool,
}

/// An instance used by the item, with its brush budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstCount {
    pub path: String,
    pub ent_count: i64,
    pub brush_count: i64,
    pub face_count: i64,
}

impl InstCount {
    pub(crate) fn parse(kv: &Keyvalues) -> Result<Self> {
        if !kv.has_children() {
            return Ok(Self {
                path: kv.value().to_string(),
                ..Self::default()
            });
        }
        Ok(Self {
            path: kv.get_or("Name", "").to_string(),
            ent_count: kv.int("EntityCount", 0)?,
            brush_count: kv.int("BrushCount", 0)?,
            face_count: kv.int("BrushSideCount", 0)?,
        })
    }
}

/// An item definition for the game's editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorItem {
    pub id: String,
    pub subtypes: Vec<SubType>,
    pub properties: Vec<ItemProp>,
    /// Numbered instances.
    pub instances: Vec<InstCount>,
    /// Named instances, without the `bee2_` prefix.
    pub cust_instances: BTreeMap<String, String>,
    /// Other keys of the `Editor` block.
    pub editor_other: Vec<Keyvalues>,
    /// Other keys of the `Exporting` block.
    pub exporting_other: Vec<Keyvalues>,
    /// Other top-level keys, such as connections.
    pub other: Vec<Keyvalues>,
}

impl EditorItem {
    /// Parses every `Item` block of an editoritems file, in order.
    pub fn parse_file(tree: &Keyvalues, source: &str) -> Result<Vec<EditorItem>> {
        tree.children()
            .iter()
            .map(|kv| {
                if kv.is_named("Item") && kv.has_children() {
                    Self::parse_one(kv)
                } else {
                    Err(PackageError::InvalidEditorItems {
                        source_desc: source.to_string(),
                        key: kv.real_name().to_string(),
                    })
                }
            })
            .collect()
    }

    /// Parses a single `Item` block.
    pub fn parse_one(block: &Keyvalues) -> Result<EditorItem> {
        let mut item = EditorItem::default();
        for kv in block.children() {
            if kv.is_named("Type") {
                item.id = kv.value().to_string();
            } else if kv.is_named("Editor") {
                for editor_kv in kv.children() {
                    if editor_kv.is_named("SubType") {
                        item.subtypes.push(SubType::parse(editor_kv));
                    } else {
                        item.editor_other.push(editor_kv.clone());
                    }
                }
            } else if kv.is_named("Properties") {
                for prop in kv.children() {
                    item.properties.push(ItemProp {
                        name: prop.real_name().to_string(),
                        default: prop.get_or("DefaultValue", "").to_string(),
                        index: prop.int("Index", 0)?,
                        allow_user_default: !prop.bool("BEE2_ignore", false),
                    });
                }
            } else if kv.is_named("Exporting") {
                for exp in kv.children() {
                    if exp.is_named("Instances") {
                        for inst in exp.children() {
                            item.add_instance(inst)?;
                        }
                    } else {
                        item.exporting_other.push(exp.clone());
                    }
                }
            } else {
                item.other.push(kv.clone());
            }
        }
        Ok(item)
    }

    /// Adds an instance entry, numbered or named.
    pub(crate) fn add_instance(&mut self, kv: &Keyvalues) -> Result<()> {
        let inst = InstCount::parse(kv)?;
        let name = kv.real_name();
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            let index: usize = name.parse().map_err(|_| stylepak_types::Error::InvalidValue {
                key: name.to_string(),
                value: kv.value().to_string(),
                expected: "an instance index",
            })?;
            self.set_inst(index, inst);
        } else {
            let lowered = name.to_lowercase();
            let key = lowered.strip_prefix("bee2_").unwrap_or(&lowered).to_string();
            self.cust_instances.insert(key, inst.path);
        }
        Ok(())
    }

    /// Sets a numbered instance, padding with blanks as needed.
    pub fn set_inst(&mut self, index: usize, inst: InstCount) {
        if self.instances.len() <= index {
            self.instances.resize(index + 1, InstCount::default());
        }
        self.instances[index] = inst;
    }

    pub fn property(&self, name: &str) -> Option<&ItemProp> {
        self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut ItemProp> {
        self.properties.iter_mut().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Writes the definition back out as an `Item` block.
    #[must_use]
    pub fn to_keyvalues(&self) -> Keyvalues {
        let mut editor: Vec<Keyvalues> = self.subtypes.iter().map(SubType::to_keyvalues).collect();
        editor.extend(self.editor_other.iter().cloned());

        let properties = self
            .properties
            .iter()
            .map(|prop| {
                let mut block = Keyvalues::block(
                    prop.name.clone(),
                    vec![
                        Keyvalues::leaf("DefaultValue", prop.default.clone()),
                        Keyvalues::leaf("Index", prop.index.to_string()),
                    ],
                );
                if !prop.allow_user_default {
                    block.push(Keyvalues::leaf("BEE2_ignore", "1"));
                }
                block
            })
            .collect();

        let mut instances: Vec<Keyvalues> = self
            .instances
            .iter()
            .enumerate()
            .map(|(index, inst)| {
                Keyvalues::block(
                    index.to_string(),
                    vec![
                        Keyvalues::leaf("Name", inst.path.clone()),
                        Keyvalues::leaf("EntityCount", inst.ent_count.to_string()),
                        Keyvalues::leaf("BrushCount", inst.brush_count.to_string()),
                        Keyvalues::leaf("BrushSideCount", inst.face_count.to_string()),
                    ],
                )
            })
            .collect();
        instances.extend(
            self.cust_instances
                .iter()
                .map(|(name, path)| Keyvalues::leaf(format!("bee2_{name}"), path.clone())),
        );
        let mut exporting = vec![Keyvalues::block("Instances", instances)];
        exporting.extend(self.exporting_other.iter().cloned());

        let mut block = Keyvalues::block(
            "Item",
            vec![
                Keyvalues::leaf("Type", self.id.clone()),
                Keyvalues::block("Editor", editor),
                Keyvalues::block("Properties", properties),
                Keyvalues::block("Exporting", exporting),
            ],
        );
        for kv in &self.other {
            block.push(kv.clone());
        }
        block
    }
}

fn parse_position(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.split_whitespace().map(str::parse::<u32>);
    match (parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y))) => Some((x, y)),
        _ => None,
    }
}
