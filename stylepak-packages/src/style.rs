//! Styles and the inheritance chains built from their `Base` references.

use crate::error::{PackageError, Result};
use crate::fsys::read_optional;
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::{ParseData, Warnings};
use crate::selitem::SelitemData;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use stylepak_types::{Keyvalues, ObjectId};
use tracing::debug;

/// Companion selections a style can suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SuggestKind {
    Quote,
    Music,
    Skybox,
    Elevator,
}

impl SuggestKind {
    pub const ALL: [SuggestKind; 4] = [Self::Quote, Self::Music, Self::Skybox, Self::Elevator];

    /// Key inside a style's `Suggested` block.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Music => "music",
            Self::Skybox => "skybox",
            Self::Elevator => "elev",
        }
    }

    #[must_use]
    pub fn object_type(self) -> ObjectType {
        match self {
            Self::Quote => ObjectType::QuotePack,
            Self::Music => ObjectType::Music,
            Self::Skybox => ObjectType::Skybox,
            Self::Elevator => ObjectType::Elevator,
        }
    }

    /// Used when no package suggests anything.
    #[must_use]
    pub fn default_id(self) -> &'static str {
        match self {
            Self::Skybox => "SKY_BLACK",
            _ => "<NONE>",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| key.eq_ignore_ascii_case(kind.key()))
    }
}

/// The corridor groups styles describe with the old per-slot syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CorridorKind {
    SpEntry,
    SpExit,
    CoopExit,
}

impl CorridorKind {
    pub const ALL: [CorridorKind; 3] = [Self::SpEntry, Self::SpExit, Self::CoopExit];

    #[must_use]
    pub fn group(self) -> &'static str {
        match self {
            Self::SpEntry => "sp_entry",
            Self::SpExit => "sp_exit",
            Self::CoopExit => "coop",
        }
    }

    /// Number of corridor slots in this group.
    #[must_use]
    pub fn count(self) -> u8 {
        match self {
            Self::SpEntry => 7,
            Self::SpExit | Self::CoopExit => 4,
        }
    }
}

impl fmt::Display for CorridorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyCorridor {
    pub name: String,
    pub icon: Option<String>,
    pub desc: String,
}

/// The era a test chamber is built in.
#[derive(Debug, Clone)]
pub struct Style {
    id: ObjectId,
    pub selitem: SelitemData,
    base_style: Option<ObjectId>,
    bases: Vec<ObjectId>,
    /// Contents of `styles/<folder>/items.txt`.
    pub editor: Keyvalues,
    /// Contents of `styles/<folder>/vbsp_config.cfg`.
    pub config: Keyvalues,
    pub has_video: bool,
    pub vpk_name: String,
    suggested: BTreeMap<SuggestKind, BTreeSet<String>>,
    corridors: BTreeMap<(CorridorKind, u8), LegacyCorridor>,
}

impl Style {
    #[must_use]
    pub fn base_style(&self) -> Option<&ObjectId> {
        self.base_style.as_ref()
    }

    /// This style followed by its ancestors. Empty until the load has built
    /// the inheritance chains.
    #[must_use]
    pub fn bases(&self) -> &[ObjectId] {
        &self.bases
    }

    /// The suggested ids of one kind.
    pub fn suggested(&self, kind: SuggestKind) -> impl Iterator<Item = &str> {
        self.suggested.get(&kind).into_iter().flatten().map(String::as_str)
    }

    /// A corridor slot, numbered from 1.
    #[must_use]
    pub fn corridor(&self, kind: CorridorKind, index: u8) -> Option<&LegacyCorridor> {
        self.corridors.get(&(kind, index))
    }

    #[must_use]
    pub fn chain(&self) -> StyleChain {
        StyleChain {
            id: self.id.clone(),
            bases: self.bases.clone(),
        }
    }

    /// Fills empty suggestion sets with each kind's default.
    pub(crate) fn fill_suggestion_defaults(&mut self) {
        for kind in SuggestKind::ALL {
            let set = self.suggested.entry(kind).or_default();
            if set.is_empty() {
                set.insert(kind.default_id().to_string());
            }
        }
    }

    fn parse_corridors(
        info: &Keyvalues,
        pak_id: &ObjectId,
    ) -> BTreeMap<(CorridorKind, u8), LegacyCorridor> {
        let empty = Keyvalues::empty();
        let conf = info.find_key("corridors").unwrap_or(&empty);
        let icon_folder = conf.get_or("icon_folder", "");

        let mut corridors = BTreeMap::new();
        for kind in CorridorKind::ALL {
            let group = conf.find_key(kind.group()).unwrap_or(&empty);
            for index in 1..=kind.count() {
                let default_icon = (!icon_folder.is_empty())
                    .then(|| format!("{pak_id}:corr/{icon_folder}/{}/{index}.jpg", kind.group()));
                let corridor = match group.find_key(&index.to_string()) {
                    Some(kv) if kv.has_children() => LegacyCorridor {
                        name: kv.get_or("name", "").to_string(),
                        icon: kv.get("icon").map(str::to_string).or(default_icon),
                        desc: kv.get_or("Desc", "").to_string(),
                    },
                    Some(kv) => LegacyCorridor {
                        name: kv.value().to_string(),
                        icon: default_icon,
                        desc: String::new(),
                    },
                    None => LegacyCorridor {
                        icon: default_icon,
                        ..LegacyCorridor::default()
                    },
                };
                corridors.insert((kind, index), corridor);
            }
        }
        corridors
    }
}

impl PakObjectKind for Style {
    const TYPE: ObjectType = ObjectType::Style;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let info = data.info;
        let base_style = match info.get("base") {
            Some(base) if !base.trim().is_empty() => Some(ObjectId::parse(base)?),
            _ => None,
        };
        let has_video = info.bool("has_video", !data.is_override);

        let mut suggested: BTreeMap<SuggestKind, BTreeSet<String>> = BTreeMap::new();
        for kv in info.find_children("suggested") {
            match SuggestKind::from_key(kv.real_name()) {
                Some(kind) => {
                    suggested.entry(kind).or_default().insert(kv.value().to_string());
                }
                None => data.warn(format!(
                    "Unknown suggestion type for style {}: {}",
                    data.id,
                    kv.real_name()
                )),
            }
        }

        let (editor, config) = match info.get("folder") {
            Some(folder) => {
                let folder = format!("styles/{folder}");
                let editor = data.fsys.read_tree(&format!("{folder}/items.txt"))?;
                let config = read_optional(&**data.fsys, &format!("{folder}/vbsp_config.cfg"))?
                    .unwrap_or_else(Keyvalues::empty);
                (editor, config)
            }
            // Overrides may leave out the folder.
            None if data.is_override => (Keyvalues::empty(), Keyvalues::empty()),
            None => {
                return Err(PackageError::MissingField {
                    source_desc: format!("style {}", data.source()),
                    field: "folder",
                });
            }
        };

        Ok(Self {
            id: data.id.clone(),
            selitem: SelitemData::parse(info, data.pak_id),
            base_style,
            bases: Vec::new(),
            editor,
            config,
            has_video,
            vpk_name: info.get_or("vpk_name", "").to_lowercase(),
            suggested,
            corridors: Self::parse_corridors(info, data.pak_id),
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.editor.extend_from(&over.editor);
        self.config.extend_from(&over.config);
        self.selitem = self.selitem.merge(&over.selitem);
        self.has_video = self.has_video || over.has_video;
        for (kind, ids) in over.suggested {
            self.suggested.entry(kind).or_default().extend(ids);
        }
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(Style);
}

/// A style id with its inheritance chain, detached from the style itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleChain {
    pub id: ObjectId,
    /// `[id, parent, grandparent, ...]`.
    pub bases: Vec<ObjectId>,
}

/// Computes `bases` for every style.
///
/// Chains stop at a root or at a base id that is not loaded (with a warning).
/// A style seen twice while walking one chain is fatal.
pub fn build_style_bases(
    styles: &mut BTreeMap<ObjectId, Style>,
    warnings: &Warnings,
) -> Result<()> {
    let mut chains = Vec::with_capacity(styles.len());
    for style in styles.values() {
        let mut chain: Vec<ObjectId> = Vec::new();
        let mut current = style;
        loop {
            if chain.contains(&current.id) {
                return Err(PackageError::StyleLoop(current.id.clone()));
            }
            chain.push(current.id.clone());
            let Some(base_id) = &current.base_style else {
                break;
            };
            match styles.get(base_id) {
                Some(base) => current = base,
                None => {
                    let pak_id = style
                        .selitem
                        .packages
                        .iter()
                        .next()
                        .cloned()
                        .unwrap_or_else(|| style.id.clone());
                    warnings.push(&pak_id, format!("Unknown style \"{base_id}\""));
                    break;
                }
            }
        }
        debug!(style = %style.id, bases = ?chain, "Inheritance path");
        chains.push((style.id.clone(), chain));
    }

    for (id, chain) in chains {
        if let Some(style) = styles.get_mut(&id) {
            style.bases = chain;
        }
    }
    Ok(())
}
