//! Object kinds and the registry mapping package keywords onto them.

use crate::error::Result;
use crate::item::Item;
use crate::item_config::ItemConfig;
use crate::object::{PakObject, PakObjectKind};
use crate::pack_list::PackList;
use crate::parsed::ParseData;
use crate::quote_pack::QuotePack;
use crate::selectable::{Elevator, Music, Skybox};
use crate::style::Style;
use crate::stylevar::StyleVar;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Category of package content.
///
/// Variants are declared in parse order: styles come first so later stages
/// can rely on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    Style,
    Item,
    ItemConfig,
    QuotePack,
    Music,
    Skybox,
    Elevator,
    StyleVar,
    PackList,
}

impl ObjectType {
    pub const ALL: [ObjectType; 9] = [
        Self::Style,
        Self::Item,
        Self::ItemConfig,
        Self::QuotePack,
        Self::Music,
        Self::Skybox,
        Self::Elevator,
        Self::StyleVar,
        Self::PackList,
    ];

    /// The keyword used for this type in package info files.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Style => "Style",
            Self::Item => "Item",
            Self::ItemConfig => "ItemConfig",
            Self::QuotePack => "QuotePack",
            Self::Music => "Music",
            Self::Skybox => "Skybox",
            Self::Elevator => "Elevator",
            Self::StyleVar => "StyleVar",
            Self::PackList => "PackList",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Constructs a domain object from its parse record.
pub type ParseFn = fn(&ParseData<'_>) -> Result<PakObject>;

/// Descriptor for one registered object type.
#[derive(Debug, Clone, Copy)]
pub struct ObjectTypeInfo {
    pub obj_type: ObjectType,
    pub keyword: &'static str,
    /// Repeated declarations are folded in like overrides instead of failing.
    pub allow_mult: bool,
    /// Objects of this type carry selector icons.
    pub has_img: bool,
    pub parse_fn: ParseFn,
}

/// Generic [`ParseFn`] for any object kind.
pub fn parse_as<T: PakObjectKind>(data: &ParseData<'_>) -> Result<PakObject> {
    T::parse(data).map(PakObjectKind::into_object)
}

/// Explicit table of object types, keyed by keyword.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<ObjectType, ObjectTypeInfo>,
    keywords: HashMap<String, ObjectType>,
}

impl TypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in object type.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_kind::<Style>(false, true);
        registry.register_kind::<Item>(false, true);
        registry.register_kind::<ItemConfig>(true, false);
        registry.register_kind::<QuotePack>(false, true);
        registry.register_kind::<Music>(false, true);
        registry.register_kind::<Skybox>(false, true);
        registry.register_kind::<Elevator>(false, true);
        registry.register_kind::<StyleVar>(true, false);
        registry.register_kind::<PackList>(true, false);
        registry
    }

    /// Adds or replaces a type descriptor.
    pub fn register(&mut self, info: ObjectTypeInfo) {
        self.keywords.insert(info.keyword.to_lowercase(), info.obj_type);
        self.types.insert(info.obj_type, info);
    }

    /// Registers `T` under its default keyword.
    pub fn register_kind<T: PakObjectKind>(&mut self, allow_mult: bool, has_img: bool) {
        self.register(ObjectTypeInfo {
            obj_type: T::TYPE,
            keyword: T::TYPE.keyword(),
            allow_mult,
            has_img,
            parse_fn: parse_as::<T>,
        });
    }

    /// Looks up a package keyword, ignoring case.
    #[must_use]
    pub fn lookup(&self, keyword: &str) -> Option<&ObjectTypeInfo> {
        let obj_type = self.keywords.get(&keyword.to_lowercase())?;
        self.types.get(obj_type)
    }

    #[must_use]
    pub fn info(&self, obj_type: ObjectType) -> Option<&ObjectTypeInfo> {
        self.types.get(&obj_type)
    }

    /// Registered types in parse order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectTypeInfo> {
        self.types.values()
    }

    /// Types whose objects carry selector icons, in parse order.
    pub fn image_types(&self) -> impl Iterator<Item = ObjectType> + '_ {
        self.iter().filter(|info| info.has_img).map(|info| info.obj_type)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
