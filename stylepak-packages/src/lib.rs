//! Package loading and resolution for stylepak.
//!
//! Packages arrive as a filesystem handle plus their parsed `info.txt` tree.
//! Loading runs in fixed stages, all synchronous:
//!
//! 1. packages are registered and their object blocks scanned into a
//!    [`ParsedObjectStore`];
//! 2. every primary object is parsed through the [`TypeRegistry`];
//! 3. overrides are folded into their primaries, in scan order;
//! 4. style inheritance chains are built;
//! 5. every item gets a resolved variant for every (version, style) pair.
//!
//! The result is an immutable [`PackagesSet`]. A failed load returns the
//! error and nothing else.

mod editoritems;
mod error;
mod fsys;
mod item;
mod item_config;
mod object;
mod object_type;
mod options;
mod pack_list;
mod package;
mod packset;
mod parsed;
mod quote_pack;
mod resolve;
mod selectable;
mod selitem;
mod style;
mod stylevar;
mod variant;

pub use editoritems::{EditorItem, InstCount, ItemProp, SubType};
pub use error::{PackageError, Result};
pub use fsys::{FileSystem, FsError, FsHandle, MemoryFileSystem};
pub use item::{
    DEFAULT_VERSION, DefaultStyle, InheritKind, Item, StyleRef, UnresolvedVariant, VariantSlot,
    VariantSource, Version,
};
pub use item_config::ItemConfig;
pub use object::{PakObject, PakObjectKind};
pub use object_type::{ObjectType, ObjectTypeInfo, ParseFn, TypeRegistry, parse_as};
pub use options::{ContentOptions, DiagnosticOptions, LoadOptions, PackageConfig};
pub use pack_list::PackList;
pub use package::{MANDATORY_PACKAGES, Package, Prerequisite, scan_package};
pub use packset::PackagesSet;
pub use parsed::{ObjData, OverrideData, ParseData, ParsedObjectStore, Warnings, get_config};
pub use quote_pack::{Monitor, QuotePack};
pub use resolve::assign_styled_items;
pub use selectable::{Elevator, Music, MusicChannel, Skybox};
pub use selitem::SelitemData;
pub use style::{CorridorKind, LegacyCorridor, Style, StyleChain, SuggestKind, build_style_bases};
pub use stylevar::StyleVar;
pub use variant::{ItemVariant, parse_item_folder};
