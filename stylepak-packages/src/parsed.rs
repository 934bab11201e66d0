//! Raw object records gathered while scanning packages.
//!
//! Nothing in here knows about object semantics. Records are stored per type
//! and id, with overrides kept aside in the order they were scanned.

use crate::error::{PackageError, Result};
use crate::fsys::FsHandle;
use crate::object_type::{ObjectType, ObjectTypeInfo};
use crate::options::LoadOptions;
use std::cell::RefCell;
use std::collections::BTreeMap;
use stylepak_types::{Keyvalues, ObjectId};
use tracing::{debug, warn};

/// A scanned object block, before construction.
#[derive(Debug, Clone)]
pub struct ObjData {
    pub fsys: FsHandle,
    pub info: Keyvalues,
    pub pak_id: ObjectId,
    pub disp_name: String,
}

/// A record folded into a primary after all primaries exist.
#[derive(Debug, Clone)]
pub struct OverrideData {
    pub obj_type: ObjectType,
    pub obj_id: ObjectId,
    pub data: ObjData,
    /// False for repeated declarations of multi types, which are parsed
    /// with all fields required.
    pub is_override: bool,
}

/// Per-type primary records plus the scan-ordered override list.
#[derive(Debug, Default)]
pub struct ParsedObjectStore {
    primary: BTreeMap<ObjectType, BTreeMap<ObjectId, ObjData>>,
    overrides: Vec<OverrideData>,
}

impl ParsedObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a primary declaration.
    ///
    /// A repeated id is kept as a non-override record for `allow_mult` types
    /// and is fatal otherwise.
    pub fn add(&mut self, info: &ObjectTypeInfo, obj_id: ObjectId, data: ObjData) -> Result<()> {
        let by_id = self.primary.entry(info.obj_type).or_default();
        if let Some(existing) = by_id.get(&obj_id) {
            if !info.allow_mult {
                return Err(PackageError::DuplicateObject {
                    obj_type: info.obj_type,
                    obj_id,
                    pak1: data.pak_id,
                    pak2: existing.pak_id.clone(),
                });
            }
            debug!(
                obj_type = %info.obj_type,
                obj_id = %obj_id,
                package = %data.pak_id,
                "Repeated declaration folded in"
            );
            self.overrides.push(OverrideData {
                obj_type: info.obj_type,
                obj_id,
                data,
                is_override: false,
            });
            return Ok(());
        }
        by_id.insert(obj_id, data);
        Ok(())
    }

    /// Records an explicit override block.
    pub fn add_override(&mut self, obj_type: ObjectType, obj_id: ObjectId, data: ObjData) {
        self.overrides.push(OverrideData {
            obj_type,
            obj_id,
            data,
            is_override: true,
        });
    }

    #[must_use]
    pub fn primary(&self, obj_type: ObjectType, obj_id: &ObjectId) -> Option<&ObjData> {
        self.primary.get(&obj_type)?.get(obj_id)
    }

    /// Primary records of one type, sorted by id.
    pub fn primaries(&self, obj_type: ObjectType) -> impl Iterator<Item = (&ObjectId, &ObjData)> {
        self.primary.get(&obj_type).into_iter().flat_map(BTreeMap::iter)
    }

    /// Overrides in scan order.
    #[must_use]
    pub fn overrides(&self) -> &[OverrideData] {
        &self.overrides
    }

    #[must_use]
    pub fn count(&self, obj_type: ObjectType) -> usize {
        self.primary.get(&obj_type).map_or(0, BTreeMap::len)
    }
}

/// Recoverable problems found during a load.
///
/// Each entry is also logged at `warn` level when it is recorded.
#[derive(Debug, Default)]
pub struct Warnings {
    entries: RefCell<Vec<String>>,
}

impl Warnings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, pak_id: &ObjectId, message: impl Into<String>) {
        let message = message.into();
        warn!(package = %pak_id, "{message}");
        self.entries.borrow_mut().push(format!("{pak_id}: {message}"));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.entries.into_inner()
    }
}

/// Everything an object kind needs to construct itself.
#[derive(Debug, Clone, Copy)]
pub struct ParseData<'a> {
    pub fsys: &'a FsHandle,
    pub id: &'a ObjectId,
    pub info: &'a Keyvalues,
    pub pak_id: &'a ObjectId,
    pub is_override: bool,
    pub options: &'a LoadOptions,
    pub warnings: &'a Warnings,
}

impl<'a> ParseData<'a> {
    /// Records a warning against the owning package.
    pub fn warn(&self, message: impl Into<String>) {
        self.warnings.push(self.pak_id, message);
    }

    /// `pak:id`, for messages.
    #[must_use]
    pub fn source(&self) -> String {
        format!("{}:{}", self.pak_id, self.id)
    }

    /// Reads a required leaf value.
    pub fn required(&self, field: &'static str) -> Result<&'a str> {
        self.info.get(field).ok_or_else(|| PackageError::MissingField {
            source_desc: self.source(),
            field,
        })
    }
}

/// Gathers the config referenced by every `prop_name` key in `block`.
///
/// Block values are used inline. Leaf values name a file under `folder`,
/// with `extension` added when the name has none. Empty values are skipped
/// and multiple definitions are appended together.
pub fn get_config(
    fsys: &FsHandle,
    block: &Keyvalues,
    folder: &str,
    prop_name: &str,
    extension: &str,
) -> Result<Keyvalues> {
    let mut conf = Keyvalues::empty();
    for kv in block.find_all(prop_name) {
        if kv.has_children() {
            conf.extend_from(kv);
        } else if !kv.value().is_empty() {
            let mut path = format!("{folder}/{}", kv.value());
            if !has_extension(&path) {
                path.push_str(extension);
            }
            let tree = fsys.read_tree(&path)?;
            conf.extend_from(&tree);
        }
    }
    Ok(conf)
}

fn has_extension(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 4 && bytes[bytes.len() - 4] == b'.'
}
