//! Error types for package loading.
//!
//! Every variant here is fatal to the load that raised it. Recoverable
//! conditions are logged and collected as warnings instead.

use crate::fsys::FsError;
use crate::object_type::ObjectType;
use stylepak_types::ObjectId;
use thiserror::Error;

/// Result type alias using [`PackageError`].
pub type Result<T> = std::result::Result<T, PackageError>;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("package \"{0}\" is defined twice")]
    DuplicatePackage(ObjectId),

    #[error("package info block has no ID")]
    MissingPackageId,

    #[error("critical packages missing: {}", join_ids(.0))]
    MissingMandatory(Vec<ObjectId>),

    #[error("mandatory package \"{0}\" cannot be disabled")]
    MandatoryDisabled(ObjectId),

    #[error("{obj_type} \"{obj_id}\" is defined twice, in \"{pak1}\" and \"{pak2}\"")]
    DuplicateObject {
        obj_type: ObjectType,
        obj_id: ObjectId,
        pak1: ObjectId,
        pak2: ObjectId,
    },

    #[error("{obj_type} object in package \"{pak_id}\" has no ID")]
    MissingObjectId { obj_type: ObjectType, pak_id: ObjectId },

    #[error(
        "override for {obj_type} \"{obj_id}\" from package \"{pak_id}\" has no primary definition"
    )]
    OverrideWithoutPrimary {
        obj_type: ObjectType,
        obj_id: ObjectId,
        pak_id: ObjectId,
    },

    #[error("object type {0} is not registered")]
    UnregisteredType(ObjectType),

    #[error("cannot merge a {found} into a {expected}")]
    TypeMismatch { expected: ObjectType, found: ObjectType },

    #[error("{source_desc}: missing required field \"{field}\"")]
    MissingField {
        source_desc: String,
        field: &'static str,
    },

    #[error("loop in bases for style \"{0}\"")]
    StyleLoop(ObjectId),

    #[error(
        "loop in style references for item {item} (version {version}), not resolved: {}",
        .unresolved.join(", ")
    )]
    StyleRefLoop {
        item: ObjectId,
        version: ObjectId,
        unresolved: Vec<String>,
    },

    #[error(
        "item {item}'s {style} style (version {version}) referenced invalid style \"{target}\""
    )]
    InvalidStyleRef {
        item: ObjectId,
        version: ObjectId,
        style: ObjectId,
        target: String,
    },

    #[error("item {item}'s {style} style (version {version}) has both folder and style")]
    BothFolderAndStyle {
        item: ObjectId,
        version: ObjectId,
        style: ObjectId,
    },

    #[error("item {item}'s {style} style (version {version}) has no data source")]
    NoDataSource {
        item: ObjectId,
        version: ObjectId,
        style: ObjectId,
    },

    #[error("item \"{item}\"'s \"{style}\" style can't inherit from itself")]
    SelfInheritance { item: ObjectId, style: ObjectId },

    #[error("item \"{0}\" has no versions")]
    NoVersions(ObjectId),

    #[error("item \"{item}\" has version \"{version}\" with no styles defined")]
    EmptyVersion { item: ObjectId, version: ObjectId },

    #[error("item \"{item}\" defines version \"{version}\" twice")]
    DuplicateVersion { item: ObjectId, version: ObjectId },

    #[error("two definitions for item folder {item}.{version}.{style}")]
    DuplicateStyleDefinition {
        item: ObjectId,
        version: ObjectId,
        style: ObjectId,
    },

    #[error("\"{pak_id}:items/{folder}\" not valid, folder likely missing")]
    MissingFolder { pak_id: ObjectId, folder: String },

    #[error("\"{pak_id}:items/{folder}/editoritems.txt\" has no \"Item\" block")]
    NoEditorItems { pak_id: ObjectId, folder: String },

    #[error("unknown item option \"{key}\" in {source_desc}")]
    InvalidEditorItems { source_desc: String, key: String },

    #[error("invalid index \"{index}\" when modifying editoritems for {source_desc}")]
    InvalidSubtypeIndex { source_desc: String, index: String },

    #[error("cannot specify {what} for hidden editoritems blocks in {source_desc}")]
    PaletteInExtra {
        what: &'static str,
        source_desc: String,
    },

    #[error("cannot specify instances for multiple editoritems blocks in {source_desc}")]
    InstancesForMultiple { source_desc: String },

    #[error("item \"{item}\" has different visible subtypes in its styles: {counts}")]
    InconsistentSubtypes { item: ObjectId, counts: String },

    #[error("\"{0}\" has no files to pack")]
    NoPackFiles(ObjectId),

    #[error("failed to write options: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Types(#[from] stylepak_types::Error),

    #[error("error parsing {obj_type} {pak_id}:{obj_id}: {source}")]
    Object {
        obj_type: ObjectType,
        pak_id: ObjectId,
        obj_id: ObjectId,
        #[source]
        source: Box<PackageError>,
    },
}

impl PackageError {
    /// Wraps this error with the object that was being parsed.
    pub(crate) fn in_object(
        self,
        obj_type: ObjectType,
        pak_id: &ObjectId,
        obj_id: &ObjectId,
    ) -> Self {
        Self::Object {
            obj_type,
            pak_id: pak_id.clone(),
            obj_id: obj_id.clone(),
            source: Box::new(self),
        }
    }

    /// Strips any [`PackageError::Object`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &PackageError {
        match self {
            Self::Object { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn join_ids(ids: &[ObjectId]) -> String {
    ids.iter().map(ObjectId::as_str).collect::<Vec<_>>().join(", ")
}
