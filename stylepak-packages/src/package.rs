//! Content packages and the scan that collects their object blocks.

use crate::error::{PackageError, Result};
use crate::fsys::FsHandle;
use crate::object_type::TypeRegistry;
use crate::options::PackageConfig;
use crate::parsed::{ObjData, ParsedObjectStore, Warnings};
use stylepak_types::{Keyvalues, ObjectId};
use tracing::{debug, info, warn};

/// Packages which hold essential resources and can never be disabled.
pub const MANDATORY_PACKAGES: [&str; 2] = ["BEE2_CLEAN_STYLE", "BEE2_CORE"];

/// Info keys that describe the package rather than declare objects.
const PACKAGE_KEYS: [&str; 5] = ["id", "name", "prerequisites", "desc", "description"];

/// Something a package needs before it can be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    Package(ObjectId),
    /// Music from the Aperture Tag mod must be present.
    TagMusic,
    /// Music from Portal Stories: Mel must be present.
    MelMusic,
}

impl Prerequisite {
    pub fn parse(value: &str) -> Result<Self> {
        let id = ObjectId::parse(value)?;
        Ok(if id.matches("<TAG_MUSIC>") {
            Self::TagMusic
        } else if id.matches("<MEL_MUSIC>") {
            Self::MelMusic
        } else {
            Self::Package(id)
        })
    }
}

/// A loaded content bundle.
#[derive(Debug, Clone)]
pub struct Package {
    id: ObjectId,
    fsys: FsHandle,
    info: Keyvalues,
    disp_name: String,
    desc: String,
    prerequisites: Vec<Prerequisite>,
    fingerprint: u64,
}

impl Package {
    /// Builds a package from its parsed `info.txt`.
    ///
    /// `fingerprint` identifies the package file's current version, 0 when
    /// unknown.
    pub fn new(fsys: FsHandle, info: Keyvalues, fingerprint: u64) -> Result<Self> {
        let id = ObjectId::parse(info.get("ID").ok_or(PackageError::MissingPackageId)?)?;

        let disp_name = match info.get("Name") {
            Some(name) => name.to_string(),
            None => {
                warn!(package = %id, "Package has no display name");
                id.as_str().to_lowercase()
            }
        };

        let desc = info
            .children()
            .iter()
            .filter(|kv| kv.is_named("desc") || kv.is_named("description"))
            .flat_map(Keyvalues::as_array)
            .collect::<Vec<_>>()
            .join("\n");

        let prerequisites = info
            .find_children("Prerequisites")
            .map(|kv| Prerequisite::parse(kv.value()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            fsys,
            info,
            disp_name,
            desc,
            prerequisites,
            fingerprint,
        })
    }

    /// Opens a package by reading `info.txt` from its filesystem.
    pub fn open(fsys: FsHandle, fingerprint: u64) -> Result<Self> {
        let info = fsys.read_tree("info.txt")?;
        Self::new(fsys, info, fingerprint)
    }

    #[must_use]
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    #[must_use]
    pub fn fsys(&self) -> &FsHandle {
        &self.fsys
    }

    #[must_use]
    pub fn info(&self) -> &Keyvalues {
        &self.info
    }

    #[must_use]
    pub fn disp_name(&self) -> &str {
        &self.disp_name
    }

    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    #[must_use]
    pub fn prerequisites(&self) -> &[Prerequisite] {
        &self.prerequisites
    }

    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        MANDATORY_PACKAGES.iter().any(|id| self.id.matches(id))
    }

    /// Should this package be loaded?
    #[must_use]
    pub fn enabled(&self, config: &PackageConfig) -> bool {
        self.is_mandatory() || config.is_enabled(&self.id)
    }

    pub fn set_enabled(&self, config: &mut PackageConfig, enabled: bool) -> Result<()> {
        if self.is_mandatory() {
            return Err(PackageError::MandatoryDisabled(self.id.clone()));
        }
        config.set(&self.id, enabled);
        Ok(())
    }

    /// Unzipped packages are development versions.
    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.fsys.is_dev()
    }

    /// Whether resources must be re-extracted, given the fingerprint stored
    /// after the last extraction.
    #[must_use]
    pub fn is_stale(&self, enabled: bool, stored: u64) -> bool {
        if self.is_dev() {
            info!(package = %self.id, "Need to extract resources, package is unzipped");
            return true;
        }
        if enabled {
            if stored == 0 || stored != self.fingerprint {
                info!(package = %self.id, "Need to extract resources, package is stale");
                return true;
            }
        } else if stored != 0 {
            info!(package = %self.id, "Need to extract resources, package was previously enabled");
            return true;
        }
        false
    }

    /// The fingerprint to store once resources are extracted.
    #[must_use]
    pub fn current_fingerprint(&self, enabled: bool) -> u64 {
        if self.is_dev() || !enabled {
            0
        } else {
            self.fingerprint
        }
    }
}

/// Collects every object block declared in `pkg` into `store`.
pub fn scan_package(
    store: &mut ParsedObjectStore,
    registry: &TypeRegistry,
    pkg: &Package,
    warnings: &Warnings,
) -> Result<()> {
    let mut found = 0usize;
    for obj in pkg.info.children() {
        if PACKAGE_KEYS.iter().any(|key| obj.is_named(key)) {
            continue;
        }
        if !obj.has_children() {
            warnings.push(
                &pkg.id,
                format!(
                    "Unknown package option \"{}\" with value \"{}\"",
                    obj.real_name(),
                    obj.value()
                ),
            );
            continue;
        }

        if obj.is_named("Overrides") {
            for over in obj.children() {
                let Some(info) = registry.lookup(over.real_name()) else {
                    warn_unknown_type(pkg, over, warnings);
                    continue;
                };
                let obj_id = object_id(over, pkg, info.obj_type)?;
                store.add_override(info.obj_type, obj_id, obj_data(pkg, over));
                found += 1;
            }
            continue;
        }

        let Some(info) = registry.lookup(obj.real_name()) else {
            warn_unknown_type(pkg, obj, warnings);
            continue;
        };
        let obj_id = object_id(obj, pkg, info.obj_type)?;
        store.add(info, obj_id, obj_data(pkg, obj))?;
        found += 1;
    }
    debug!(package = %pkg.id, objects = found, "Scanned package");
    Ok(())
}

fn object_id(block: &Keyvalues, pkg: &Package, obj_type: crate::ObjectType) -> Result<ObjectId> {
    let raw = block.get("ID").ok_or_else(|| PackageError::MissingObjectId {
        obj_type,
        pak_id: pkg.id.clone(),
    })?;
    ObjectId::parse(raw).map_err(|_| PackageError::MissingObjectId {
        obj_type,
        pak_id: pkg.id.clone(),
    })
}

fn obj_data(pkg: &Package, block: &Keyvalues) -> ObjData {
    ObjData {
        fsys: pkg.fsys.clone(),
        info: block.clone(),
        pak_id: pkg.id.clone(),
        disp_name: pkg.disp_name.clone(),
    }
}

fn warn_unknown_type(pkg: &Package, block: &Keyvalues, warnings: &Warnings) {
    warnings.push(
        &pkg.id,
        format!(
            "Unknown object type \"{}\" with ID \"{}\"",
            block.real_name(),
            block.get_or("ID", "<NO ID>"),
        ),
    );
}
