//! Groups of resource files packed into maps together.

use crate::error::{PackageError, Result};
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::ParseData;
use stylepak_types::{Keyvalues, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackList {
    id: ObjectId,
    pub files: Vec<String>,
}

impl PackList {
    /// The `PackList` export block: one `File` per entry.
    #[must_use]
    pub fn to_keyvalues(&self) -> Keyvalues {
        Keyvalues::block(
            self.id.as_str(),
            self.files.iter().map(|file| Keyvalues::leaf("File", file.as_str())).collect(),
        )
    }
}

fn file_entry(kv: &Keyvalues) -> Option<String> {
    let file = if kv.value().is_empty() {
        kv.real_name()
    } else {
        kv.value()
    };
    let file = file.trim();
    (!file.is_empty()).then(|| file.to_string())
}

impl PakObjectKind for PackList {
    const TYPE: ObjectType = ObjectType::PackList;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let mut files: Vec<String> = Vec::new();
        match data.info.find_key("Config") {
            Some(conf) if conf.has_children() => {
                files.extend(conf.children().iter().filter_map(file_entry));
            }
            Some(conf) if !conf.value().is_empty() => {
                // One leaf per file.
                let tree = data.fsys.read_tree(&format!("pack/{}.cfg", conf.value()))?;
                files.extend(tree.children().iter().filter_map(file_entry));
            }
            _ => {}
        }

        let legacy: Vec<&Keyvalues> = data.info.find_all("AddIfMat").collect();
        if !legacy.is_empty() {
            data.warn(format!("{}: AddIfMat is no longer used", data.source()));
        }
        files.extend(legacy.iter().map(|kv| format!("materials/{}.vmt", kv.value())));

        if files.is_empty() {
            return Err(PackageError::NoPackFiles(data.id.clone()));
        }
        Ok(Self {
            id: data.id.clone(),
            files,
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        for file in over.files {
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(PackList);
}
