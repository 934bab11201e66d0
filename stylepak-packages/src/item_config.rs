//! Extra configuration attached to an item from any package.

use crate::error::Result;
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::{ParseData, get_config};
use crate::item::DEFAULT_VERSION;
use std::collections::BTreeMap;
use stylepak_types::{Keyvalues, ObjectId};

/// Config added to an item. The id matches the item's id.
#[derive(Debug, Clone)]
pub struct ItemConfig {
    id: ObjectId,
    pub all_conf: Keyvalues,
    /// Version id, then style id.
    pub versions: BTreeMap<ObjectId, BTreeMap<ObjectId, Keyvalues>>,
}

impl ItemConfig {
    /// The config for the first style along `bases` that has one.
    #[must_use]
    pub fn config_for(&self, version: &ObjectId, bases: &[ObjectId]) -> Option<&Keyvalues> {
        let styles = self.versions.get(version)?;
        bases.iter().find_map(|style| styles.get(style))
    }
}

impl PakObjectKind for ItemConfig {
    const TYPE: ObjectType = ObjectType::ItemConfig;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let mut versions: BTreeMap<ObjectId, BTreeMap<ObjectId, Keyvalues>> = BTreeMap::new();
        for ver in data.info.find_all("Version") {
            let ver_id = ObjectId::parse(ver.get_or("ID", DEFAULT_VERSION))?;
            let styles = versions.entry(ver_id).or_default();
            for style in ver.find_children("Styles") {
                let conf = data.fsys.read_tree(&format!("items/{}.cfg", style.value()))?;
                styles.insert(ObjectId::parse(style.real_name())?, conf);
            }
        }

        Ok(Self {
            id: data.id.clone(),
            all_conf: get_config(data.fsys, data.info, "items", "all_conf", ".cfg")?,
            versions,
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.all_conf.extend_from(&over.all_conf);
        for (ver_id, styles) in over.versions {
            let ours = self.versions.entry(ver_id).or_default();
            for (style_id, conf) in styles {
                ours.entry(style_id)
                    .and_modify(|existing| existing.extend_from(&conf))
                    .or_insert(conf);
            }
        }
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(ItemConfig);
}
