//! Voice line packs.

use crate::error::Result;
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::{ParseData, get_config};
use crate::selitem::SelitemData;
use std::collections::BTreeSet;
use stylepak_types::{Keyvalues, ObjectId};

/// Settings for showing the speaking character on the monitor screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub studio: String,
    pub studio_actor: String,
    /// `x y z`, as written.
    pub cam_loc: String,
    pub cam_angle: String,
    pub turret_hate: bool,
    pub interrupt: f64,
}

impl Monitor {
    fn parse(kv: &Keyvalues) -> Self {
        Self {
            studio: kv.get_or("studio", "").to_string(),
            studio_actor: kv.get_or("studio_actor", "").to_string(),
            cam_loc: kv.get_or("cam_loc", "0 0 0").to_string(),
            cam_angle: kv.get_or("cam_angle", "0 0 0").to_string(),
            turret_hate: kv.bool("turret_hate", false),
            interrupt: kv
                .get("interrupt_chance")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(0.0),
        }
    }
}

/// A set of voice lines chosen automatically when a map is compiled.
#[derive(Debug, Clone)]
pub struct QuotePack {
    id: ObjectId,
    pub selitem: SelitemData,
    /// Contents of `voice/<file>.cfg`.
    pub config: Keyvalues,
    pub characters: BTreeSet<String>,
    /// Portrait skin for Cave Johnson lines.
    pub cave_skin: Option<i64>,
    pub monitor: Option<Monitor>,
}

impl QuotePack {
    /// The `Quotes` block of the config, if any package supplied one.
    #[must_use]
    pub fn quotes(&self) -> Option<&Keyvalues> {
        self.config.find_key("Quotes")
    }
}

impl PakObjectKind for QuotePack {
    const TYPE: ObjectType = ObjectType::QuotePack;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let info = data.info;
        let characters = info
            .get_or("characters", "")
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        let cave_skin = info.get("caveSkin").and_then(|skin| skin.trim().parse().ok());

        Ok(Self {
            id: data.id.clone(),
            selitem: SelitemData::parse(info, data.pak_id),
            config: get_config(data.fsys, info, "voice", "file", ".cfg")?,
            characters,
            cave_skin,
            monitor: info.find_key("monitor").map(Monitor::parse),
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.selitem = self.selitem.merge(&over.selitem);
        self.config.extend_from(&over.config);
        if self.cave_skin.is_none() {
            self.cave_skin = over.cave_skin;
        }
        if self.monitor.is_none() {
            self.monitor = over.monitor;
        }
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(QuotePack);
}
