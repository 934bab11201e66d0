//! Selector-window objects: music, skyboxes and elevator videos.

use crate::error::Result;
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::{ParseData, get_config};
use crate::selitem::SelitemData;
use std::collections::BTreeMap;
use stylepak_types::{Keyvalues, ObjectId};

/// Categories of music played in a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MusicChannel {
    Base,
    /// Excursion funnel audio.
    Tbeam,
    BounceGel,
    SpeedGel,
}

impl MusicChannel {
    pub const ALL: [MusicChannel; 4] = [Self::Base, Self::Tbeam, Self::BounceGel, Self::SpeedGel];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Tbeam => "tbeam",
            Self::BounceGel => "bouncegel",
            Self::SpeedGel => "speedgel",
        }
    }
}

/// Background music for the map.
#[derive(Debug, Clone)]
pub struct Music {
    id: ObjectId,
    pub selitem: SelitemData,
    pub config: Keyvalues,
    /// Sound files per channel.
    pub sounds: BTreeMap<MusicChannel, Vec<String>>,
    /// Music ids supplying a channel this track lacks.
    pub children: BTreeMap<MusicChannel, String>,
    pub instance: Option<String>,
    pub pack: Vec<String>,
    /// Loop length in seconds.
    pub loop_len: u32,
    pub sync_funnel: bool,
}

impl Music {
    /// True if this track supplies audio for `channel` itself.
    #[must_use]
    pub fn provides_channel(&self, channel: MusicChannel) -> bool {
        self.sounds.get(&channel).is_some_and(|sounds| !sounds.is_empty())
            || (channel == MusicChannel::Base && self.instance.is_some())
    }
}

/// Reads `m:ss` or plain seconds. Unparseable parts count as zero.
fn parse_loop_len(value: &str) -> u32 {
    let conv = |part: &str| part.trim().parse::<u32>().unwrap_or(0);
    match value.split_once(':') {
        Some((minutes, seconds)) => 60 * conv(minutes) + conv(seconds),
        None => conv(value),
    }
}

impl PakObjectKind for Music {
    const TYPE: ObjectType = ObjectType::Music;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let info = data.info;
        let mut sounds: BTreeMap<MusicChannel, Vec<String>> =
            MusicChannel::ALL.into_iter().map(|channel| (channel, Vec::new())).collect();
        let mut sync_funnel = false;
        match info.find_key("soundscript") {
            Some(sound) if sound.has_children() => {
                for channel in MusicChannel::ALL {
                    let files = sounds.entry(channel).or_default();
                    for kv in sound.find_all(channel.key()) {
                        files.extend(kv.as_array().into_iter().map(str::to_string));
                    }
                }
                sync_funnel = sound.bool("sync_funnel", false);
            }
            Some(sound) => {
                sounds.insert(MusicChannel::Base, vec![sound.value().to_string()]);
            }
            None => {}
        }

        let children = match info.find_key("children") {
            Some(block) => MusicChannel::ALL
                .into_iter()
                .filter(|channel| *channel != MusicChannel::Base)
                .filter_map(|channel| {
                    let child = block.get_or(channel.key(), "");
                    (!child.is_empty()).then(|| (channel, child.to_string()))
                })
                .collect(),
            None => BTreeMap::new(),
        };

        Ok(Self {
            id: data.id.clone(),
            selitem: SelitemData::parse(info, data.pak_id),
            config: get_config(data.fsys, info, "music", "config", ".cfg")?,
            sounds,
            children,
            instance: info.get("instance").map(str::to_string),
            pack: info.find_all("pack").map(|kv| kv.value().to_string()).collect(),
            loop_len: parse_loop_len(info.get_or("loop_len", "0")),
            sync_funnel,
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.config.extend_from(&over.config);
        self.selitem = self.selitem.merge(&over.selitem);
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(Music);
}

/// Skybox and fog settings.
#[derive(Debug, Clone)]
pub struct Skybox {
    id: ObjectId,
    pub selitem: SelitemData,
    pub config: Keyvalues,
    pub material: String,
    /// Unsets `r_skybox_draw_last`, which some skyboxes need.
    pub draw_first: bool,
    pub fog: Keyvalues,
}

impl Skybox {
    /// The primary fog colour, white if unset.
    #[must_use]
    pub fn fog_color(&self) -> &str {
        self.fog.get_or("primarycolor", "255 255 255")
    }

    /// Skyboxes with their own config are 3D.
    #[must_use]
    pub fn is_3d(&self) -> bool {
        !self.config.is_empty()
    }
}

impl PakObjectKind for Skybox {
    const TYPE: ObjectType = ObjectType::Skybox;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let info = data.info;
        Ok(Self {
            id: data.id.clone(),
            selitem: SelitemData::parse(info, data.pak_id),
            config: get_config(data.fsys, info, "skybox", "config", ".cfg")?,
            material: info.get_or("material", "sky_black").to_string(),
            draw_first: info.bool("sky_draw_first", false),
            fog: info
                .find_key("Fog")
                .cloned()
                .unwrap_or_else(|| Keyvalues::block("Fog", Vec::new())),
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.selitem = self.selitem.merge(&over.selitem);
        self.config.extend_from(&over.config);
        self.fog.extend_from(&over.fog);
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(Skybox);
}

/// The video shown in the arrival elevator.
#[derive(Debug, Clone)]
pub struct Elevator {
    id: ObjectId,
    pub selitem: SelitemData,
    /// The horizontal video when a vertical one is also given.
    pub video: String,
    pub vert_video: Option<String>,
}

impl Elevator {
    /// Elevators with separate videos depend on the screen orientation.
    #[must_use]
    pub fn has_orient(&self) -> bool {
        self.vert_video.is_some()
    }
}

impl PakObjectKind for Elevator {
    const TYPE: ObjectType = ObjectType::Elevator;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let (video, vert_video) = match data.info.get("vert_video") {
            Some(vert) => (data.required("horiz_video")?, Some(vert.to_string())),
            None => (data.required("video")?, None),
        };
        Ok(Self {
            id: data.id.clone(),
            selitem: SelitemData::parse(data.info, data.pak_id),
            video: video.to_string(),
            vert_video,
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        self.selitem = self.selitem.merge(&over.selitem);
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(Elevator);
}
