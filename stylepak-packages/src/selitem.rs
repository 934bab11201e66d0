//! Selector metadata shared by styles, voice packs, music and the like.

use std::collections::BTreeSet;
use stylepak_types::{Keyvalues, ObjectId, sep_values};
use tracing::warn;

/// Options displayed in the selector windows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelitemData {
    pub name: String,
    /// Shorter name for the icon, defaults to `name`.
    pub short_name: String,
    pub authors: BTreeSet<String>,
    pub icon: Option<String>,
    pub large_icon: Option<String>,
    pub desc: String,
    pub group: Option<String>,
    pub sort_key: String,
    /// Packages that contributed to this object.
    pub packages: BTreeSet<ObjectId>,
}

impl SelitemData {
    pub fn parse(info: &Keyvalues, pak_id: &ObjectId) -> Self {
        let name = info.get_or("name", "").to_string();
        let short_name = info.get("shortName").map_or_else(|| name.clone(), str::to_string);
        let sort_key = match info.get("sort_key") {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => name.clone(),
        };
        let icon = info.get("icon").map(str::to_string);
        let large_icon = info.get("iconLarge").map(str::to_string).or_else(|| icon.clone());

        Self {
            short_name,
            authors: sep_values(info.get_or("authors", "")).into_iter().collect(),
            icon,
            large_icon,
            desc: multiline(info, "description"),
            group: info.get("group").filter(|g| !g.is_empty()).map(str::to_string),
            sort_key,
            packages: BTreeSet::from([pak_id.clone()]),
            name,
        }
    }

    /// Joins override data into ours. Authors and descriptions are combined,
    /// the override's group wins when set.
    #[must_use]
    pub fn merge(&self, other: &SelitemData) -> SelitemData {
        SelitemData {
            authors: self.authors.union(&other.authors).cloned().collect(),
            desc: join_desc(&self.desc, &other.desc),
            group: other.group.clone().or_else(|| self.group.clone()),
            packages: self.packages.union(&other.packages).cloned().collect(),
            ..self.clone()
        }
    }

    /// The text for context menus: the short name when the full one is long.
    #[must_use]
    pub fn context_label(&self) -> &str {
        if self.name.chars().count() > 20 {
            &self.short_name
        } else {
            &self.name
        }
    }
}

/// Reads a key that may be repeated or written as a block of lines.
pub(crate) fn multiline(info: &Keyvalues, key: &str) -> String {
    let mut warned = false;
    let mut lines = Vec::new();
    for kv in info.find_all(key) {
        if kv.has_children() {
            for line in kv.children() {
                if !line.real_name().is_empty() && !warned {
                    warn!("Old desc format found, keys inside the block should be \"\"");
                    warned = true;
                }
                lines.push(line.value());
            }
        } else {
            lines.push(kv.value());
        }
    }
    lines.join("\n")
}

pub(crate) fn join_desc(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (_, true) => first.to_string(),
        (true, false) => second.to_string(),
        (false, false) => format!("{first}\n{second}"),
    }
}
