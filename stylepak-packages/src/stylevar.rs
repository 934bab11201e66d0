//! Style-specific toggles.

use crate::error::Result;
use crate::object::{PakObjectKind, object_conversions};
use crate::object_type::ObjectType;
use crate::parsed::ParseData;
use crate::style::StyleChain;
use stylepak_types::{Keyvalues, ObjectId};

/// A feature which can be enabled or disabled, limited to some styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleVar {
    id: ObjectId,
    pub name: String,
    pub desc: String,
    pub default: bool,
    /// Child styles of a listed style also qualify.
    pub inherit: bool,
    /// `None` when the variable applies to every style.
    pub styles: Option<Vec<ObjectId>>,
}

impl StyleVar {
    /// A built-in variable available in all styles.
    pub fn unstyled(
        id: impl Into<ObjectId>,
        name: impl Into<String>,
        default: bool,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            desc: desc.into(),
            default,
            inherit: false,
            styles: None,
        }
    }

    #[must_use]
    pub fn is_unstyled(&self) -> bool {
        self.styles.is_none()
    }

    #[must_use]
    pub fn applies_to(&self, style: &StyleChain) -> bool {
        let Some(styles) = &self.styles else {
            return true;
        };
        if styles.contains(&style.id) {
            return true;
        }
        self.inherit && style.bases.iter().any(|base| styles.contains(base))
    }

    /// True when every one of `styles` qualifies.
    pub fn applies_to_all<'a>(&self, mut styles: impl Iterator<Item = &'a StyleChain>) -> bool {
        self.is_unstyled() || styles.all(|style| self.applies_to(style))
    }
}

impl PakObjectKind for StyleVar {
    const TYPE: ObjectType = ObjectType::StyleVar;

    fn parse(data: &ParseData<'_>) -> Result<Self> {
        let info = data.info;
        let styles = info
            .find_all("Style")
            .map(|kv| ObjectId::parse(kv.value()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let desc = info
            .find_all("description")
            .map(Keyvalues::value)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Self {
            id: data.id.clone(),
            name: info.get_or("name", "").to_string(),
            desc,
            default: info.bool("enabled", false),
            inherit: info.bool("inherit", true),
            styles: (!info.bool("unstyled", false)).then_some(styles),
        })
    }

    fn add_over(&mut self, over: Self) -> Result<()> {
        // Unstyled wins over any list.
        match over.styles {
            Some(theirs) => {
                if let Some(ours) = &mut self.styles {
                    ours.extend(theirs);
                }
            }
            None => self.styles = None,
        }

        if self.name.is_empty() {
            self.name = over.name;
        }

        let stripped = over.desc.trim();
        if !stripped.is_empty() && !self.desc.contains(stripped) {
            self.desc = if self.desc.trim().is_empty() {
                over.desc
            } else {
                format!("{}\n\n{}", self.desc, over.desc)
            };
        }
        Ok(())
    }

    fn id(&self) -> &ObjectId {
        &self.id
    }

    object_conversions!(StyleVar);
}
