//! Keyvalue trees, the parsed form of every package file.
//!
//! A node is either a leaf (`"name" "value"`) or a block holding an ordered
//! list of children. Names are matched ASCII case-insensitively, and repeated
//! names are allowed; single-value lookups take the last match.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The payload of a [`Keyvalues`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KvValue {
    Leaf(String),
    Block(Vec<Keyvalues>),
}

/// A single keyvalue node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyvalues {
    name: String,
    value: KvValue,
}

impl Keyvalues {
    /// Creates a leaf node.
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: KvValue::Leaf(value.into()),
        }
    }

    /// Creates a block node with the given children.
    pub fn block(name: impl Into<String>, children: Vec<Keyvalues>) -> Self {
        Self {
            name: name.into(),
            value: KvValue::Block(children),
        }
    }

    /// Creates an unnamed block, the shape of a whole parsed file.
    #[must_use]
    pub fn root(children: Vec<Keyvalues>) -> Self {
        Self::block("", children)
    }

    /// An unnamed block with no children.
    #[must_use]
    pub fn empty() -> Self {
        Self::root(Vec::new())
    }

    /// Parses a tree from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// The name as written.
    #[must_use]
    pub fn real_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// ASCII case-insensitive name check.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        matches!(self.value, KvValue::Block(_))
    }

    /// True for a block without children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.value {
            KvValue::Leaf(_) => false,
            KvValue::Block(children) => children.is_empty(),
        }
    }

    /// The leaf value, or `""` for blocks.
    #[must_use]
    pub fn value(&self) -> &str {
        match &self.value {
            KvValue::Leaf(value) => value,
            KvValue::Block(_) => "",
        }
    }

    /// Replaces the value, turning a block into a leaf if needed.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = KvValue::Leaf(value.into());
    }

    /// Children of a block; leaves have none.
    #[must_use]
    pub fn children(&self) -> &[Keyvalues] {
        match &self.value {
            KvValue::Leaf(_) => &[],
            KvValue::Block(children) => children,
        }
    }

    /// Mutable children. A leaf is converted into an empty block first.
    pub fn children_mut(&mut self) -> &mut Vec<Keyvalues> {
        if let KvValue::Leaf(_) = self.value {
            self.value = KvValue::Block(Vec::new());
        }
        match &mut self.value {
            KvValue::Block(children) => children,
            KvValue::Leaf(_) => unreachable!("leaf replaced above"),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyvalues> {
        self.children().iter()
    }

    /// Appends a child, converting a leaf into a block if needed.
    pub fn push(&mut self, child: Keyvalues) {
        self.children_mut().push(child);
    }

    /// The last child with this name.
    #[must_use]
    pub fn find_key(&self, name: &str) -> Option<&Keyvalues> {
        self.children().iter().rev().find(|kv| kv.is_named(name))
    }

    /// Every child with this name, in order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Keyvalues> + 'a {
        self.children().iter().filter(move |kv| kv.is_named(name))
    }

    /// The children of every block with this name, in order.
    pub fn find_children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Keyvalues> + 'a {
        self.find_all(name).flat_map(|kv| kv.children().iter())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.children().iter().any(|kv| kv.is_named(name))
    }

    /// The value of the last leaf with this name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.children()
            .iter()
            .rev()
            .find(|kv| kv.is_named(name) && !kv.has_children())
            .map(Keyvalues::value)
    }

    #[must_use]
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Reads a boolean leaf. Unrecognised or missing values give `default`.
    #[must_use]
    pub fn bool(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            Some(value) => parse_bool(value).unwrap_or(default),
            None => default,
        }
    }

    /// Reads an integer leaf, failing on values that are not numbers.
    pub fn int(&self, name: &str, default: i64) -> Result<i64, Error> {
        match self.get(name) {
            None => Ok(default),
            Some(value) if value.trim().is_empty() => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| Error::InvalidValue {
                key: name.to_string(),
                value: value.to_string(),
                expected: "an integer",
            }),
        }
    }

    /// A leaf as a one-element list, or the values of a block's children.
    #[must_use]
    pub fn as_array(&self) -> Vec<&str> {
        match &self.value {
            KvValue::Leaf(value) => vec![value.as_str()],
            KvValue::Block(children) => children.iter().map(Keyvalues::value).collect(),
        }
    }

    /// A new block holding our children followed by `other`'s.
    #[must_use]
    pub fn concat(&self, other: &Keyvalues) -> Keyvalues {
        let mut children = self.children().to_vec();
        children.extend_from_slice(other.children());
        Keyvalues::block(self.name.clone(), children)
    }

    /// Appends copies of all of `other`'s children.
    pub fn extend_from(&mut self, other: &Keyvalues) {
        let children = other.children().to_vec();
        self.children_mut().extend(children);
    }

    /// Removes every child with this name, returning them.
    pub fn take_all(&mut self, name: &str) -> Vec<Keyvalues> {
        if !self.has_children() {
            return Vec::new();
        }
        let children = std::mem::take(self.children_mut());
        let (taken, kept): (Vec<_>, Vec<_>) =
            children.into_iter().partition(|kv| kv.is_named(name));
        *self.children_mut() = kept;
        taken
    }
}

/// Lenient boolean conversion, matching how package authors write flags.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "t" => Some(true),
        "0" | "false" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

/// Splits a list of values on `,`, `;` or `/`, trimming blanks.
#[must_use]
pub fn sep_values(value: &str) -> Vec<String> {
    value
        .split([',', ';', '/'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
