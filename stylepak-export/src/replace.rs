//! `%variable%` substitution in config trees.

use crate::error::{ExportError, Result};
use regex_lite::Regex;
use std::collections::BTreeMap;
use stylepak_types::Keyvalues;

/// Names surrounded by percents. An empty name is the `%%` escape.
const PERCENT_VAR: &str = r"%(\w*)%";

struct Substitution<'a> {
    pattern: Regex,
    vars: BTreeMap<String, String>,
    source_desc: &'a str,
}

/// Returns a copy of `conf` with its variables filled in.
///
/// Variables are declared in top-level `Replacements` blocks, which are
/// removed from the result. Every `%name%` in a key or leaf value is replaced
/// with the declared value and `%%` becomes a literal `%`. Names are matched
/// case-insensitively. Using an undeclared name is an error.
pub fn apply_replacements(conf: &Keyvalues, source_desc: &str) -> Result<Keyvalues> {
    let mut conf = conf.clone();
    let mut vars = BTreeMap::new();
    for block in conf.take_all("Replacements") {
        for var in block.children() {
            vars.insert(var.real_name().trim_matches('%').to_lowercase(), var.value().to_string());
        }
    }

    let subst = Substitution {
        pattern: Regex::new(PERCENT_VAR)?,
        vars,
        source_desc,
    };
    for child in conf.children_mut() {
        subst.tree(child)?;
    }
    Ok(conf)
}

impl Substitution<'_> {
    fn tree(&self, kv: &mut Keyvalues) -> Result<()> {
        let name = self.text(kv.real_name())?;
        kv.set_name(name);
        if kv.has_children() {
            for child in kv.children_mut() {
                self.tree(child)?;
            }
        } else {
            let value = self.text(kv.value())?;
            kv.set_value(value);
        }
        Ok(())
    }

    fn text(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in self.pattern.captures_iter(text) {
            let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.lookup(var.as_str())?);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    fn lookup(&self, var: &str) -> Result<String> {
        if var.is_empty() {
            return Ok("%".to_string());
        }
        self.vars
            .get(&var.to_lowercase())
            .cloned()
            .ok_or_else(|| ExportError::UnresolvedVariable {
                source_desc: self.source_desc.to_string(),
                var: var.to_string(),
                valid: self.vars.keys().cloned().collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subst(vars: &[(&str, &str)]) -> Substitution<'static> {
        Substitution {
            pattern: Regex::new(PERCENT_VAR).unwrap(),
            vars: vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            source_desc: "test",
        }
    }

    #[test]
    fn double_percent_is_literal() {
        assert_eq!(subst(&[]).text("100%% sure").unwrap(), "100% sure");
    }

    #[test]
    fn lone_percent_is_kept() {
        assert_eq!(subst(&[]).text("50% off").unwrap(), "50% off");
        assert_eq!(subst(&[]).text("a % b %").unwrap(), "a % b %");
    }

    #[test]
    fn names_match_case_insensitively() {
        assert_eq!(subst(&[("speed", "150")]).text("%Speed%/%SPEED%").unwrap(), "150/150");
    }
}
