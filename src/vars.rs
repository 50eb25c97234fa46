// SPDX: CC0-1.0

use crate::{lex, Number};
use std::collections::{HashMap, HashSet};

/// Variables every new equation starts with, all bound to zero.
pub const DEFAULT_VARS: [&str; 6] = ["a", "b", "c", "x", "y", "t"];

/// Values of the user's declared variables, looked up by name whenever an
/// expression is evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct VarEnv {
    vars: HashMap<String, Number>,
}

impl Default for VarEnv {
    fn default() -> Self {
        Self {
            vars: DEFAULT_VARS
                .iter()
                .map(|name| (name.to_string(), 0.0))
                .collect(),
        }
    }
}

impl VarEnv {
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: Number) {
        if let Some(old) = self.vars.get_mut(name) {
            *old = value;
        } else {
            self.vars.insert(name.to_string(), value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Number> {
        self.vars.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Number> {
        self.vars.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn snapshot(&self) -> HashMap<String, Number> {
        self.vars.clone()
    }

    pub fn names(&self) -> HashSet<String> {
        self.vars.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Number)> {
        self.vars.iter().map(|(name, val)| (name.as_str(), *val))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl FromIterator<(String, Number)> for VarEnv {
    fn from_iter<I: IntoIterator<Item = (String, Number)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Whether `name` can be used as a variable. Purely lexical: the name does not
/// need to be declared.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => lex::is_ident_start(first) && chars.all(lex::is_ident_continue),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zeroed() {
        let env = VarEnv::default();
        assert_eq!(env.len(), DEFAULT_VARS.len());
        for name in DEFAULT_VARS {
            assert_eq!(env.get(name), Some(0.0));
        }
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut env = VarEnv::default();
        let snap = env.snapshot();
        env.set("k", 4.0);
        env.remove("a");
        assert!(!snap.contains_key("k"));
        assert_eq!(snap.get("a"), Some(&0.0));
        assert_eq!(env.get("k"), Some(4.0));
        assert_eq!(env.get("a"), None);
    }

    #[test]
    fn names() {
        for ok in ["_", "a", "_Ab9", "theta", "x2"] {
            assert!(is_valid_name(ok), "{ok}");
        }
        for bad in ["", "0a", "$a", "a b", "a-b", "é"] {
            assert!(!is_valid_name(bad), "{bad}");
        }
    }
}
