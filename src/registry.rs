use std::collections::HashMap;

use tracing::debug;

use crate::ast::TemplateTree;
use crate::error::{Error, Result};

/// Template trees keyed by `namespace.id`.
///
/// Filled once by whatever loads the template sources, then shared
/// read-only (see [`crate::Mapper`]).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    templates: HashMap<String, TemplateTree>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tree. A later registration under the same key replaces the
    /// earlier one.
    pub fn register(&mut self, key: impl Into<String>, tree: TemplateTree) {
        let key = key.into();
        if self.templates.insert(key.clone(), tree).is_some() {
            debug!(%key, "replaced template");
        } else {
            debug!(%key, "registered template");
        }
    }

    /// Register one statement of a mapper document under `namespace.id`.
    pub fn register_statement(&mut self, namespace: &str, id: &str, tree: TemplateTree) {
        self.register(qualified_key(namespace, id), tree);
    }

    pub fn get(&self, key: &str) -> Result<&TemplateTree> {
        self.templates.get(key).ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })
    }

    pub fn has(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

pub fn qualified_key(namespace: &str, id: &str) -> String {
    format!("{namespace}.{id}")
}

impl Extend<(String, TemplateTree)> for Registry {
    fn extend<I: IntoIterator<Item = (String, TemplateTree)>>(&mut self, iter: I) {
        for (key, tree) in iter {
            self.register(key, tree);
        }
    }
}

impl FromIterator<(String, TemplateTree)> for Registry {
    fn from_iter<I: IntoIterator<Item = (String, TemplateTree)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        registry.extend(iter);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_is_not_found() {
        let registry = Registry::new();
        assert_eq!(
            registry.get("no.such.id"),
            Err(Error::NotFound { key: "no.such.id".into() })
        );
        assert!(!registry.has("no.such.id"));
    }

    #[test]
    fn statement_keys_are_namespace_dot_id() {
        let mut registry = Registry::new();
        registry.register_statement("user", "findAll", TemplateTree::new("SELECT * FROM users"));
        assert!(registry.has("user.findAll"));
        assert_eq!(registry.get("user.findAll").unwrap().raw_text, "SELECT * FROM users");
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = Registry::new();
        registry.register("a.b", TemplateTree::new("first"));
        registry.register("a.b", TemplateTree::new("second"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a.b").unwrap().raw_text, "second");
    }

    #[test]
    fn collects_from_pairs() {
        let registry: Registry = vec![
            ("a.x".to_string(), TemplateTree::new("X")),
            ("a.y".to_string(), TemplateTree::new("Y")),
        ]
        .into_iter()
        .collect();
        let mut keys: Vec<_> = registry.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["a.x", "a.y"]);
        assert!(!registry.is_empty());
    }
}
