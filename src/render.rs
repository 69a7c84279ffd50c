//! SQL assembly.
//!
//! Directives are applied in a fixed order regardless of how they were
//! authored: base text, `if`, `choose`, `set`, `foreach`, `where`, `trim`.
//! Each one appends to a single buffer, which is trimmed at the end.

use tracing::{debug, trace};

use crate::ast::{Choose, Conditional, Foreach, SetClause, TemplateTree, Trim, WhereClause};
use crate::error::Anomaly;
use crate::eval::Scope;
use crate::value::Value;

/// Render `tree` against `params`. Pure: neither argument is modified and
/// the same inputs always give the same SQL.
pub fn render(tree: &TemplateTree, params: &Value) -> String {
    Renderer::new(params).render(tree)
}

pub struct Renderer<'a> {
    scope: Scope<'a>,
}

impl<'a> Renderer<'a> {
    pub fn new(params: &'a Value) -> Self {
        Self {
            scope: Scope::new(params),
        }
    }

    pub fn render(&self, tree: &TemplateTree) -> String {
        let mut sql = tree.raw_text.clone();

        self.render_ifs(&tree.ifs, &mut sql);
        if let Some(choose) = &tree.choose {
            self.render_choose(choose, &mut sql);
        }
        if let Some(set) = &tree.set {
            self.render_set(set, &mut sql);
        }
        if let Some(foreach) = &tree.foreach {
            self.render_foreach(foreach, &mut sql);
        }
        if let Some(where_clause) = &tree.where_clause {
            self.render_where(where_clause, &mut sql);
        }
        if let Some(trim) = &tree.trim {
            render_trim(trim, &mut sql);
        }

        let sql = sql.trim().to_string();
        trace!(%sql, "rendered template");
        sql
    }

    fn render_ifs(&self, ifs: &[Conditional], out: &mut String) {
        for cond in ifs {
            if self.scope.evaluate(&cond.test) {
                out.push_str(cond.content.trim());
            }
        }
    }

    fn render_choose(&self, choose: &Choose, out: &mut String) {
        let chosen = choose
            .when
            .iter()
            .find(|when| self.scope.evaluate(&when.test))
            .map(|when| when.content.as_str())
            .or(choose.otherwise.as_deref());

        if let Some(content) = chosen {
            out.push_str(content.trim());
        }
    }

    fn render_set(&self, set: &SetClause, out: &mut String) {
        let assignments: Vec<&str> = set
            .fragments
            .iter()
            .filter(|frag| self.scope.evaluate(&frag.test))
            .map(|frag| frag.content.trim())
            .collect();

        // No empty SET.
        if !assignments.is_empty() {
            out.push_str(" SET ");
            out.push_str(&assignments.join(", "));
        }
    }

    fn render_foreach(&self, foreach: &Foreach, out: &mut String) {
        let collection = self.scope.lookup(&foreach.collection);
        let Value::Array(items) = collection.as_ref() else {
            let anomaly = Anomaly::NonSequenceCollection {
                path: foreach.collection.clone(),
                found: collection.kind(),
            };
            debug!(%anomaly, "foreach skipped");
            return;
        };

        let placeholder = foreach.placeholder();
        let parts: Vec<String> = items
            .iter()
            .map(|item| {
                let mut part = foreach.content.replace(&placeholder, &item.to_string());
                // Inner tests see the current element under the item name.
                let scope = self.scope.with_local(&foreach.item, item);
                for cond in &foreach.ifs {
                    if scope.evaluate(&cond.test) {
                        part.push_str(cond.content.trim());
                    }
                }
                part
            })
            .collect();

        out.push_str(&foreach.open);
        out.push_str(&parts.join(foreach.separator_or_default()));
        out.push_str(&foreach.close);
    }

    fn render_where(&self, where_clause: &WhereClause, out: &mut String) {
        let mut clause = String::new();

        for frag in &where_clause.fragments {
            let prefix = frag.prefix_or_default();
            let content = frag.content.trim();

            if self.scope.evaluate(&frag.test) {
                clause.push_str(&format!("{prefix} {content} "));
            } else if frag.test.contains("NOT NULL") {
                // Matches the text of the test, not the outcome of a null check.
                clause.push_str(&format!("{prefix} {content} IS NOT NULL "));
            } else if frag.test.contains("NULL") {
                clause.push_str(&format!("{prefix} {content} IS NULL "));
            }
        }

        if !clause.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(strip_leading_connective(clause.trim()));
        }
    }
}

fn render_trim(trim: &Trim, out: &mut String) {
    let mut content = trim.content.trim();

    for over in &trim.prefix_overrides {
        content = strip_leading_token(content, over.trim());
    }

    out.push_str(&format!("{} {} {}", trim.prefix, content, trim.suffix));
}

/// Drop one leading `AND`, `OR` or `NOT` (and the whitespace after it).
fn strip_leading_connective(clause: &str) -> &str {
    ["AND", "OR", "NOT"]
        .iter()
        .map(|keyword| strip_leading_token(clause, keyword))
        .find(|stripped| stripped.len() != clause.len())
        .unwrap_or(clause)
}

/// Remove `token` from the start of `text` when whitespace follows it.
fn strip_leading_token<'t>(text: &'t str, token: &str) -> &'t str {
    if token.is_empty() {
        return text;
    }
    match text.strip_prefix(token) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => text,
    }
}
