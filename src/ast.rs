//! In-memory form of one query definition.
//!
//! Every directive is optional and independent. Field names on the serde
//! side follow the template source format (`rawText`, `prefixOverrides`,
//! `if`, `where`, ...), so a loader can hand trees over as JSON.

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_WHERE_PREFIX: &str = "AND";
pub const DEFAULT_SEPARATOR: &str = ",";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTree {
    #[serde(default)]
    pub raw_text: String,
    #[serde(default, rename = "if", skip_serializing_if = "Vec::is_empty")]
    pub ifs: Vec<Conditional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choose: Option<Choose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<SetClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreach: Option<Foreach>,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<Trim>,
}

impl TemplateTree {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    pub fn with_if(mut self, test: impl Into<String>, content: impl Into<String>) -> Self {
        self.ifs.push(Conditional::new(test, content));
        self
    }

    pub fn with_choose(mut self, choose: Choose) -> Self {
        self.choose = Some(choose);
        self
    }

    pub fn with_set(mut self, set: SetClause) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_foreach(mut self, foreach: Foreach) -> Self {
        self.foreach = Some(foreach);
        self
    }

    pub fn with_where(mut self, where_clause: WhereClause) -> Self {
        self.where_clause = Some(where_clause);
        self
    }

    pub fn with_trim(mut self, trim: Trim) -> Self {
        self.trim = Some(trim);
        self
    }

    /// True when only `raw_text` contributes to the output.
    pub fn is_static(&self) -> bool {
        self.ifs.is_empty()
            && self.choose.is_none()
            && self.set.is_none()
            && self.foreach.is_none()
            && self.where_clause.is_none()
            && self.trim.is_none()
    }
}

/// A `test` expression guarding a text fragment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conditional {
    pub test: String,
    #[serde(default)]
    pub content: String,
}

impl Conditional {
    pub fn new(test: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            content: content.into(),
        }
    }
}

/// `<choose>`: first matching `when`, else `otherwise`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Choose {
    #[serde(default)]
    pub when: Vec<Conditional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<String>,
}

impl Choose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, test: impl Into<String>, content: impl Into<String>) -> Self {
        self.when.push(Conditional::new(test, content));
        self
    }

    pub fn otherwise(mut self, content: impl Into<String>) -> Self {
        self.otherwise = Some(content.into());
        self
    }
}

/// `<set>`: comma-joined assignments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetClause {
    #[serde(default, rename = "if")]
    pub fragments: Vec<Conditional>,
}

impl SetClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragment(mut self, test: impl Into<String>, content: impl Into<String>) -> Self {
        self.fragments.push(Conditional::new(test, content));
        self
    }
}

/// `<foreach>`: expands `content` once per element of `collection`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Foreach {
    /// Dotted path into the parameter bag.
    pub collection: String,
    /// Placeholder name, referenced as `#{item}` in `content` and as a
    /// plain name in inner tests.
    pub item: String,
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "if", skip_serializing_if = "Vec::is_empty")]
    pub ifs: Vec<Conditional>,
}

impl Foreach {
    pub fn new(
        collection: impl Into<String>,
        item: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            item: item.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn open(mut self, open: impl Into<String>) -> Self {
        self.open = open.into();
        self
    }

    pub fn close(mut self, close: impl Into<String>) -> Self {
        self.close = close.into();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn with_if(mut self, test: impl Into<String>, content: impl Into<String>) -> Self {
        self.ifs.push(Conditional::new(test, content));
        self
    }

    /// Missing or empty separators fall back to `,`.
    pub fn separator_or_default(&self) -> &str {
        match self.separator.as_deref() {
            Some(sep) if !sep.is_empty() => sep,
            _ => DEFAULT_SEPARATOR,
        }
    }

    /// The literal token replaced by each element, e.g. `#{id}`.
    pub fn placeholder(&self) -> String {
        format!("#{{{}}}", self.item)
    }
}

/// `<where>`: conditions joined by their prefixes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(default, rename = "if")]
    pub fragments: Vec<WhereFragment>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragment(mut self, test: impl Into<String>, content: impl Into<String>) -> Self {
        self.fragments.push(WhereFragment {
            test: test.into(),
            content: content.into(),
            prefix: None,
        });
        self
    }

    pub fn prefixed(
        mut self,
        prefix: impl Into<String>,
        test: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.fragments.push(WhereFragment {
            test: test.into(),
            content: content.into(),
            prefix: Some(prefix.into()),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WhereFragment {
    pub test: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl WhereFragment {
    /// Missing or empty prefixes fall back to `AND`.
    pub fn prefix_or_default(&self) -> &str {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => DEFAULT_WHERE_PREFIX,
        }
    }
}

/// `<trim>`: strips leading keywords, then wraps in prefix/suffix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trim {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default, deserialize_with = "deserialize_overrides")]
    pub prefix_overrides: Vec<String>,
    #[serde(default)]
    pub content: String,
}

impl Trim {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Takes the source form, e.g. `"AND |OR "`.
    pub fn prefix_overrides(mut self, source: &str) -> Self {
        self.prefix_overrides = split_overrides(source);
        self
    }
}

/// Split a pipe-delimited override list, trimming entries and dropping
/// empty ones.
pub fn split_overrides(source: &str) -> Vec<String> {
    source
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_overrides<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Overrides {
        Piped(String),
        List(Vec<String>),
    }

    Ok(match Overrides::deserialize(deserializer)? {
        Overrides::Piped(source) => split_overrides(&source),
        Overrides::List(items) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
