use indexmap::IndexMap;
use serde::Serialize;

/// Insertion-ordered map from field name to [`Value`].
///
/// Order is first-occurrence order of `d` delimiters, which is exactly
/// what [`indexmap::IndexMap`] preserves under repeated `insert` on an
/// already-present key.
pub type Map = IndexMap<String, Value>;

/// The ASLAN value tree: a tagged union of four arms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Sequence(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Whether this value counts as "empty" for the purposes of `o`
    /// open-vs-close decisions and append-separator placement.
    ///
    /// `collapse_whitespace` additionally treats all-whitespace Text as
    /// empty, matching `collapseObjectStartWhitespace`.
    pub fn is_empty_slot(&self, collapse_whitespace: bool) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty() || (collapse_whitespace && s.trim().is_empty()),
            Value::Sequence(_) | Value::Map(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }
}
