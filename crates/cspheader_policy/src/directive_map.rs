//! Rendered directive storage and flattening.

use cspheader_core::Directive;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Rendered directive values keyed by directive, kept in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<Directive, String>", into = "IndexMap<Directive, String>")]
pub struct DirectiveMap {
    entries: IndexMap<Directive, String>,
}

impl DirectiveMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rendered text, returning the previous text for the directive
    ///
    /// Empty text is kept and means the directive is omitted from output.
    pub fn insert(&mut self, directive: Directive, text: impl Into<String>) -> Option<String> {
        let previous = self.entries.insert(directive, text.into());
        self.entries.sort_keys();
        previous
    }

    /// Rendered text for a directive
    #[must_use]
    pub fn get(&self, directive: Directive) -> Option<&str> {
        self.entries.get(&directive).map(String::as_str)
    }

    /// Whether the directive has an entry
    #[must_use]
    pub fn contains(&self, directive: Directive) -> bool {
        self.entries.contains_key(&directive)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Directive, &str)> {
        self.entries.iter().map(|(d, text)| (*d, text.as_str()))
    }

    /// Directives present, in canonical order
    pub fn directives(&self) -> impl Iterator<Item = Directive> + '_ {
        self.entries.keys().copied()
    }
}

impl Extend<(Directive, String)> for DirectiveMap {
    fn extend<T: IntoIterator<Item = (Directive, String)>>(&mut self, iter: T) {
        self.entries.extend(iter);
        self.entries.sort_keys();
    }
}

impl From<IndexMap<Directive, String>> for DirectiveMap {
    fn from(entries: IndexMap<Directive, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<DirectiveMap> for IndexMap<Directive, String> {
    fn from(map: DirectiveMap) -> Self {
        map.entries
    }
}

impl FromIterator<(Directive, String)> for DirectiveMap {
    fn from_iter<T: IntoIterator<Item = (Directive, String)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Header fragment for one directive, `None` when the text is empty
#[must_use]
pub fn fragment(directive: Directive, text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else if directive.takes_value() {
        Some(format!("{directive} {text};"))
    } else {
        Some(format!("{directive};"))
    }
}

/// Flatten static then dynamic directives into one header value.
///
/// A dynamic entry shadows a static entry of the same directive.
#[must_use]
pub fn flatten(static_directives: &DirectiveMap, dynamic_directives: &DirectiveMap) -> String {
    static_directives
        .iter()
        .filter(|(directive, _)| !dynamic_directives.contains(*directive))
        .chain(dynamic_directives.iter())
        .filter_map(|(directive, text)| fragment(directive, text))
        .collect::<Vec<_>>()
        .join(" ")
}
