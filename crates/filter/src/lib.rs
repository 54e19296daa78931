//! The receiver/action/actor inclusion-exclusion predicate (spec.md
//! §4.5), grounded on `filter_include` in
//! `examples/original_source/elasticsearch_plugin.cpp`.

use std::collections::BTreeSet;

use model::Name;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("filter entry {0:?} must have exactly 3 colon-separated fields (receiver:action:actor)")]
    WrongFieldCount(String),

    #[error("filter entry {0:?} contains a field that is not a valid name")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One `(receiver, action, actor)` triple; `Name::EMPTY` in any
/// position is a wildcard for that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterEntry {
    pub receiver: Name,
    pub action: Name,
    pub actor: Name,
}

impl FilterEntry {
    pub fn new(receiver: Name, action: Name, actor: Name) -> Self {
        Self { receiver, action, actor }
    }

    /// Parses a `receiver:action:actor` config string. Each field may
    /// be empty, which parses to `Name::EMPTY` (the wildcard).
    pub fn parse(s: &str) -> Result<FilterEntry> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(Error::WrongFieldCount(s.to_string()));
        }
        let mut names = [Name::EMPTY; 3];
        for (i, part) in parts.iter().enumerate() {
            names[i] = Name::parse(part).ok_or_else(|| Error::InvalidName(s.to_string()))?;
        }
        Ok(FilterEntry::new(names[0], names[1], names[2]))
    }
}

/// The action receiver/name/authorization shape a predicate is
/// evaluated against — deliberately independent of
/// `model::events::ActionTrace` so this crate doesn't need the
/// `model` crate's event types, only its `Name`.
pub struct Action<'a> {
    pub receiver: Name,
    pub action: Name,
    pub actors: &'a [Name],
}

/// Sorted `filter_on`/`filter_out` sets plus the `filter_on_star`
/// override (spec.md §4.5).
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub filter_on_star: bool,
    pub filter_on: BTreeSet<FilterEntry>,
    pub filter_out: BTreeSet<FilterEntry>,
}

impl Filter {
    /// Builds a filter from raw `filter_on`/`filter_out` config
    /// strings. A `filter_on` entry of exactly `"*"` turns on
    /// `filter_on_star` instead of being parsed as a triple —
    /// matching `--elastic-filter-on` in the original plugin. An
    /// empty `filter_on` list (no entries, no `"*"`) defaults to
    /// `filter_on_star = true`, the original's default when the
    /// option is unset at all.
    pub fn from_config<'a>(
        filter_on: impl IntoIterator<Item = &'a str>,
        filter_out: impl IntoIterator<Item = &'a str>,
    ) -> Result<Filter> {
        let mut filter_on_star = false;
        let mut on = BTreeSet::new();
        let mut saw_any_on = false;
        for s in filter_on {
            saw_any_on = true;
            if s == "*" {
                filter_on_star = true;
                break;
            }
            on.insert(FilterEntry::parse(s)?);
        }
        if !saw_any_on {
            filter_on_star = true;
        }

        let mut out = BTreeSet::new();
        for s in filter_out {
            out.insert(FilterEntry::parse(s)?);
        }

        Ok(Filter {
            filter_on_star,
            filter_on: on,
            filter_out: out,
        })
    }

    /// `true` if `action` should be indexed.
    pub fn include(&self, action: &Action<'_>) -> bool {
        let included = self.filter_on_star
            || self
                .filter_on
                .contains(&FilterEntry::new(action.receiver, action.action, Name::EMPTY))
            || action
                .actors
                .iter()
                .any(|actor| self.filter_on.contains(&FilterEntry::new(action.receiver, action.action, *actor)));

        if !included {
            return false;
        }

        if self
            .filter_out
            .contains(&FilterEntry::new(action.receiver, Name::EMPTY, Name::EMPTY))
        {
            return false;
        }
        if self
            .filter_out
            .contains(&FilterEntry::new(action.receiver, action.action, Name::EMPTY))
        {
            return false;
        }
        !action
            .actors
            .iter()
            .any(|actor| self.filter_out.contains(&FilterEntry::new(action.receiver, action.action, *actor)))
    }
}
