// SPDX-License-Identifier: PMPL-1.0-or-later
//! Unordered, duplicate-free string sets.
//!
//! Legacy records stored sets as ordered lists or as `;`-separated strings.
//! Current records use [`StringSet`], whose equality ignores insertion order
//! and which cannot hold duplicates. The backing `BTreeSet` keeps the
//! serialized form stable, so re-running a migration writes identical bytes.

use std::collections::btree_set;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Separator used by legacy free-text multi-value fields.
pub const INFIELD_SEP: char = ';';

/// A set of string identifiers (destination ids, account ids, members...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringSet(BTreeSet<String>);

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a legacy `;`-separated value. Blank segments are ignored, so
    /// an empty string yields an empty set.
    pub fn parse(raw: &str) -> Self {
        raw.split(INFIELD_SEP)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn singleton(value: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.insert(value);
        set
    }

    /// Insert a value; returns false if it was already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.0.insert(value.into())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for StringSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a StringSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for StringSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
