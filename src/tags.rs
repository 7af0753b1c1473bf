// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Global tag registry
//!
//! The registry is the list of tags offered when editing a print. It is
//! independent of the tags recorded on prints: removing a tag here leaves
//! every print that carries it untouched.

use crate::ledger::PrintDraft;
use serde::{Deserialize, Deserializer, Serialize};

/// Result of registering a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAdded {
    /// The input was empty after trimming; nothing happened
    Empty,
    /// The tag was new and has been appended
    Added(String),
    /// The tag was already registered
    Known(String),
}

impl TagAdded {
    /// The trimmed tag, unless the input was empty
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Added(t) | Self::Known(t) => Some(t),
        }
    }

    /// Whether the registry changed and must be persisted
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Ordered set of known tags, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagRegistry {
    tags: Vec<String>,
}

impl TagRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from stored tags, trimming, dropping empties and
    /// duplicates
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for tag in tags {
            registry.register(tag.as_ref());
        }
        registry
    }

    /// Register `raw` and, when a draft is open, put the tag on it too.
    ///
    /// Whitespace is trimmed and empty input is ignored. The draft only
    /// gains the tag if it does not carry it already.
    pub fn add_tag(&mut self, raw: &str, draft: Option<&mut PrintDraft>) -> TagAdded {
        let added = self.register(raw);
        if let (Some(tag), Some(draft)) = (added.tag(), draft) {
            draft.add_tag(tag);
        }
        added
    }

    /// Remove `tag` from the registry only. Returns whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() < before
    }

    /// Exact, case-sensitive membership
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Registered tags in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Registered tags as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    /// Number of registered tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    fn register(&mut self, raw: &str) -> TagAdded {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return TagAdded::Empty;
        }
        if self.contains(trimmed) {
            return TagAdded::Known(trimmed.to_string());
        }
        self.tags.push(trimmed.to_string());
        TagAdded::Added(trimmed.to_string())
    }
}

impl<'de> Deserialize<'de> for TagRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::from_tags(raw))
    }
}
