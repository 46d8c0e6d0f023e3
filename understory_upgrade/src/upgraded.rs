// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The persisted list of component types an element has been upgraded with.

use alloc::string::{String, ToString};
use core::fmt;

use smallvec::SmallVec;
use understory_element_tree::{Document, NodeId};

/// Ordered, duplicate-free set of component type ids.
///
/// The list is stored on the element itself as a comma-separated attribute value
/// (`"MaterialButton,MaterialRipple"`), so it is the source of truth for
/// idempotence and survives anything that keeps the element alive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpgradedList {
    types: SmallVec<[String; 4]>,
}

impl UpgradedList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an attribute value.
    ///
    /// Empty segments are skipped and repeated ids keep their first position.
    pub fn parse(value: &str) -> Self {
        let mut list = Self::new();
        for type_id in value.split(',').filter(|s| !s.is_empty()) {
            list.insert(type_id);
        }
        list
    }

    /// Read the list stored on `element` under `attribute`.
    ///
    /// A missing attribute reads as an empty list.
    pub fn read(document: &Document, element: NodeId, attribute: &str) -> Self {
        document
            .attribute(element, attribute)
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// Store the list on `element` under `attribute`.
    pub fn write(&self, document: &mut Document, element: NodeId, attribute: &str) {
        document.set_attribute(element, attribute, &self.to_string());
    }

    /// Whether `type_id` is in the list.
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.iter().any(|t| t == type_id)
    }

    /// Append `type_id`. Returns `false` if it was already present.
    pub fn insert(&mut self, type_id: &str) -> bool {
        if self.contains(type_id) {
            return false;
        }
        self.types.push(type_id.into());
        true
    }

    /// Remove `type_id`. Returns `false` if it was absent.
    pub fn remove(&mut self, type_id: &str) -> bool {
        let before = self.types.len();
        self.types.retain(|t| t.as_str() != type_id);
        self.types.len() != before
    }

    /// Type ids in upgrade order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.iter().map(String::as_str)
    }

    /// Number of type ids.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Display for UpgradedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, type_id) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(type_id)?;
        }
        Ok(())
    }
}
