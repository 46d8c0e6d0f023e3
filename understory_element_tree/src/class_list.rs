// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered, duplicate-free class lists.

use alloc::string::String;
use smallvec::SmallVec;

/// The classes applied to an element, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassList {
    classes: SmallVec<[String; 4]>,
}

impl ClassList {
    /// Parse a whitespace-separated class attribute value.
    pub fn parse(value: &str) -> Self {
        let mut list = Self::default();
        for class in value.split_ascii_whitespace() {
            list.add(class);
        }
        list
    }

    /// Whether `class` is present.
    pub fn contains(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add `class`; returns `false` if it was already present.
    pub fn add(&mut self, class: &str) -> bool {
        if class.is_empty() || self.contains(class) {
            return false;
        }
        self.classes.push(class.into());
        true
    }

    /// Remove `class`; returns `false` if it was not present.
    pub fn remove(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c.as_str() != class);
        self.classes.len() != before
    }

    /// Add `class` if absent, remove it otherwise. Returns whether it is now present.
    pub fn toggle(&mut self, class: &str) -> bool {
        if self.remove(class) {
            false
        } else {
            self.add(class)
        }
    }

    /// Iterate classes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.classes.iter().map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
