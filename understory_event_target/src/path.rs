// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation path construction.
//!
//! Reconstructs the root → target ancestry via [`ParentLookup`] and emits the
//! capture → target → bubble sequence for it.

use alloc::vec::Vec;

use crate::types::{Dispatch, ParentLookup, Phase};

/// Emit the dispatch sequence for `target`.
///
/// Capture entries run root → parent, then the target, then (if `bubbles`)
/// parent → root. A target without ancestors yields a single target entry.
pub fn propagation_path<K: Copy>(
    target: K,
    parents: &impl ParentLookup<K>,
    bubbles: bool,
) -> Vec<Dispatch<K>> {
    let path = ancestry(target, parents);
    let mut out = Vec::with_capacity(path.len() * 2);
    let Some((&target, ancestors)) = path.split_last() else {
        return out;
    };

    for &n in ancestors {
        out.push(Dispatch::capture(n));
    }
    out.push(Dispatch {
        phase: Phase::Target,
        node: target,
    });
    if bubbles {
        for &n in ancestors.iter().rev() {
            out.push(Dispatch::bubble(n));
        }
    }
    out
}

/// Root → target path, inclusive.
pub fn ancestry<K: Copy>(target: K, parents: &impl ParentLookup<K>) -> Vec<K> {
    let mut out = Vec::new();
    let mut cur = target;
    // Collect to root; caller ensures acyclic ancestry.
    loop {
        out.push(cur);
        match parents.parent_of(&cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    out.reverse();
    out
}
