// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher helper: walk a dispatch sequence and honor stop outcomes.
//!
//! The dispatcher executes a handler for each step in a propagation sequence and
//! applies one rule: [`Outcome::Stop`] aborts the walk immediately.
//! Higher-level semantics such as "default prevented" live on the event payload
//! you pass to [`run`], not in [`Outcome`].
//!
//! ```
//! use understory_event_target::dispatcher;
//! use understory_event_target::types::{Dispatch, Outcome, Phase};
//! #[derive(Copy, Clone, Debug)] struct Node(u32);
//!
//! let seq = vec![
//!     Dispatch::capture(Node(1)),
//!     Dispatch::target(Node(2)),
//!     Dispatch::bubble(Node(1)),
//! ];
//!
//! let mut handled: Vec<(Phase, u32)> = Vec::new();
//! let stop_at = dispatcher::run(&seq, &mut (), |d, _| {
//!     handled.push((d.phase, d.node.0));
//!     Outcome::Continue
//! });
//!
//! assert!(stop_at.is_none());
//! assert_eq!(handled, vec![(Phase::Capture, 1), (Phase::Target, 2), (Phase::Bubble, 1)]);
//! ```

use crate::types::{Dispatch, Outcome};

/// Run a handler over a dispatch sequence and honor stop outcomes.
///
/// - `seq`: a sequence in capture → target → bubble order, typically from
///   [`propagation_path`](crate::path::propagation_path).
/// - `event`: a mutable payload carried across handler calls.
/// - `handler`: per-entry callback; its [`Outcome`] controls propagation.
///
/// Returns `None` if the full sequence was visited, or the entry at which a
/// handler returned [`Outcome::Stop`].
pub fn run<'a, K, E>(
    seq: &'a [Dispatch<K>],
    event: &mut E,
    mut handler: impl FnMut(&Dispatch<K>, &mut E) -> Outcome,
) -> Option<&'a Dispatch<K>> {
    for d in seq {
        match handler(d, event) {
            Outcome::Continue => {}
            Outcome::Stop => return Some(d),
        }
    }
    None
}
