// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller configuration.

use understory_element_tree::Capabilities;

/// Names and host requirements used by [`ComponentHandler`](crate::ComponentHandler).
///
/// Override individual fields with struct update syntax:
///
/// ```
/// use understory_upgrade::HandlerConfig;
///
/// let config = HandlerConfig {
///     upgraded_attribute: "data-enhanced",
///     ..HandlerConfig::default()
/// };
/// assert_eq!(config.upgraded_event, "component-upgraded");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Attribute holding the comma-separated list of applied type ids.
    pub upgraded_attribute: &'static str,
    /// Cancelable event dispatched before an element receives new upgrades.
    pub upgrading_event: &'static str,
    /// Event dispatched after each successful upgrade.
    pub upgraded_event: &'static str,
    /// Event dispatched after each successful downgrade.
    pub downgraded_event: &'static str,
    /// Host features that must be present for upgrades to run at all.
    pub required_capabilities: Capabilities,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            upgraded_attribute: "data-upgraded",
            upgrading_event: "component-upgrading",
            upgraded_event: "component-upgraded",
            downgraded_event: "component-downgraded",
            required_capabilities: Capabilities::all(),
        }
    }
}
