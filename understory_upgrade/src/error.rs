// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the registry and the upgrade controller.

use alloc::string::String;

use crate::component::FactoryError;

/// Errors returned by [`ComponentHandler`](crate::ComponentHandler) and [`Registry`](crate::Registry).
///
/// Registration errors leave the registry unchanged. Usage errors are reported
/// before the element is touched.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// Another component type already uses this marker.
    #[error("marker `{marker}` is already registered by component `{existing}`")]
    DuplicateMarker {
        /// The contested marker class.
        marker: String,
        /// Type id of the component holding it.
        existing: String,
    },
    /// The component declares a property the controller reserves for itself.
    #[error("component `{type_id}` must not declare the reserved property `{property}`")]
    ReservedProperty {
        /// Offending component type id.
        type_id: String,
        /// The reserved property name.
        property: &'static str,
    },
    /// An explicit type id has no registered component.
    #[error("no component is registered as `{0}`")]
    UnknownComponent(String),
    /// The node passed in cannot be upgraded or downgraded.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The component's factory failed.
    #[error("constructing component `{type_id}` failed")]
    Construction {
        /// Type id whose factory failed.
        type_id: String,
        /// Error returned by the factory.
        #[source]
        source: FactoryError,
    },
}
