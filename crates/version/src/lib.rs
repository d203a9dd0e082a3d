//! Version handling for plugin dependency constraints

pub mod constraint;
pub mod version;

pub use constraint::{satisfies, VersionConstraint};
pub use version::{Version, VersionError};
