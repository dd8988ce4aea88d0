//! Graph model of an operator catalog and its two-way mapping to the flat format.
//!
//! This crate builds a `Catalog` (packages → channels → bundle views linked by
//! `replaces`/`skips` edges) from a `FlatCatalog` with `build_catalog`, merges
//! single bundles into a partial model with `Catalog::insert_bundle`,
//! canonicalizes bundle properties with `Catalog::normalize`, resolves channel
//! heads with `Channel::head`, and walks the model back into deterministic
//! flat records with `Catalog::to_flat`.

pub mod build;
pub mod flatten;
pub mod head;
pub mod insert;
pub mod model;
pub mod normalize;
pub mod options;

pub use build::{build_catalog, build_catalog_with};
pub use head::HeadError;
pub use model::{Bundle, Catalog, Channel, Package, PackageIdentity};
pub use options::{BuildOptions, OptionsError};

use bundlegraph_schema::PropertyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("config contains package with no name")]
    UnnamedPackage,
    #[error("duplicate package {0:?}")]
    DuplicatePackage(String),
    #[error("unknown package {package:?} for channel {channel:?}")]
    UnknownChannelPackage { package: String, channel: String },
    #[error("package {0:?} contains channel with no name")]
    UnnamedChannel(String),
    #[error("package {package:?} has duplicate channel {channel:?}")]
    DuplicateChannel { package: String, channel: String },
    #[error("invalid package {package:?}, channel {channel:?}: duplicate entry {entry:?}")]
    DuplicateEntry {
        package: String,
        channel: String,
        entry: String,
    },
    #[error("package name must be set for bundle {0:?}")]
    BundleWithoutPackage(String),
    #[error("unknown package {package:?} for bundle {bundle:?}")]
    UnknownBundlePackage { package: String, bundle: String },
    #[error("package {package:?} has duplicate bundle {bundle:?}")]
    DuplicateBundle { package: String, bundle: String },
    #[error("parse properties for bundle {bundle:?}: {source}")]
    Properties {
        bundle: String,
        #[source]
        source: PropertyError,
    },
    #[error("package {package:?} bundle {bundle:?} must have exactly 1 \"olm.package\" property, found {found}")]
    PackagePropertyCount {
        package: String,
        bundle: String,
        found: usize,
    },
    #[error("package {package:?} does not match \"olm.package\" property {found:?}")]
    PackagePropertyMismatch { package: String, found: String },
    #[error("error parsing bundle {bundle:?} version {version:?}: {source}")]
    InvalidVersion {
        bundle: String,
        version: String,
        #[source]
        source: semver::Error,
    },
    #[error("package {package:?}, bundle {bundle:?} not found in any channel entries")]
    BundleNotInChannel { package: String, bundle: String },
    #[error("no olm.bundle blobs found in package {package:?} for olm.channel entries {entries:?}")]
    UnbackedEntries {
        package: String,
        entries: Vec<String>,
    },
    #[error("package {package:?} channel {channel:?}: {source}")]
    Head {
        package: String,
        channel: String,
        #[source]
        source: HeadError,
    },
}
