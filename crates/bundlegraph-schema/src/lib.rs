//! Flat catalog records, typed bundle properties, and canonical property encoding.
//!
//! This crate defines the schema layer: the flat record format
//! (`PackageRecord`, `ChannelRecord`, `BundleRecord`) and its JSON blob stream
//! codec (`FlatCatalog`), the raw `Property` with its closed decoder
//! (`TypedProperty`, `parse_properties`), canonical re-encoding, and the
//! newtype names used by the graph model.

pub mod flat;
pub mod property;
pub mod types;

pub use flat::{
    BundleRecord, ChannelEntry, ChannelRecord, FlatCatalog, Icon, PackageRecord, RelatedImage,
    SchemaError, SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_PACKAGE,
};
pub use property::{
    deduplicate_properties, parse_properties, BundleObject, ChannelPriority, Gvk, GvkRequired,
    PackageProperty, PackageRequired, Properties, Property, PropertyError, RawJson,
    TypedProperty, TYPE_BUNDLE_OBJECT, TYPE_CHANNEL, TYPE_GVK, TYPE_GVK_REQUIRED, TYPE_PACKAGE,
    TYPE_PACKAGE_REQUIRED,
};
pub use types::{BundleName, ChannelName, PackageName};
