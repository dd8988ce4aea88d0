//! The flat, denormalized catalog format: package, channel and bundle records.
//!
//! Field names match the declarative config JSON blobs exactly. The embedded
//! manifest payload and object list of a bundle are in-memory only and are
//! never written out.

use crate::property::{Property, RawJson};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

pub const SCHEMA_PACKAGE: &str = "olm.package";
pub const SCHEMA_CHANNEL: &str = "olm.channel";
pub const SCHEMA_BUNDLE: &str = "olm.bundle";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to decode catalog blob: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog blob #{0} has no schema")]
    MissingSchema(usize),
    #[error("catalog blob #{index} has unsupported schema {schema:?}")]
    UnsupportedSchema { index: usize, schema: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    /// Base64 text of the icon image, kept encoded.
    #[serde(rename = "base64data")]
    pub data: String,
    #[serde(rename = "mediatype")]
    pub media_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub default_channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub replaces: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub skip_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub schema: String,
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<ChannelEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelatedImage {
    #[serde(default)]
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRecord {
    pub schema: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_images: Vec<RelatedImage>,
    /// Embedded cluster service version manifest.
    #[serde(skip)]
    pub csv_json: String,
    #[serde(skip)]
    pub objects: Vec<String>,
}

/// The three record lists that make up a flat catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatCatalog {
    pub packages: Vec<PackageRecord>,
    pub channels: Vec<ChannelRecord>,
    pub bundles: Vec<BundleRecord>,
}

#[derive(Deserialize)]
struct SchemaProbe {
    #[serde(default)]
    schema: String,
}

impl FlatCatalog {
    /// Decode a stream of concatenated JSON blobs, dispatching on each blob's
    /// `schema` field. Blob order is kept within each record list.
    pub fn from_json_stream(input: &str) -> Result<Self, SchemaError> {
        let mut out = Self::default();
        let stream = serde_json::Deserializer::from_str(input).into_iter::<Box<RawValue>>();
        for (index, blob) in stream.enumerate() {
            let blob = blob?;
            let probe: SchemaProbe = serde_json::from_str(blob.get())?;
            match probe.schema.as_str() {
                SCHEMA_PACKAGE => out.packages.push(serde_json::from_str(blob.get())?),
                SCHEMA_CHANNEL => out.channels.push(serde_json::from_str(blob.get())?),
                SCHEMA_BUNDLE => out.bundles.push(serde_json::from_str(blob.get())?),
                "" => return Err(SchemaError::MissingSchema(index)),
                other => {
                    return Err(SchemaError::UnsupportedSchema {
                        index,
                        schema: other.to_owned(),
                    })
                }
            }
        }
        Ok(out)
    }

    /// Encode as compact JSON blobs, one per line: packages, then channels,
    /// then bundles.
    pub fn to_json_stream(&self) -> Result<String, SchemaError> {
        let mut out = String::new();
        for package in &self.packages {
            push_line(&mut out, package)?;
        }
        for channel in &self.channels {
            push_line(&mut out, channel)?;
        }
        for bundle in &self.bundles {
            push_line(&mut out, bundle)?;
        }
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.channels.is_empty() && self.bundles.is_empty()
    }
}

fn push_line<T: Serialize>(out: &mut String, record: &T) -> Result<(), SchemaError> {
    out.push_str(RawJson::from_value(record)?.get());
    out.push('\n');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = r#"
{"schema":"olm.package","name":"etcd","defaultChannel":"stable","description":"etcd operator"}
{
  "schema": "olm.channel",
  "package": "etcd",
  "name": "stable",
  "entries": [
    {"name": "etcd.v0.9.2"},
    {"name": "etcd.v0.9.4", "replaces": "etcd.v0.9.2", "skipRange": "<0.9.4"}
  ]
}
{"schema":"olm.bundle","package":"etcd","name":"etcd.v0.9.4","image":"quay.io/etcd:v0.9.4",
 "properties":[{"type":"olm.package","value":{"packageName":"etcd", "version":"0.9.4"}}]}
"#;

    #[test]
    fn decodes_blobs_by_schema() {
        let flat = FlatCatalog::from_json_stream(STREAM).unwrap();
        assert_eq!(flat.packages.len(), 1);
        assert_eq!(flat.packages[0].default_channel, "stable");
        assert_eq!(flat.packages[0].description, "etcd operator");
        assert_eq!(flat.channels[0].entries.len(), 2);
        assert_eq!(flat.channels[0].entries[1].replaces, "etcd.v0.9.2");
        assert_eq!(flat.channels[0].entries[1].skip_range, "<0.9.4");
        assert_eq!(flat.bundles[0].image, "quay.io/etcd:v0.9.4");
    }

    #[test]
    fn property_values_keep_original_bytes() {
        let flat = FlatCatalog::from_json_stream(STREAM).unwrap();
        assert_eq!(
            flat.bundles[0].properties[0].value.get(),
            r#"{"packageName":"etcd", "version":"0.9.4"}"#
        );
    }

    #[test]
    fn rejects_unknown_schema() {
        let err = FlatCatalog::from_json_stream(r#"{"schema":"olm.deprecations"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedSchema { index: 0, .. }));
    }

    #[test]
    fn rejects_blob_without_schema() {
        let input = r#"{"schema":"olm.package","name":"a"} {"name":"b"}"#;
        let err = FlatCatalog::from_json_stream(input).unwrap_err();
        assert!(matches!(err, SchemaError::MissingSchema(1)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(FlatCatalog::from_json_stream(r#"{"schema":"olm.package""#).is_err());
    }

    #[test]
    fn encodes_one_blob_per_line_omitting_empty_fields() {
        let flat = FlatCatalog {
            packages: vec![PackageRecord {
                schema: SCHEMA_PACKAGE.to_owned(),
                name: "etcd".to_owned(),
                ..Default::default()
            }],
            channels: vec![ChannelRecord {
                schema: SCHEMA_CHANNEL.to_owned(),
                package: "etcd".to_owned(),
                name: "stable".to_owned(),
                entries: vec![ChannelEntry {
                    name: "etcd.v1".to_owned(),
                    ..Default::default()
                }],
                properties: Vec::new(),
            }],
            bundles: vec![BundleRecord {
                schema: SCHEMA_BUNDLE.to_owned(),
                package: "etcd".to_owned(),
                name: "etcd.v1".to_owned(),
                image: "quay.io/etcd:v1".to_owned(),
                csv_json: "{}".to_owned(),
                ..Default::default()
            }],
        };
        let out = flat.to_json_stream().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"schema":"olm.package","name":"etcd","defaultChannel":""}"#,
                r#"{"schema":"olm.channel","package":"etcd","name":"stable","entries":[{"name":"etcd.v1"}]}"#,
                r#"{"schema":"olm.bundle","package":"etcd","name":"etcd.v1","image":"quay.io/etcd:v1"}"#,
            ]
        );
    }

    #[test]
    fn bundle_always_carries_package_and_name() {
        let flat = FlatCatalog {
            bundles: vec![BundleRecord {
                schema: SCHEMA_BUNDLE.to_owned(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            flat.to_json_stream().unwrap().trim_end(),
            r#"{"schema":"olm.bundle","package":"","name":"","image":""}"#
        );
    }

    #[test]
    fn empty_stream_is_empty_catalog() {
        let flat = FlatCatalog::from_json_stream("  \n").unwrap();
        assert!(flat.is_empty());
    }
}
