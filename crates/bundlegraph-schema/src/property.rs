use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

pub const TYPE_PACKAGE: &str = "olm.package";
pub const TYPE_PACKAGE_REQUIRED: &str = "olm.package.required";
pub const TYPE_GVK: &str = "olm.gvk";
pub const TYPE_GVK_REQUIRED: &str = "olm.gvk.required";
pub const TYPE_BUNDLE_OBJECT: &str = "olm.bundle.object";
pub const TYPE_CHANNEL: &str = "olm.channel";

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("properties[{index}].type {kind:?}: {source}")]
    Parse {
        index: usize,
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {kind:?} property: {source}")]
    Encode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON text carried verbatim, byte-for-byte as it was received.
///
/// The text is only checked for well-formedness when it is written back out
/// or decoded, so a malformed value survives until something looks at it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawJson(String);

impl RawJson {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Encode a value with serde_json.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self)
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Serialize for RawJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.0.clone()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(Self(raw.get().to_owned()))
    }
}

/// A typed, opaque property attached to a bundle or channel.
///
/// Ordering is by type tag first, then by the raw encoded value compared
/// byte-wise, which is the order flattened bundles list their properties in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: RawJson,
}

impl Property {
    pub fn new(kind: impl Into<String>, value: RawJson) -> Self {
        Self {
            kind: kind.into(),
            value,
        }
    }

    /// Build a property of the given type from any serializable value.
    pub fn build<T: Serialize + ?Sized>(kind: &str, value: &T) -> Result<Self, PropertyError> {
        let value = RawJson::from_value(value).map_err(|source| PropertyError::Encode {
            kind: kind.to_owned(),
            source,
        })?;
        Ok(Self::new(kind, value))
    }

    /// An `olm.package` identity property.
    pub fn package(package_name: &str, version: &str) -> Self {
        let value = serde_json::json!({ "packageName": package_name, "version": version });
        Self::new(TYPE_PACKAGE, RawJson::new(value.to_string()))
    }

    /// An `olm.channel` priority hint.
    pub fn channel_priority(channel_name: &str, priority: i64) -> Self {
        let value = serde_json::json!({ "channelName": channel_name, "priority": priority });
        Self::new(TYPE_CHANNEL, RawJson::new(value.to_string()))
    }

    /// Re-encode the value in canonical form: compact, with object keys sorted.
    ///
    /// Known types must also decode into their typed record first, so a
    /// property that would fail [`parse_properties`] never gets a canonical
    /// encoding. Numbers keep their text as written. Keys are sorted while
    /// encoding, independent of the map order serde_json is built with. An
    /// object that repeats a key has no canonical form and is rejected.
    pub fn canonicalize(&self) -> Result<Self, PropertyError> {
        let encode_err = |source: serde_json::Error| PropertyError::Encode {
            kind: self.kind.clone(),
            source,
        };
        let raw = self.value.get();
        TypedProperty::decode(self).map_err(encode_err)?;
        serde_json::from_str::<UniqueKeys>(raw).map_err(encode_err)?;
        let value: Value = serde_json::from_str(raw).map_err(encode_err)?;
        let value = RawJson::from_value(&SortedKeys(&value)).map_err(encode_err)?;
        Ok(Self::new(self.kind.clone(), value))
    }
}

/// Accepts any JSON document whose objects never repeat a key.
struct UniqueKeys;

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UniqueKeysVisitor)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = UniqueKeys;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<UniqueKeys, E> {
        Ok(UniqueKeys)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<UniqueKeys, E> {
        Ok(UniqueKeys)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<UniqueKeys, E> {
        Ok(UniqueKeys)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<UniqueKeys, E> {
        Ok(UniqueKeys)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<UniqueKeys, E> {
        Ok(UniqueKeys)
    }

    fn visit_unit<E: de::Error>(self) -> Result<UniqueKeys, E> {
        Ok(UniqueKeys)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<UniqueKeys, A::Error> {
        while seq.next_element::<UniqueKeys>()?.is_some() {}
        Ok(UniqueKeys)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<UniqueKeys, A::Error> {
        let mut keys = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            if keys.contains(&key) {
                return Err(de::Error::custom(format!("duplicate key {key:?}")));
            }
            map.next_value::<UniqueKeys>()?;
            keys.insert(key);
        }
        Ok(UniqueKeys)
    }
}

/// Serializes a JSON tree with the keys of every object in sorted order.
struct SortedKeys<'a>(&'a Value);

impl Serialize for SortedKeys<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Array(items) => serializer.collect_seq(items.iter().map(SortedKeys)),
            Value::Object(map) => {
                let sorted: BTreeMap<&str, SortedKeys<'_>> = map
                    .iter()
                    .map(|(key, value)| (key.as_str(), SortedKeys(value)))
                    .collect();
                serializer.collect_map(sorted)
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Drop exact (type, value) duplicates, keeping the first occurrence.
pub fn deduplicate_properties(properties: Vec<Property>) -> Vec<Property> {
    let mut seen = HashSet::with_capacity(properties.len());
    properties
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageProperty {
    pub package_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageRequired {
    pub package_name: String,
    pub version_range: String,
}

/// Group/version/kind of an API a bundle provides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gvk {
    pub group: String,
    pub kind: String,
    pub version: String,
}

/// Group/version/kind of an API a bundle needs from some other bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GvkRequired {
    pub group: String,
    pub kind: String,
    pub version: String,
}

/// Reference to a manifest embedded in the bundle, either inline
/// (base64 `data`) or by file `ref`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelPriority {
    pub channel_name: String,
    pub priority: i64,
}

/// A property decoded according to its type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedProperty {
    Package(PackageProperty),
    PackageRequired(PackageRequired),
    Gvk(Gvk),
    GvkRequired(GvkRequired),
    BundleObject(BundleObject),
    Channel(ChannelPriority),
    /// Unrecognized tag; the value was checked to be well-formed JSON.
    Other(Property),
}

impl TypedProperty {
    pub fn decode(property: &Property) -> Result<Self, serde_json::Error> {
        let raw = property.value.get();
        Ok(match property.kind.as_str() {
            TYPE_PACKAGE => Self::Package(serde_json::from_str(raw)?),
            TYPE_PACKAGE_REQUIRED => Self::PackageRequired(serde_json::from_str(raw)?),
            TYPE_GVK => Self::Gvk(serde_json::from_str(raw)?),
            TYPE_GVK_REQUIRED => Self::GvkRequired(serde_json::from_str(raw)?),
            TYPE_BUNDLE_OBJECT => Self::BundleObject(serde_json::from_str(raw)?),
            TYPE_CHANNEL => Self::Channel(serde_json::from_str(raw)?),
            _ => {
                serde_json::from_str::<IgnoredAny>(raw)?;
                Self::Other(property.clone())
            }
        })
    }
}

/// Bundle properties bucketed by category, each in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pub packages: Vec<PackageProperty>,
    pub packages_required: Vec<PackageRequired>,
    pub gvks: Vec<Gvk>,
    pub gvks_required: Vec<GvkRequired>,
    pub bundle_objects: Vec<BundleObject>,
    pub channels: Vec<ChannelPriority>,
    pub others: Vec<Property>,
}

impl Properties {
    fn push(&mut self, typed: TypedProperty) {
        match typed {
            TypedProperty::Package(p) => self.packages.push(p),
            TypedProperty::PackageRequired(p) => self.packages_required.push(p),
            TypedProperty::Gvk(p) => self.gvks.push(p),
            TypedProperty::GvkRequired(p) => self.gvks_required.push(p),
            TypedProperty::BundleObject(p) => self.bundle_objects.push(p),
            TypedProperty::Channel(p) => self.channels.push(p),
            TypedProperty::Other(p) => self.others.push(p),
        }
    }
}

/// Decode every property, failing on the first one whose value does not
/// match the shape its type tag demands.
pub fn parse_properties(properties: &[Property]) -> Result<Properties, PropertyError> {
    let mut out = Properties::default();
    for (index, property) in properties.iter().enumerate() {
        let typed = TypedProperty::decode(property).map_err(|source| PropertyError::Parse {
            index,
            kind: property.kind.clone(),
            source,
        })?;
        out.push(typed);
    }
    Ok(out)
}
