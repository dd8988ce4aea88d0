//! Newtype wrappers for catalog names, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so they stay
//! interchangeable with the flat record fields they are read from.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        // Lets maps keyed by the newtype be queried with a plain `&str`.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for String {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Catalog-unique package name.
    PackageName
);

string_newtype!(
    /// Channel name, unique within its package.
    ChannelName
);

string_newtype!(
    /// Bundle name, unique within a package and therefore within each channel.
    BundleName
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn package_name_display_and_as_ref() {
        let name = PackageName::new("etcd");
        assert_eq!(name.to_string(), "etcd");
        assert_eq!(name.as_str(), "etcd");
        assert_eq!(AsRef::<str>::as_ref(&name), "etcd");
    }

    #[test]
    fn bundle_name_serde_roundtrip() {
        let name = BundleName::new("etcd.v0.9.2");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"etcd.v0.9.2\"");
        let back: BundleName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn channel_name_compares_with_strings() {
        let name = ChannelName::from("stable");
        assert_eq!(name, "stable");
        assert_eq!(String::from("stable"), name);
        assert_ne!(name, "alpha");
    }

    #[test]
    fn map_keyed_by_newtype_accepts_str_lookup() {
        let mut map = BTreeMap::new();
        map.insert(ChannelName::new("beta"), 2);
        map.insert(ChannelName::new("alpha"), 1);
        assert_eq!(map.get("alpha"), Some(&1));
        assert!(map.contains_key("beta"));
        assert!(!map.contains_key("gamma"));
    }

    #[test]
    fn into_inner_returns_owned_string() {
        let name = PackageName::new(String::from("prometheus"));
        assert_eq!(name.into_inner(), "prometheus");
    }
}
