use crate::model::Catalog;
use tracing::trace;

impl Catalog {
    /// Rewrite every bundle property into its canonical encoding, in place.
    ///
    /// Best effort: a property that cannot be canonicalized keeps its
    /// original bytes. The decoded property view is left as it is.
    pub fn normalize(&mut self) {
        for package in self.packages.values_mut() {
            for channel in package.channels.values_mut() {
                for bundle in channel.bundles.values_mut() {
                    for property in &mut bundle.properties {
                        match property.canonicalize() {
                            Ok(canonical) => *property = canonical,
                            Err(e) => trace!(
                                "leaving property of bundle '{}' as-is: {e}",
                                bundle.name
                            ),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Bundle, Catalog, Channel, Package, PackageIdentity};
    use bundlegraph_schema::{ChannelName, PackageName, Property, RawJson};

    fn catalog_with(properties: Vec<Property>) -> Catalog {
        let name = PackageName::new("etcd");
        let mut package = Package::from_identity(PackageIdentity {
            name: name.clone(),
            ..PackageIdentity::default()
        });
        let mut channel = Channel::new(name.clone(), ChannelName::new("stable"));
        let bundle = Bundle {
            name: "etcd.v1".into(),
            package: name.clone(),
            channel: channel.name.clone(),
            properties,
            ..Bundle::default()
        };
        channel.bundles.insert(bundle.name.clone(), bundle);
        package.channels.insert(channel.name.clone(), channel);
        let mut catalog = Catalog::new();
        catalog.packages.insert(name, package);
        catalog
    }

    fn properties(catalog: &Catalog) -> Vec<Property> {
        catalog
            .bundle("etcd", "stable", "etcd.v1")
            .unwrap()
            .properties
            .clone()
    }

    #[test]
    fn rewrites_properties_canonically() {
        let mut catalog = catalog_with(vec![Property::new(
            "olm.package",
            RawJson::new("{ \"version\" : \"1.0.0\", \"packageName\" : \"etcd\" }"),
        )]);
        catalog.normalize();
        assert_eq!(properties(&catalog), vec![Property::package("etcd", "1.0.0")]);
    }

    #[test]
    fn leaves_uncanonicalizable_property_untouched() {
        let broken = Property::new("custom", RawJson::new("{oops"));
        let mut catalog = catalog_with(vec![broken.clone()]);
        catalog.normalize();
        assert_eq!(properties(&catalog), vec![broken]);
    }

    #[test]
    fn keeps_large_numbers_and_skips_repeated_keys() {
        let big = Property::new("custom", RawJson::new("{ \"id\": 123456789012345678901234567890 }"));
        let repeated = Property::new("custom", RawJson::new(r#"{"a":1,"a":2}"#));
        let mut catalog = catalog_with(vec![big, repeated.clone()]);
        catalog.normalize();
        assert_eq!(
            properties(&catalog),
            vec![
                Property::new("custom", RawJson::new(r#"{"id":123456789012345678901234567890}"#)),
                repeated,
            ]
        );
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let mut catalog = catalog_with(vec![
            Property::new("custom", RawJson::new("[ 1, {\"b\": 2, \"a\": 1} ]")),
            Property::new("olm.gvk", RawJson::new("{\"version\":\"v1\",\"kind\":\"K\",\"group\":\"g\"}")),
        ]);
        catalog.normalize();
        let once = catalog.clone();
        catalog.normalize();
        assert_eq!(catalog, once);
    }
}
