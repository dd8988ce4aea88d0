use crate::model::{Bundle, Catalog, Package};
use bundlegraph_schema::{
    deduplicate_properties, BundleRecord, ChannelRecord, FlatCatalog, PackageRecord,
    SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_PACKAGE,
};
use std::collections::BTreeMap;

impl Catalog {
    /// Walk the model back into flat records.
    ///
    /// The channel views of a bundle are merged into one record: singular
    /// fields come from the first view seen, properties are pooled across all
    /// views, deduplicated and sorted by type then raw value. Packages are
    /// sorted by name; channels and bundles by package, then name.
    pub fn to_flat(&self) -> FlatCatalog {
        let mut flat = FlatCatalog::default();
        for package in self.packages.values() {
            flat.packages.push(PackageRecord {
                schema: SCHEMA_PACKAGE.to_owned(),
                name: package.name.to_string(),
                default_channel: package
                    .default_channel
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                icon: package.icon.clone(),
                description: package.description.clone(),
            });
            let (channels, bundles) = flatten_channels(package);
            flat.channels.extend(channels);
            flat.bundles.extend(bundles);
        }

        flat.packages.sort_by(|a, b| a.name.cmp(&b.name));
        flat.channels
            .sort_by(|a, b| (&a.package, &a.name).cmp(&(&b.package, &b.name)));
        flat.bundles
            .sort_by(|a, b| (&a.package, &a.name).cmp(&(&b.package, &b.name)));
        flat
    }
}

fn flatten_channels(package: &Package) -> (Vec<ChannelRecord>, Vec<BundleRecord>) {
    let mut channels = Vec::with_capacity(package.channels.len());
    let mut merged: BTreeMap<&str, BundleRecord> = BTreeMap::new();

    for channel in package.channels.values() {
        let mut entries: Vec<_> = channel.bundles().map(Bundle::entry).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        channels.push(ChannelRecord {
            schema: SCHEMA_CHANNEL.to_owned(),
            package: package.name.to_string(),
            name: channel.name.to_string(),
            entries,
            properties: channel.properties.clone(),
        });

        for view in channel.bundles() {
            let record = merged
                .entry(view.name.as_str())
                .or_insert_with(|| BundleRecord {
                    schema: SCHEMA_BUNDLE.to_owned(),
                    package: package.name.to_string(),
                    name: view.name.to_string(),
                    image: view.image.clone(),
                    properties: Vec::new(),
                    related_images: view.related_images.clone(),
                    csv_json: view.csv_json.clone(),
                    objects: view.objects.clone(),
                });
            record.properties.extend(view.properties.iter().cloned());
        }
    }

    let bundles = merged
        .into_values()
        .map(|mut record| {
            record.properties = deduplicate_properties(record.properties);
            record.properties.sort();
            record
        })
        .collect();
    (channels, bundles)
}

#[cfg(test)]
mod tests {
    use crate::model::{Bundle, Catalog, PackageIdentity};
    use bundlegraph_schema::{BundleName, ChannelName, PackageName, Property, RawJson};

    fn identity(name: &str) -> PackageIdentity {
        PackageIdentity {
            name: PackageName::new(name),
            description: format!("{name} operator"),
            icon: None,
        }
    }

    fn view(name: &str, channel: &str, replaces: Option<&str>, properties: Vec<Property>) -> Bundle {
        Bundle {
            name: BundleName::new(name),
            channel: ChannelName::new(channel),
            replaces: replaces.map(BundleName::from),
            image: format!("quay.io/{name}"),
            properties,
            ..Bundle::default()
        }
    }

    #[test]
    fn merges_channel_views_into_one_bundle_record() {
        let gvk = Property::new("olm.gvk", RawJson::new(r#"{"group":"g","kind":"K","version":"v1"}"#));
        let label = Property::new("custom", RawJson::new(r#""x""#));
        let mut catalog = Catalog::new();
        catalog.insert_bundle(
            identity("etcd"),
            view("etcd.v1", "stable", None, vec![Property::package("etcd", "1.0.0"), gvk.clone()]),
        );
        catalog.insert_bundle(
            identity("etcd"),
            view("etcd.v1", "alpha", None, vec![gvk.clone(), label.clone()]),
        );

        let flat = catalog.to_flat();
        assert_eq!(flat.bundles.len(), 1);
        assert_eq!(
            flat.bundles[0].properties,
            vec![label, gvk, Property::package("etcd", "1.0.0")]
        );
        assert_eq!(flat.channels.len(), 2);
        assert_eq!(flat.channels[0].name, "alpha");
        assert_eq!(flat.channels[1].name, "stable");
    }

    #[test]
    fn emits_sorted_entries_with_edges() {
        let mut catalog = Catalog::new();
        catalog.insert_bundle(identity("etcd"), view("etcd.v2", "stable", Some("etcd.v1"), vec![]));
        catalog.insert_bundle(identity("etcd"), view("etcd.v1", "stable", None, vec![]));

        let flat = catalog.to_flat();
        let entries = &flat.channels[0].entries;
        assert_eq!(entries[0].name, "etcd.v1");
        assert_eq!(entries[0].replaces, "");
        assert_eq!(entries[1].name, "etcd.v2");
        assert_eq!(entries[1].replaces, "etcd.v1");
    }

    #[test]
    fn package_record_carries_default_channel_and_identity() {
        let mut catalog = Catalog::new();
        catalog.insert_bundle(identity("etcd"), view("etcd.v1", "beta", None, vec![]));

        let flat = catalog.to_flat();
        assert_eq!(flat.packages[0].name, "etcd");
        assert_eq!(flat.packages[0].default_channel, "beta");
        assert_eq!(flat.packages[0].description, "etcd operator");
        assert_eq!(flat.packages[0].schema, "olm.package");
        assert_eq!(flat.bundles[0].package, "etcd");
        assert_eq!(flat.bundles[0].schema, "olm.bundle");
    }

    #[test]
    fn records_are_sorted_across_packages() {
        let mut catalog = Catalog::new();
        catalog.insert_bundle(identity("zookeeper"), view("zk.v1", "stable", None, vec![]));
        catalog.insert_bundle(identity("etcd"), view("etcd.v1", "stable", None, vec![]));
        catalog.insert_bundle(identity("etcd"), view("etcd.v0", "alpha", None, vec![]));

        let flat = catalog.to_flat();
        let packages: Vec<&str> = flat.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(packages, vec!["etcd", "zookeeper"]);
        let channels: Vec<(&str, &str)> = flat
            .channels
            .iter()
            .map(|c| (c.package.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(
            channels,
            vec![("etcd", "alpha"), ("etcd", "stable"), ("zookeeper", "stable")]
        );
        let bundles: Vec<&str> = flat.bundles.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(bundles, vec!["etcd.v0", "etcd.v1", "zk.v1"]);
    }

    #[test]
    fn empty_catalog_flattens_to_nothing() {
        assert!(Catalog::new().to_flat().is_empty());
    }
}
