use crate::model::{Bundle, Catalog, Channel, Package, PackageIdentity};
use crate::options::BuildOptions;
use crate::CatalogError;
use bundlegraph_schema::{parse_properties, BundleName, ChannelName, FlatCatalog, PackageName};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Build a normalized catalog from flat records.
pub fn build_catalog(flat: &FlatCatalog) -> Result<Catalog, CatalogError> {
    build_catalog_with(flat, &BuildOptions::default())
}

/// Build a catalog from flat records.
///
/// Packages are registered first, then channels seed one stub per entry, then
/// each bundle record fills in every stub of its name across the package's
/// channels. Every entry must end up backed by a bundle record. A declared
/// default channel with no channel record is synthesized empty.
pub fn build_catalog_with(
    flat: &FlatCatalog,
    options: &BuildOptions,
) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();
    let mut default_channels: BTreeMap<PackageName, String> = BTreeMap::new();

    for record in &flat.packages {
        if record.name.is_empty() {
            return Err(CatalogError::UnnamedPackage);
        }
        if catalog.packages.contains_key(record.name.as_str()) {
            return Err(CatalogError::DuplicatePackage(record.name.clone()));
        }
        let name = PackageName::from(record.name.as_str());
        default_channels.insert(name.clone(), record.default_channel.clone());
        let package = Package::from_identity(PackageIdentity {
            name: name.clone(),
            description: record.description.clone(),
            icon: record.icon.clone(),
        });
        catalog.packages.insert(name, package);
    }

    // Entry names per package still waiting for a bundle record.
    let mut pending: BTreeMap<PackageName, BTreeSet<BundleName>> = BTreeMap::new();

    for record in &flat.channels {
        let Some(package) = catalog.packages.get_mut(record.package.as_str()) else {
            return Err(CatalogError::UnknownChannelPackage {
                package: record.package.clone(),
                channel: record.name.clone(),
            });
        };
        if record.name.is_empty() {
            return Err(CatalogError::UnnamedChannel(record.package.clone()));
        }
        if package.channels.contains_key(record.name.as_str()) {
            return Err(CatalogError::DuplicateChannel {
                package: record.package.clone(),
                channel: record.name.clone(),
            });
        }

        let mut channel = Channel::new(
            package.name.clone(),
            ChannelName::from(record.name.as_str()),
        );
        channel.properties.clone_from(&record.properties);
        let waiting = pending.entry(package.name.clone()).or_default();
        for entry in &record.entries {
            if channel.bundles.contains_key(entry.name.as_str()) {
                return Err(CatalogError::DuplicateEntry {
                    package: record.package.clone(),
                    channel: record.name.clone(),
                    entry: entry.name.clone(),
                });
            }
            let stub = Bundle::stub(&package.name, &channel.name, entry);
            waiting.insert(stub.name.clone());
            channel.bundles.insert(stub.name.clone(), stub);
        }

        if default_channels
            .get(&package.name)
            .is_some_and(|name| *name == record.name)
        {
            package.default_channel = Some(channel.name.clone());
        }
        package.channels.insert(channel.name.clone(), channel);
    }

    let mut seen: BTreeMap<PackageName, BTreeSet<BundleName>> = BTreeMap::new();

    for record in &flat.bundles {
        if record.package.is_empty() {
            return Err(CatalogError::BundleWithoutPackage(record.name.clone()));
        }
        let Some(package) = catalog.packages.get_mut(record.package.as_str()) else {
            return Err(CatalogError::UnknownBundlePackage {
                package: record.package.clone(),
                bundle: record.name.clone(),
            });
        };

        let name = BundleName::from(record.name.as_str());
        if !seen
            .entry(package.name.clone())
            .or_default()
            .insert(name.clone())
        {
            return Err(CatalogError::DuplicateBundle {
                package: record.package.clone(),
                bundle: record.name.clone(),
            });
        }

        let decoded =
            parse_properties(&record.properties).map_err(|source| CatalogError::Properties {
                bundle: record.name.clone(),
                source,
            })?;
        let identity = match decoded.packages.as_slice() {
            [identity] => identity,
            found => {
                return Err(CatalogError::PackagePropertyCount {
                    package: record.package.clone(),
                    bundle: record.name.clone(),
                    found: found.len(),
                })
            }
        };
        if identity.package_name != record.package {
            return Err(CatalogError::PackagePropertyMismatch {
                package: record.package.clone(),
                found: identity.package_name.clone(),
            });
        }
        let version =
            Version::parse(&identity.version).map_err(|source| CatalogError::InvalidVersion {
                bundle: record.name.clone(),
                version: identity.version.clone(),
                source,
            })?;

        if let Some(waiting) = pending.get_mut(&package.name) {
            waiting.remove(&name);
        }

        let mut found = false;
        for channel in package.channels.values_mut() {
            if let Some(view) = channel.bundles.get_mut(&name) {
                view.fill(record, &decoded, &version);
                found = true;
            }
        }
        if !found {
            return Err(CatalogError::BundleNotInChannel {
                package: record.package.clone(),
                bundle: record.name.clone(),
            });
        }
    }

    for (package, waiting) in &pending {
        if !waiting.is_empty() {
            return Err(CatalogError::UnbackedEntries {
                package: package.to_string(),
                entries: waiting.iter().map(ToString::to_string).collect(),
            });
        }
    }

    for package in catalog.packages.values_mut() {
        let Some(declared) = default_channels.get(&package.name) else {
            continue;
        };
        if declared.is_empty() || package.default_channel.is_some() {
            continue;
        }
        debug!(
            "package '{}' declares default channel '{declared}' with no channel record; adding it empty",
            package.name
        );
        let channel = Channel::new(package.name.clone(), ChannelName::from(declared.as_str()));
        package.default_channel = Some(channel.name.clone());
        package.channels.insert(channel.name.clone(), channel);
    }

    debug!(
        "built catalog: {} packages, {} channel records, {} bundle records",
        flat.packages.len(),
        flat.channels.len(),
        flat.bundles.len()
    );

    if options.normalize {
        catalog.normalize();
    }
    if options.validate_heads {
        catalog.validate()?;
    }
    Ok(catalog)
}
