use crate::model::{Bundle, Catalog, Channel, Package, PackageIdentity};
use tracing::trace;

impl Catalog {
    /// Merge one fully populated bundle view into the catalog.
    ///
    /// The package and the bundle's channel are created when missing; an
    /// existing package keeps its identity fields. A bundle with the same name
    /// in the same channel is replaced. The first channel ever inserted into a
    /// package becomes its default. No other validation is done, so a catalog
    /// can be assembled bundle by bundle from partial data.
    pub fn insert_bundle(&mut self, identity: PackageIdentity, mut bundle: Bundle) {
        let package = self
            .packages
            .entry(identity.name.clone())
            .or_insert_with(|| {
                trace!("creating package '{}'", identity.name);
                Package::from_identity(identity)
            });
        bundle.package = package.name.clone();

        if !package.channels.contains_key(&bundle.channel) {
            trace!(
                "creating channel '{}' in package '{}'",
                bundle.channel,
                package.name
            );
            let channel = Channel::new(package.name.clone(), bundle.channel.clone());
            package.channels.insert(channel.name.clone(), channel);
        }
        if package.default_channel.is_none() {
            package.default_channel = Some(bundle.channel.clone());
        }

        if let Some(channel) = package.channels.get_mut(&bundle.channel) {
            channel.bundles.insert(bundle.name.clone(), bundle);
        }
    }
}
