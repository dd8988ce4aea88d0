use bundlegraph_schema::{
    BundleName, BundleRecord, ChannelEntry, ChannelName, Icon, PackageName, Properties, Property,
    RelatedImage,
};
use semver::Version;
use std::collections::BTreeMap;

/// Root of the graph model: every package of a catalog, keyed by name.
///
/// Each level owns the next (catalog → package → channel → bundle). Children
/// refer back to their parents by name only; use [`Catalog::package_of`] and
/// [`Catalog::channel_of`] to follow those references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub(crate) packages: BTreeMap<PackageName, Package>,
}

/// Identity fields of a package, without its channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIdentity {
    pub name: PackageName,
    pub description: String,
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: PackageName,
    pub description: String,
    pub icon: Option<Icon>,
    pub(crate) default_channel: Option<ChannelName>,
    pub(crate) channels: BTreeMap<ChannelName, Channel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: ChannelName,
    /// Owning package.
    pub package: PackageName,
    pub properties: Vec<Property>,
    pub(crate) bundles: BTreeMap<BundleName, Bundle>,
}

/// One channel's view of a release bundle.
///
/// A bundle listed in several channels of a package is stored once per
/// channel; the views share everything except `channel` and the upgrade edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    pub name: BundleName,
    /// Owning package.
    pub package: PackageName,
    /// Channel this view belongs to.
    pub channel: ChannelName,
    pub replaces: Option<BundleName>,
    pub skips: Vec<BundleName>,
    pub skip_range: String,
    /// `None` until a bundle record has filled in this view.
    pub version: Option<Version>,
    pub image: String,
    pub related_images: Vec<RelatedImage>,
    pub csv_json: String,
    pub objects: Vec<String>,
    pub properties: Vec<Property>,
    pub decoded: Properties,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn bundle(&self, package: &str, channel: &str, name: &str) -> Option<&Bundle> {
        self.package(package)?.channel(channel)?.bundle(name)
    }

    /// Follow a bundle's back-reference to its package.
    pub fn package_of(&self, bundle: &Bundle) -> Option<&Package> {
        self.package(&bundle.package)
    }

    /// Follow a bundle's back-reference to the channel view it belongs to.
    pub fn channel_of(&self, bundle: &Bundle) -> Option<&Channel> {
        self.package_of(bundle)?.channel(&bundle.channel)
    }
}

impl Package {
    pub(crate) fn from_identity(identity: PackageIdentity) -> Self {
        Self {
            name: identity.name,
            description: identity.description,
            icon: identity.icon,
            default_channel: None,
            channels: BTreeMap::new(),
        }
    }

    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity {
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
        }
    }

    /// The channel designated default, if one has been set.
    pub fn default_channel(&self) -> Option<&Channel> {
        self.channels.get(self.default_channel.as_deref()?)
    }

    pub fn default_channel_name(&self) -> Option<&ChannelName> {
        self.default_channel.as_ref()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Channels in name order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }
}

impl Channel {
    pub(crate) fn new(package: PackageName, name: ChannelName) -> Self {
        Self {
            name,
            package,
            properties: Vec::new(),
            bundles: BTreeMap::new(),
        }
    }

    pub fn bundle(&self, name: &str) -> Option<&Bundle> {
        self.bundles.get(name)
    }

    /// Bundle views in name order.
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.values()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl Bundle {
    /// A view seeded from a channel entry: name and upgrade edges only.
    pub(crate) fn stub(package: &PackageName, channel: &ChannelName, entry: &ChannelEntry) -> Self {
        Self {
            name: BundleName::from(entry.name.as_str()),
            package: package.clone(),
            channel: channel.clone(),
            replaces: (!entry.replaces.is_empty())
                .then(|| BundleName::from(entry.replaces.as_str())),
            skips: entry.skips.iter().map(|s| BundleName::from(s.as_str())).collect(),
            skip_range: entry.skip_range.clone(),
            ..Self::default()
        }
    }

    /// Copy the full metadata of a bundle record into this view.
    pub(crate) fn fill(&mut self, record: &BundleRecord, decoded: &Properties, version: &Version) {
        self.image.clone_from(&record.image);
        self.related_images.clone_from(&record.related_images);
        self.csv_json.clone_from(&record.csv_json);
        self.objects.clone_from(&record.objects);
        self.properties.clone_from(&record.properties);
        self.decoded = decoded.clone();
        self.version = Some(version.clone());
    }

    /// True for a channel entry no bundle record has filled in yet.
    pub fn is_stub(&self) -> bool {
        self.version.is_none()
    }

    /// The flat channel entry describing this view's upgrade edges.
    pub fn entry(&self) -> ChannelEntry {
        ChannelEntry {
            name: self.name.to_string(),
            replaces: self
                .replaces
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            skips: self.skips.iter().map(ToString::to_string).collect(),
            skip_range: self.skip_range.clone(),
        }
    }
}
