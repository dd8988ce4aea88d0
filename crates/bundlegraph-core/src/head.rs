use crate::model::{Bundle, Catalog, Channel};
use crate::CatalogError;
use bundlegraph_schema::BundleName;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeadError {
    /// Every bundle has an incoming edge, or the channel is empty.
    #[error("no channel head found in graph")]
    NoHead,
    /// Candidate names, sorted.
    #[error("multiple channel heads found in graph: {}", .0.join(", "))]
    MultipleHeads(Vec<String>),
}

impl Channel {
    /// The unique bundle no `replaces` or `skips` edge in this channel points at.
    ///
    /// Resolved on demand; a channel under construction may legitimately have
    /// no head or several.
    pub fn head(&self) -> Result<&Bundle, HeadError> {
        let mut incoming: HashSet<&str> = HashSet::new();
        for bundle in self.bundles.values() {
            if let Some(replaces) = &bundle.replaces {
                incoming.insert(replaces.as_str());
            }
            incoming.extend(bundle.skips.iter().map(BundleName::as_str));
        }

        let mut heads: Vec<&Bundle> = self
            .bundles
            .values()
            .filter(|b| !incoming.contains(b.name.as_str()))
            .collect();

        match heads.len() {
            0 => Err(HeadError::NoHead),
            1 => Ok(heads.remove(0)),
            _ => {
                let mut names: Vec<String> = heads.iter().map(|b| b.name.to_string()).collect();
                names.sort();
                Err(HeadError::MultipleHeads(names))
            }
        }
    }
}

impl Catalog {
    /// Resolve the head of every channel that has bundles, stopping at the
    /// first failure in package then channel name order.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for package in self.packages() {
            for channel in package.channels().filter(|c| !c.is_empty()) {
                channel.head().map_err(|source| CatalogError::Head {
                    package: package.name.to_string(),
                    channel: channel.name.to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}
