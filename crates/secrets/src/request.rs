//! Resolution requests

use crate::{SecretPath, SecretRef};
use indexmap::{IndexMap, IndexSet};

/// A set of references resolved together in one call.
///
/// Duplicate references collapse into one entry; first-occurrence order is
/// kept so results can be reported in the order the host asked for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionRequest {
    refs: IndexSet<SecretRef>,
}

impl ResolutionRequest {
    /// Create an empty request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference, builder style.
    #[must_use]
    pub fn with(mut self, path: impl Into<SecretPath>, key: impl Into<String>) -> Self {
        self.push(SecretRef::new(path, key));
        self
    }

    /// Add a reference. Returns `false` if it was already requested.
    pub fn push(&mut self, reference: SecretRef) -> bool {
        self.refs.insert(reference)
    }

    /// Check if `reference` is part of the request.
    #[must_use]
    pub fn contains(&self, reference: &SecretRef) -> bool {
        self.refs.contains(reference)
    }

    /// Number of distinct references
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if nothing was requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Iterate over the references in request order.
    pub fn iter(&self) -> impl Iterator<Item = &SecretRef> {
        self.refs.iter()
    }

    /// Number of distinct paths, i.e. the number of fetches a resolve costs.
    #[must_use]
    pub fn distinct_paths(&self) -> usize {
        self.groups().len()
    }

    /// Partition the requested keys by path.
    ///
    /// Paths are keyed by [`SecretPath::normalized`], so `secret/app` and
    /// `/secret/app` share one group. Paths appear in order of their first
    /// reference, keys in request order.
    #[must_use]
    pub fn groups(&self) -> IndexMap<SecretPath, IndexSet<String>> {
        let mut groups: IndexMap<SecretPath, IndexSet<String>> = IndexMap::new();
        for reference in &self.refs {
            groups
                .entry(SecretPath::new(reference.path.normalized()))
                .or_default()
                .insert(reference.key.clone());
        }
        groups
    }
}

impl FromIterator<SecretRef> for ResolutionRequest {
    fn from_iter<I: IntoIterator<Item = SecretRef>>(iter: I) -> Self {
        Self {
            refs: iter.into_iter().collect(),
        }
    }
}

impl Extend<SecretRef> for ResolutionRequest {
    fn extend<I: IntoIterator<Item = SecretRef>>(&mut self, iter: I) {
        self.refs.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ResolutionRequest {
    type Item = &'a SecretRef;
    type IntoIter = indexmap::set::Iter<'a, SecretRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.refs.iter()
    }
}
