// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tables keyed by IP prefix.

use crate::prefix::IpPrefix;

mod prefix_map_impl;
pub use prefix_map_impl::PrefixMapTrie;

/// A table of values keyed by prefixes of a single IP version.
///
/// Exact lookups go through [`TrieMap::get`], longest prefix match through [`TrieMap::lookup`].
pub trait TrieMap: Clone {
    /// Key type, [`crate::prefix::Ipv4Prefix`] or [`crate::prefix::Ipv6Prefix`]
    type Prefix: IpPrefix;
    /// Value type
    type Value;

    /// Value stored for exactly `prefix`
    fn get(&self, prefix: &Self::Prefix) -> Option<&Self::Value>;
    /// Value stored for the longest prefix covering `addr`, along with that prefix
    fn lookup<Q>(&self, addr: &Q) -> Option<(&Self::Prefix, &Self::Value)>
    where
        Q: Into<Self::Prefix> + Clone;

    /// Store `value` for `prefix`, returning what was stored there before
    fn insert(&mut self, prefix: Self::Prefix, value: Self::Value) -> Option<Self::Value>;
    fn remove(&mut self, prefix: &Self::Prefix) -> Option<Self::Value>;

    fn iter(&self) -> impl Iterator<Item = (&Self::Prefix, &Self::Value)>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}
