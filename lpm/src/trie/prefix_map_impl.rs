// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::prefix::{IpPrefix, Representable};
use crate::trie::TrieMap;
use prefix_trie::PrefixMap;
use std::fmt::Debug;

#[derive(Debug, Clone)]
struct IpPrefixW<P: IpPrefix>(P);

impl<P: IpPrefix> prefix_trie::Prefix for IpPrefixW<P> {
    type R = P::Repr;

    fn repr(&self) -> Self::R {
        self.0.network().to_bits()
    }

    fn prefix_len(&self) -> u8 {
        self.0.len()
    }

    fn from_repr_len(repr: Self::R, len: u8) -> Self {
        IpPrefixW(P::new_masked(P::Addr::from_bits(repr), len))
    }
}

/// Longest prefix match table backed by [`prefix_trie::PrefixMap`].
#[derive(Clone)]
pub struct PrefixMapTrie<P, V>(PrefixMap<IpPrefixW<P>, V>)
where
    P: IpPrefix,
    V: Clone;

impl<P, V> Default for PrefixMapTrie<P, V>
where
    P: IpPrefix,
    V: Clone,
{
    fn default() -> Self {
        Self(PrefixMap::new())
    }
}

impl<P, V> Debug for PrefixMapTrie<P, V>
where
    P: IpPrefix,
    V: Clone + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<P, V> PrefixMapTrie<P, V>
where
    P: IpPrefix,
    V: Clone,
{
    /// An empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding `value` for the default route, so that every lookup matches
    #[must_use]
    pub fn with_root(value: V) -> Self {
        let mut ret = Self::new();
        ret.insert(P::ROOT, value);
        ret
    }
}

impl<P, V> TrieMap for PrefixMapTrie<P, V>
where
    P: IpPrefix,
    V: Clone,
{
    type Prefix = P;
    type Value = V;

    fn iter(&self) -> impl Iterator<Item = (&P, &V)> {
        self.0.iter().map(|(p, v)| (&p.0, v))
    }

    fn get(&self, prefix: &P) -> Option<&V> {
        self.0.get(&IpPrefixW(prefix.clone()))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, prefix: P, value: V) -> Option<V> {
        self.0.insert(IpPrefixW(prefix), value)
    }

    fn remove(&mut self, prefix: &P) -> Option<V> {
        self.0.remove(&IpPrefixW(prefix.clone()))
    }

    fn lookup<Q>(&self, addr: &Q) -> Option<(&P, &V)>
    where
        Q: Into<P> + Clone,
    {
        self.0
            .get_lpm(&IpPrefixW(addr.clone().into()))
            .map(|x| (&x.0.0, x.1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::prefix::{Ipv4Prefix, Ipv6Prefix};
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn longest_match_wins() {
        let mut trie = PrefixMapTrie::<Ipv4Prefix, u32>::with_root(0);
        trie.insert("10.0.0.0/8".parse().unwrap(), 8);
        trie.insert("10.1.0.0/16".parse().unwrap(), 16);
        trie.insert(Ipv4Prefix::from(Ipv4Addr::new(10, 1, 2, 3)), 32);
        assert_eq!(trie.len(), 4);

        assert_eq!(trie.lookup(&Ipv4Addr::new(10, 1, 2, 3)).unwrap().1, &32);
        assert_eq!(trie.lookup(&Ipv4Addr::new(10, 1, 2, 4)).unwrap().1, &16);
        assert_eq!(trie.lookup(&Ipv4Addr::new(10, 2, 0, 0)).unwrap().1, &8);
        assert_eq!(trie.lookup(&Ipv4Addr::new(192, 0, 2, 1)).unwrap().1, &0);
    }

    #[test]
    fn exact_get_and_remove() {
        let mut trie = PrefixMapTrie::<Ipv6Prefix, &str>::new();
        assert!(trie.is_empty());
        let prefix: Ipv6Prefix = "64:ff9b::/96".parse().unwrap();
        trie.insert(prefix, "well-known");
        let embedded = Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0xc000, 0x0201);
        assert_eq!(trie.lookup(&embedded).map(|(p, _)| *p), Some(prefix));
        assert!(trie.get(&Ipv6Prefix::from(embedded)).is_none());
        assert_eq!(trie.remove(&prefix), Some("well-known"));
        assert!(trie.lookup(&embedded).is_none());
    }

    #[test]
    fn lookups_agree_with_covering() {
        use crate::prefix::IpPrefixCovering;
        bolero::check!()
            .with_type::<(Vec<Ipv4Prefix>, u32)>()
            .for_each(|(prefixes, addr)| {
                let addr = Ipv4Addr::from_bits(*addr);
                let mut trie = PrefixMapTrie::<Ipv4Prefix, u8>::new();
                for prefix in prefixes {
                    trie.insert(*prefix, prefix.len());
                }
                let best = prefixes
                    .iter()
                    .filter(|p| p.covers(&addr))
                    .map(IpPrefix::len)
                    .max();
                assert_eq!(trie.lookup(&addr).map(|(_, len)| *len), best);
            });
    }
}
