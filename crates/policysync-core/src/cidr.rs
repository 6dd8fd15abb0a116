// ── Desired CIDR sets ──
//
// An ordered set of IPv4 CIDR strings. Ordering makes every payload built
// from the same members byte-identical; the IPv6 filter runs on every
// insertion path so a `:` entry can never reach a selector.

use std::collections::BTreeSet;

use serde::Serialize;

use policysync_api::{Selector, SelectorTerm};

use crate::reconcile::selector::CidrAction;

/// Set of IPv4 CIDR strings in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CidrSet(BTreeSet<String>);

/// IPv6 prefixes always contain a colon; IPv4 never do.
fn is_ipv4(cidr: &str) -> bool {
    !cidr.contains(':')
}

impl CidrSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `cidr` unless it is IPv6. Returns whether the set changed.
    pub fn insert(&mut self, cidr: impl Into<String>) -> bool {
        let raw = cidr.into();
        let cidr = raw.trim();
        if cidr.is_empty() || !is_ipv4(cidr) {
            return false;
        }
        self.0.insert(cidr.to_owned())
    }

    pub fn contains(&self, cidr: &str) -> bool {
        self.0.contains(cidr)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// `ADD` is union, `DELETE` is difference.
    #[must_use]
    pub fn apply(&self, action: CidrAction, operand: &Self) -> Self {
        match action {
            CidrAction::Add => self.union(operand),
            CidrAction::Delete => self.difference(operand),
        }
    }

    /// `{any: [{all: {cidr}} ...]}` in set order.
    pub fn to_selector(&self) -> Selector {
        Selector {
            any: self.iter().map(SelectorTerm::cidr).collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for CidrSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for cidr in iter {
            set.insert(cidr);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for CidrSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for cidr in iter {
            self.insert(cidr);
        }
    }
}

impl<'a> IntoIterator for &'a CidrSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn ipv6_entries_are_dropped() {
        let set: CidrSet = ["192.30.252.0/22", "2a0a:a440::/29", "140.82.112.0/20", "::1/128"]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["140.82.112.0/20", "192.30.252.0/22"]
        );
        assert!(set.to_selector().any.iter().all(|t| {
            t.all.cidr.as_deref().is_some_and(|c| !c.contains(':'))
        }));
    }

    #[test]
    fn add_is_union() {
        let current: CidrSet = ["1.1.1.1/32"].into_iter().collect();
        let operand: CidrSet = ["10.0.0.0/8"].into_iter().collect();
        let next = current.apply(CidrAction::Add, &operand);
        assert_eq!(next.iter().collect::<Vec<_>>(), vec!["1.1.1.1/32", "10.0.0.0/8"]);
    }

    #[test]
    fn delete_is_difference() {
        let current: CidrSet = ["1.1.1.1/32"].into_iter().collect();
        let next = current.apply(CidrAction::Delete, &current.clone());
        assert!(next.is_empty());
    }

    #[test]
    fn duplicates_and_blanks_collapse() {
        let mut set = CidrSet::new();
        assert!(set.insert("10.0.0.0/8"));
        assert!(!set.insert(" 10.0.0.0/8 "));
        assert!(!set.insert(""));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn selector_order_is_independent_of_input_order() {
        let a: CidrSet = ["10.0.0.0/8", "1.1.1.1/32"].into_iter().collect();
        let b: CidrSet = ["1.1.1.1/32", "10.0.0.0/8"].into_iter().collect();
        assert_eq!(a.to_selector(), b.to_selector());
    }
}
