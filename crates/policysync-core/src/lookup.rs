// ── Object lookup ──
//
// One place to answer "does the target already exist?". The result is
// consumed by the write dispatch (create vs update) so no caller filters
// the listing itself.

use policysync_api::AppDomain;

/// How a SmartGroup is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey<'k> {
    /// Deterministic name (scheduled syncs).
    Name(&'k str),
    /// Caller-supplied UUID (event-driven updates).
    Uuid(&'k str),
}

impl GroupKey<'_> {
    pub fn matches(&self, group: &AppDomain) -> bool {
        match self {
            Self::Name(name) => group.name == *name,
            Self::Uuid(uuid) => group.uuid == *uuid,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(s) | Self::Uuid(s) => s,
        }
    }
}

impl std::fmt::Display for GroupKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::Uuid(uuid) => write!(f, "uuid {uuid}"),
        }
    }
}

/// Outcome of a lookup against the current listing.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a, T> {
    Existing(&'a T),
    Absent,
}

// Manual impls: a borrowed lookup is `Copy` whatever `T` is.
impl<T> Clone for Lookup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Lookup<'_, T> {}

impl<'a, T> Lookup<'a, T> {
    pub fn existing(self) -> Option<&'a T> {
        match self {
            Self::Existing(obj) => Some(obj),
            Self::Absent => None,
        }
    }
}

/// First group in `groups` matching `key`.
pub fn find_by_key<'a>(groups: &'a [AppDomain], key: GroupKey<'_>) -> Lookup<'a, AppDomain> {
    groups
        .iter()
        .find(|g| key.matches(g))
        .map_or(Lookup::Absent, Lookup::Existing)
}

#[cfg(test)]
mod tests {
    use policysync_api::Selector;
    use serde_json::Map;

    use super::*;

    fn group(uuid: &str, name: &str) -> AppDomain {
        AppDomain {
            uuid: uuid.into(),
            name: name.into(),
            selector: Selector::default(),
            extra: Map::new(),
        }
    }

    #[test]
    fn finds_by_name_and_uuid() {
        let groups = vec![group("u1", "external_github_git"), group("u2", "fqdn_a_com")];

        let by_name = find_by_key(&groups, GroupKey::Name("fqdn_a_com"));
        assert_eq!(by_name.existing().map(|g| g.uuid.as_str()), Some("u2"));

        let by_uuid = find_by_key(&groups, GroupKey::Uuid("u1"));
        assert_eq!(
            by_uuid.existing().map(|g| g.name.as_str()),
            Some("external_github_git")
        );
    }

    #[test]
    fn miss_is_absent() {
        let groups = vec![group("u1", "external_github_git")];
        assert!(matches!(
            find_by_key(&groups, GroupKey::Uuid("external_github_git")),
            Lookup::Absent
        ));
    }
}
