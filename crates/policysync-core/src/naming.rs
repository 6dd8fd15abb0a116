// ── SmartGroup naming convention ──
//
// Groups managed by the scheduled syncs are addressed by name alone.
// The name is derived from the desired-state key and is the only join
// between what the source publishes and what the controller holds.

/// Prefix for groups mirroring a meta-IP endpoint.
pub const GITHUB_PREFIX: &str = "external_github_";

/// Prefix for groups mirroring an FQDN's A records.
pub const FQDN_PREFIX: &str = "fqdn_";

/// `git` -> `external_github_git`
pub fn github_group_name(endpoint: &str) -> String {
    format!("{GITHUB_PREFIX}{endpoint}")
}

/// `www.example.com` -> `fqdn_www_example_com`
pub fn fqdn_group_name(fqdn: &str) -> String {
    format!("{FQDN_PREFIX}{}", fqdn.replace('.', "_"))
}

/// Inverse of [`fqdn_group_name`]. `None` when `name` lacks the prefix
/// or nothing follows it.
///
/// Every `_` decodes to `.`, so labels that themselves contain an
/// underscore cannot be expressed.
pub fn fqdn_from_group_name(name: &str) -> Option<String> {
    let encoded = name.strip_prefix(FQDN_PREFIX)?;
    if encoded.is_empty() {
        return None;
    }
    Some(encoded.replace('_', "."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_name_decodes_underscores_to_dots() {
        assert_eq!(
            fqdn_from_group_name("fqdn_www_example_com").as_deref(),
            Some("www.example.com")
        );
    }

    #[test]
    fn fqdn_name_round_trips() {
        let name = fqdn_group_name("api.github.com");
        assert_eq!(name, "fqdn_api_github_com");
        assert_eq!(fqdn_from_group_name(&name).as_deref(), Some("api.github.com"));
    }

    #[test]
    fn unrelated_names_do_not_decode() {
        assert_eq!(fqdn_from_group_name("external_github_git"), None);
        assert_eq!(fqdn_from_group_name("fqdn_"), None);
    }

    #[test]
    fn github_name_is_prefixed() {
        assert_eq!(github_group_name("actions"), "external_github_actions");
    }
}
