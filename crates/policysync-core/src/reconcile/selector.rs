// ── CIDR-selector reconciliation ──
//
// Pure planning for SmartGroup writes: turn a target (matched or not)
// plus a desired CIDR set into the exact request to issue. Nothing
// here performs I/O.

use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use policysync_api::{AppDomain, AppDomainSpec};

use crate::cidr::CidrSet;
use crate::error::CoreError;
use crate::lookup::Lookup;

/// Set operation applied to a group's current CIDRs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CidrAction {
    Add,
    Delete,
}

impl CidrAction {
    /// Exact, case-sensitive match on `ADD` / `DELETE`.
    pub fn parse(action: &str) -> Result<Self, CoreError> {
        action
            .parse()
            .map_err(|_| CoreError::invalid_action(action, Self::VARIANTS))
    }
}

/// Request body for a group named `name` selecting exactly `cidrs`.
pub fn build_spec(name: &str, cidrs: &CidrSet) -> AppDomainSpec {
    AppDomainSpec {
        name: name.to_owned(),
        selector: cidrs.to_selector(),
    }
}

/// Current CIDRs of an existing group, IPv6 already removed.
pub fn current_cidrs(group: &AppDomain) -> CidrSet {
    group.cidrs().collect()
}

/// The single write a reconciliation step will issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePlan {
    /// `POST` a new group.
    Create(AppDomainSpec),
    /// `PUT` a full replacement of group `uuid`.
    Update { uuid: String, spec: AppDomainSpec },
}

impl WritePlan {
    /// `Existing` becomes an update of that group; `Absent` becomes a create.
    ///
    /// The name in the spec is taken as given: callers pass the matched
    /// group's own name when addressing by UUID.
    pub fn for_target(target: Lookup<'_, AppDomain>, name: &str, cidrs: &CidrSet) -> Self {
        let spec = build_spec(name, cidrs);
        match target {
            Lookup::Existing(group) => Self::Update {
                uuid: group.uuid.clone(),
                spec,
            },
            Lookup::Absent => Self::Create(spec),
        }
    }

    pub fn spec(&self) -> &AppDomainSpec {
        match self {
            Self::Create(spec) | Self::Update { spec, .. } => spec,
        }
    }

    /// `"create"` or `"update"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
        }
    }
}
