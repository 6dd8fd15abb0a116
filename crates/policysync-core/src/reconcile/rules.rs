// ── DCF rule-list reconciliation ──
//
// The controller only accepts the rule list as a whole, so every action
// is expressed as "current list in, next full list out". Order is
// whatever the caller produced; nothing is sorted or renumbered.

use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use policysync_api::PolicyRule;

use crate::error::CoreError;

/// Action names accepted on the rule-list surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleListActionKind {
    AddRule,
    DeleteRule,
    ReplaceRule,
    ReplaceList,
}

impl RuleListActionKind {
    pub fn parse(action: &str) -> Result<Self, CoreError> {
        action
            .parse()
            .map_err(|_| CoreError::invalid_action(action, Self::VARIANTS))
    }
}

/// A validated rule-list change with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleListAction {
    /// Append; duplicates and priority clashes are the caller's concern.
    AddRule(PolicyRule),
    /// Drop the rule with this UUID. A miss leaves the list unchanged.
    DeleteRule { uuid: String },
    /// Drop the rule with the same UUID, then append this one.
    ///
    /// The replacement lands at the end of the list rather than in the
    /// old rule's slot.
    ReplaceRule(PolicyRule),
    /// Write this list verbatim.
    ReplaceList(Vec<PolicyRule>),
}

impl RuleListAction {
    /// Assemble an action from loosely-typed request fields.
    ///
    /// The action name is checked first, so an unknown action is always
    /// reported as such even when its payload is also malformed.
    pub fn from_parts(
        action: &str,
        rule: Option<PolicyRule>,
        rule_uuid: Option<String>,
        policy_list: Option<Vec<PolicyRule>>,
    ) -> Result<Self, CoreError> {
        let kind = RuleListActionKind::parse(action)?;
        let missing = |field: &str| CoreError::InvalidRequest {
            message: format!("{kind} requires '{field}'"),
        };

        match kind {
            RuleListActionKind::AddRule => Ok(Self::AddRule(rule.ok_or_else(|| missing("rule"))?)),
            RuleListActionKind::DeleteRule => Ok(Self::DeleteRule {
                uuid: rule_uuid.ok_or_else(|| missing("rule_uuid"))?,
            }),
            RuleListActionKind::ReplaceRule => {
                let mut rule = rule.ok_or_else(|| missing("rule"))?;
                if rule.uuid().is_none() {
                    rule.set_uuid(rule_uuid.ok_or_else(|| missing("rule.uuid"))?);
                }
                Ok(Self::ReplaceRule(rule))
            }
            RuleListActionKind::ReplaceList => Ok(Self::ReplaceList(
                policy_list.ok_or_else(|| missing("policy_list"))?,
            )),
        }
    }

    pub fn kind(&self) -> RuleListActionKind {
        match self {
            Self::AddRule(_) => RuleListActionKind::AddRule,
            Self::DeleteRule { .. } => RuleListActionKind::DeleteRule,
            Self::ReplaceRule(_) => RuleListActionKind::ReplaceRule,
            Self::ReplaceList(_) => RuleListActionKind::ReplaceList,
        }
    }
}

fn without_uuid(current: &[PolicyRule], uuid: &str) -> Vec<PolicyRule> {
    current
        .iter()
        .filter(|r| r.uuid() != Some(uuid))
        .cloned()
        .collect()
}

/// The full list to write after applying `action` to `current`.
pub fn next_rule_list(current: &[PolicyRule], action: &RuleListAction) -> Vec<PolicyRule> {
    match action {
        RuleListAction::AddRule(rule) => {
            let mut next = current.to_vec();
            next.push(rule.clone());
            next
        }
        RuleListAction::DeleteRule { uuid } => without_uuid(current, uuid),
        RuleListAction::ReplaceRule(rule) => {
            let mut next = match rule.uuid() {
                Some(uuid) => without_uuid(current, uuid),
                None => current.to_vec(),
            };
            next.push(rule.clone());
            next
        }
        RuleListAction::ReplaceList(rules) => rules.clone(),
    }
}
