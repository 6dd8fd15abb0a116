// ── Reconciliation planning ──
//
// Pure next-state computation for both target shapes. The async
// drivers in `crate::reconciler` fetch current state, call into here,
// and issue the resulting write.

pub mod rules;
pub mod selector;

pub use rules::{RuleListAction, RuleListActionKind, next_rule_list};
pub use selector::{CidrAction, WritePlan, build_spec, current_cidrs};
