//! Desired-state reconciliation for controller policy objects.
//!
//! This crate owns the business logic that sits between `policysync-api`
//! and the CLI:
//!
//! - **[`Reconciler`]**: fetch current state, compute the next state,
//!   write it. Covers SmartGroups mirrored from published IP ranges,
//!   SmartGroups mirrored from DNS, explicit CIDR edits by UUID, and the
//!   ordered DCF rule list.
//!
//! - **Planning** ([`reconcile`]): pure next-state functions. A
//!   [`CidrSet`] plus a [`Lookup`] result becomes a [`WritePlan`]; a
//!   [`RuleListAction`] plus the current list becomes the next list.
//!
//! - **Seams** ([`backend`]): [`PolicyApi`], [`IpRangeSource`],
//!   [`HostResolver`], [`LogSource`]. The `policysync-api` clients
//!   implement them; tests plug in fakes.
//!
//! - **Events** ([`event`]): function-style handlers returning
//!   `{statusCode, headers, body}`.
//!
//! - **Egress** ([`egress`]): read-only WebGroup/SmartGroup
//!   recommendations from DCF logs.

pub mod backend;
pub mod cidr;
pub mod config;
pub mod egress;
pub mod error;
pub mod event;
pub mod lookup;
pub mod naming;
pub mod reconcile;
pub mod reconciler;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{HostResolver, IpRangeSource, LogSource, PolicyApi};
pub use cidr::CidrSet;
pub use config::{ControllerConfig, CopilotConfig, TlsVerification};
pub use egress::{EgressParams, EgressReport, Recommendation};
pub use error::CoreError;
pub use event::EventResponse;
pub use lookup::{GroupKey, Lookup, find_by_key};
pub use reconcile::{CidrAction, RuleListAction, RuleListActionKind, WritePlan};
pub use reconciler::{Reconciler, SyncOutcome};
pub use session::{connect, connect_copilot};
