// policysync-api: Async Rust clients for the controller REST API and the
// external truth sources policy groups are reconciled against.

pub mod controller;
pub mod copilot;
pub mod dns;
pub mod error;
pub mod meta;
pub mod transport;

pub use controller::ControllerClient;
pub use controller::models::{
    AppDomain, AppDomainSpec, MatchAll, PolicyList, PolicyRule, RuleAction, Selector,
    SelectorTerm,
};
pub use copilot::CopilotClient;
pub use copilot::models::{DcfLogEntry, LogQuery};
pub use dns::DnsResolver;
pub use error::Error;
pub use meta::{GITHUB_API_URL, MetaClient, MetaRanges};
pub use transport::{TlsMode, TransportConfig};
