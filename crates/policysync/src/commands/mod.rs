//! Command dispatch: bridges CLI args -> reconciler calls -> output formatting.

pub mod config_cmd;
pub mod egress;
pub mod fqdn;
pub mod github;
pub mod groups;
pub mod invoke;
pub mod rules;
pub mod util;

use std::time::Duration;

use policysync_api::{ControllerClient, TransportConfig};
use policysync_core::{ControllerConfig, CoreError};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;

/// Everything a controller-bound command needs, resolved before any
/// request is sent.
pub struct Context<'a> {
    pub global: &'a GlobalOpts,
    pub config: &'a Config,
    pub profile_name: String,
    pub profile: Profile,
    controller: ControllerConfig,
}

impl<'a> Context<'a> {
    pub fn new(global: &'a GlobalOpts, config: &'a Config) -> Result<Self, CliError> {
        let (profile_name, profile) = config::effective_profile(global, config)?;
        let controller = config::resolve_controller_config(global, config)?;
        Ok(Self {
            global,
            config,
            profile_name,
            profile,
            controller,
        })
    }

    /// Log in to the controller.
    pub async fn connect(&self) -> Result<ControllerClient, CliError> {
        policysync_core::connect(&self.controller)
            .await
            .map_err(|err| match err {
                CoreError::Authentication { message } => CliError::AuthFailed {
                    profile: self.profile_name.clone(),
                    message,
                },
                other => other.into(),
            })
    }

    /// Transport settings of the controller session.
    pub fn transport(&self) -> TransportConfig {
        self.controller.transport()
    }

    pub fn timeout(&self) -> Duration {
        self.controller.timeout
    }
}

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::new(global, config)?;
    tracing::debug!(profile = %ctx.profile_name, "resolved controller profile");

    match cmd {
        Command::Github(args) => github::handle(&ctx, args).await,
        Command::Fqdn(args) => fqdn::handle(&ctx, args).await,
        Command::Groups(args) => groups::handle(&ctx, args).await,
        Command::Rules(args) => rules::handle(&ctx, args).await,
        Command::Invoke(args) => invoke::handle(&ctx, args).await,
        Command::Egress(args) => egress::handle(&ctx, args).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
