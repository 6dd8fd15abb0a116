// ── Session setup ──
//
// One login per run. The returned client carries the CID for every
// subsequent call and is dropped at the end of the run.

use secrecy::ExposeSecret;
use tracing::{debug, info};

use policysync_api::{ControllerClient, CopilotClient};

use crate::config::{ControllerConfig, CopilotConfig};
use crate::error::CoreError;

/// Build a controller client from `config` and log in.
pub async fn connect(config: &ControllerConfig) -> Result<ControllerClient, CoreError> {
    let client = ControllerClient::new(config.url.clone(), &config.transport())?;

    debug!(controller = %config.url, user = %config.username, "logging in");
    client.login(&config.username, &config.password).await?;
    info!(controller = %config.url, "controller session established");

    Ok(client)
}

/// Build a CoPilot client from `config` and log in.
pub async fn connect_copilot(config: &CopilotConfig) -> Result<CopilotClient, CoreError> {
    if config.password.expose_secret().is_empty() {
        return Err(CoreError::Config {
            message: "CoPilot password is empty".into(),
        });
    }

    let client = CopilotClient::new(config.url.clone(), &config.transport())?;
    client.login(&config.username, &config.password).await?;
    info!(copilot = %config.url, "CoPilot session established");

    Ok(client)
}
