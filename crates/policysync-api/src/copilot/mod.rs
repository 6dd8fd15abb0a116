// CoPilot log API client modules

pub mod client;
pub mod models;

pub use client::CopilotClient;
