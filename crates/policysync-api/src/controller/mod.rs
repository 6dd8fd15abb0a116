// Controller API client modules
//
// Hand-written client for the controller's v2 login and v2.5 REST
// endpoints: SmartGroup CRUD and the DCF policy list.

pub mod app_domains;
pub mod auth;
pub mod client;
pub mod models;
pub mod policy_list;

pub use client::ControllerClient;
