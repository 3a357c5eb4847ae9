//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod client_cases;
pub mod dto;
pub mod error;
pub mod files;
pub mod health;
pub mod marketplace;
pub mod quotes;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod webhooks;

pub use error::ApiResult;
