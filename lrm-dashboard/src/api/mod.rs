//! HTTP handlers for lrm-dashboard

pub mod account;
pub mod auth;
pub mod buildinfo;
pub mod export;
pub mod forms;
pub mod health;
pub mod json;
pub mod ui;

pub use health::health_routes;
