//! Shared service plumbing for the ERP sync workspace.
//!
//! Startup helpers (tracing, env config) and the HTTP bits every service
//! mounts (health handlers, request-id and trace layers, timestamp serializers).

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
