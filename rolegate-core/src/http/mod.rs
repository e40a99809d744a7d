//! HTTP plumbing
//!
//! - [`role_server`] - in-process role-lookup endpoint for local runs and tests

pub mod role_server;

pub use role_server::{RoleLookupServer, ROLE_LOOKUP_PATH};
