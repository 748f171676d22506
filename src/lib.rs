//! Identity governance connector for HashiCorp Vault.
//!
//! Syncs userpass users, roles, ACL policies, secrets engines, auth methods,
//! identity groups and entities into a uniform resource graph, and grants or
//! revokes policy membership on users.

pub mod bootstrap;
pub mod cli;
pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod membership;
pub mod pagination;
pub mod resources;
pub mod sync;
pub mod sync_loop;

pub use connector::{Connector, ResourceSyncer};
pub use error::{ConnectorError, Result};
