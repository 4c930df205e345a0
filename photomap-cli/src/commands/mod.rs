//! CLI command implementations.

pub mod cache;
pub mod config;
pub mod init;
pub mod photos;
pub mod profile;
pub mod watch;
