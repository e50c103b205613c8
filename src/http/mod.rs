//! HTTP plumbing shared by the metadata, pipeline and terminator clients.
pub mod client;
pub mod config;
pub mod reqwest;
