//! # GCP keepalive agent
//!
//! Keeps a CI-provisioned Compute Engine instance alive only while the CircleCI pipeline that
//! created it is still running. Once no workflow of the pipeline is running, or once the maximum
//! lifetime configured through instance metadata elapses, the instance deletes itself.

pub mod agent;
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod terminator;
pub mod utils;
