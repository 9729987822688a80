//! Storage modules: config, credentials

pub mod config;
pub mod credentials;
