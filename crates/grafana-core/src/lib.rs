//! # grafana-core
//!
//! Core types and utilities for talking to the Grafana HTTP API.
//!
//! This crate provides the error taxonomy, typed identifiers, configuration and the
//! shared request executor used by the resource-specific client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`ids`] - Strongly-typed integer identifiers for Grafana resources
//! - [`types`] - Result wrappers shared by several endpoints
//! - [`config`] - Deserializable client configuration and environment loading
//! - [`client`] - Transport settings, the [`Executor`](client::Executor) trait and its reqwest implementation
//! - [`query`] - Query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use client::{ApiRequest, Executor, ServiceClient, ServiceClientBuilder, StatusPolicy};
pub use error::{Error, Result};
