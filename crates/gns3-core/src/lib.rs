//! # gns3-core
//!
//! Core types and utilities for working with a GNS3 server.
//!
//! This crate provides foundational types, error handling, and HTTP client settings
//! shared by the GNS3 REST client.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`uuid`] - Strongly-typed UUID wrappers for GNS3 resources
//! - [`types`] - Closed vocabularies used by the GNS3 API (node types, statuses, ...)
//! - [`config`] - Configuration structures for GNS3 clients
//! - [`client`] - HTTP client settings and retry logic

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod uuid;

// Re-export commonly used types
pub use error::{Error, Result};
