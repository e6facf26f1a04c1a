//! # scopebank
//!
//! PostgreSQL-backed manager for deduplicated domain scope lists used in
//! security reconnaissance workflows.
//!
//! ## Layers
//!
//! - [`validator`] - domain-format validation (hostnames, wildcards, service labels)
//! - [`filter`] - substring / regex predicates over stored domains
//! - [`store`] - PostgreSQL adapter: COPY-staged bulk inserts, streaming reads
//! - [`exporter`] - text and JSON serialization
//! - [`commands`] - one module per CLI verb
//! - [`config`] / [`error`] - layered configuration and error kinds with stable exit codes

pub mod commands;
pub mod config;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod store;
pub mod validator;
