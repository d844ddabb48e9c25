//! core
//!
//! Core domain types, environment capture, configuration and locking.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, RepoIdentity, CommitIdentity
//! - [`env`] - Process environment captured once per invocation
//! - [`config`] - Configuration schema and loading
//! - [`lock`] - Job-level publish lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Ambient process state is read once and passed down explicitly
//! - Schemas are strict and self-describing

pub mod config;
pub mod env;
pub mod lock;
pub mod types;
