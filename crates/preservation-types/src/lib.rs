//! Shared types, adapter traits, and core utilities for preservation mode.
//!
//! This crate contains the foundational types shared between the policy core,
//! the server crate and all settings adapters. Keeping them in a separate
//! crate lets adapter crates depend on the data model without pulling in the
//! interception machinery.

pub mod action;
pub mod error;
pub mod extract;
pub mod prelude;
pub mod settings_adapter;
pub mod template;
pub mod types;
pub mod utils;

// vim: ts=4
