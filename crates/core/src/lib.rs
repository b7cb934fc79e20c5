//! Banyan Core - Shared types library.
//!
//! This crate provides the common domain types used by the Banyan API:
//! entity identifiers, validated email addresses, roles, the product
//! category set, and the order status / payment method enums.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
