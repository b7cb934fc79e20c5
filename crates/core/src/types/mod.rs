//! Core types for Banyan.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod role;

pub use catalog::ProductCategory;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{OrderStatus, PaymentMethod};
pub use role::Role;
