//! Caja Types - Shared domain types
//!
//! This crate contains domain types used across Caja services:
//! - Tenant, user and subscription identifiers
//! - Document types and their numbering prefixes
//! - Subscription plans, statuses and access results
//! - Coupons and audit log actions

pub mod audit;
pub mod coupon;
pub mod document;
pub mod error;
pub mod ids;
pub mod subscription;

pub use audit::*;
pub use coupon::*;
pub use document::*;
pub use error::*;
pub use ids::*;
pub use subscription::*;
