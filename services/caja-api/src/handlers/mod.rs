//! REST API handlers

pub mod admin;
pub mod health;
pub mod sequence;
pub mod shared;
pub mod subscription;
pub mod webhook;

pub use admin::*;
pub use health::*;
pub use sequence::*;
pub use subscription::*;
pub use webhook::*;
