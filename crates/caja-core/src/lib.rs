//! Caja Core - Document sequencing and subscription lifecycle logic
//!
//! - [`DocumentSequencer`]: gap-free per-tenant document numbers
//! - [`SubscriptionEngine`]: access gating, checkout, payment confirmation
//!   and coupon redemption
//! - [`CouponService`]: back-office coupon issuing
//! - [`PaymentWebhookVerifier`]: signed payment webhook parsing
//! - [`AuditTrail`]: audit log reads
//!
//! # Example
//!
//! ```rust,ignore
//! use caja_core::{DocumentSequencer, SubscriptionConfig, SubscriptionEngine};
//! use caja_db::Repositories;
//!
//! let sequencer = DocumentSequencer::new(Arc::new(repos.sequences.clone()));
//! let number = sequencer.next_number(&tenant_id, DocumentType::Sale).await?;
//!
//! let engine = SubscriptionEngine::new(
//!     &SubscriptionConfig::default(),
//!     Arc::new(repos.subscriptions.clone()),
//!     Arc::new(repos.coupons.clone()),
//! );
//! let evaluation = engine.evaluate(&user_id).await;
//! ```

pub mod audit;
pub mod config;
pub mod coupon;
pub mod error;
pub mod lifecycle;
pub mod sequence;
pub mod subscription;
pub mod webhook;

pub use audit::AuditTrail;
pub use config::SubscriptionConfig;
pub use coupon::CouponService;
pub use error::{SequenceError, SubscriptionError, WebhookError};
pub use lifecycle::{next_status, Decision, GracePolicy, Transition};
pub use sequence::DocumentSequencer;
pub use subscription::{Evaluation, SubscriptionEngine, COUPON_PAYMENT_METHOD};
pub use webhook::{constant_time_eq, PaymentEvent, PaymentEventType, PaymentWebhookVerifier};
