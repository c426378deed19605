//! Subscription engine - evaluation, coupon redemption and payment confirmation

use std::sync::Arc;

use caja_db::{
    ActivateSubscription, CouponRepository, CreateAuditEntry, CreateSubscription, DbError,
    RedeemCoupon, SubscriptionRepository,
};
use caja_types::{
    AccessStatus, AuditAction, Coupon, CouponStatus, Plan, Subscription, SubscriptionId,
    SubscriptionStatus, UserId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::coupon::normalize_code;
use crate::lifecycle::{GracePolicy, Transition};
use crate::webhook::{PaymentEvent, PaymentEventType};
use crate::{SubscriptionConfig, SubscriptionError};

/// Payment method recorded for coupon-granted subscriptions
pub const COUPON_PAYMENT_METHOD: &str = "coupon";

const MAX_PAYMENT_METHOD_LEN: usize = 64;

/// Result of gating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// What the page should render
    pub status: AccessStatus,
    /// The subscription the decision was based on, if any
    pub subscription: Option<Subscription>,
}

impl Evaluation {
    fn denied(subscription: Option<Subscription>) -> Self {
        Self {
            status: AccessStatus::Blocked,
            subscription,
        }
    }
}

/// Subscription lifecycle engine
///
/// Provides a unified interface for:
/// - Access evaluation on every protected page (fail closed)
/// - Checkout initiation and payment confirmation
/// - Coupon redemption
pub struct SubscriptionEngine<S: SubscriptionRepository, C: CouponRepository> {
    subscriptions: Arc<S>,
    coupons: Arc<C>,
    policy: GracePolicy,
}

impl<S: SubscriptionRepository, C: CouponRepository> SubscriptionEngine<S, C> {
    /// Create a new subscription engine
    pub fn new(config: &SubscriptionConfig, subscriptions: Arc<S>, coupons: Arc<C>) -> Self {
        Self {
            subscriptions,
            coupons,
            policy: GracePolicy::new(config.grace_period_days),
        }
    }

    /// Grace rules in effect
    pub fn policy(&self) -> GracePolicy {
        self.policy
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Decide what a user may see right now. Never fails: any error denies
    /// access.
    pub async fn evaluate(&self, user_id: &UserId) -> Evaluation {
        self.evaluate_at(user_id, Utc::now()).await
    }

    /// [`evaluate`](Self::evaluate) at an explicit instant
    #[instrument(skip(self))]
    pub async fn evaluate_at(&self, user_id: &UserId, now: DateTime<Utc>) -> Evaluation {
        match self.try_evaluate(user_id, now).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Subscription evaluation failed, denying access");
                metrics::counter!("caja_subscription_evaluation_errors_total").increment(1);
                Evaluation::denied(None)
            }
        }
    }

    async fn try_evaluate(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<Evaluation, DbError> {
        let Some(row) = self.subscriptions.find_latest_by_user_id(user_id.0).await? else {
            debug!(user_id = %user_id, "No subscription, denying access");
            return Ok(Evaluation::denied(None));
        };

        let mut sub = Subscription::try_from(row)?;
        let decision = self.policy.decide(sub.status, sub.end_date, now);

        if let (Some(transition), Some(end_date)) = (decision.transition, sub.end_date) {
            let audit = self.transition_audit(&sub, transition, end_date);
            let applied = self
                .subscriptions
                .transition_status(sub.id.0, sub.status.as_str(), decision.next.as_str(), audit)
                .await?;

            if applied {
                info!(
                    subscription_id = %sub.id,
                    from = %sub.status,
                    to = %decision.next,
                    "Subscription status changed"
                );
                metrics::counter!("caja_subscription_transitions_total", "to" => transition.as_str())
                    .increment(1);
                sub.status = decision.next;
                sub.updated_at = now;
            } else {
                debug!(subscription_id = %sub.id, "Transition already applied elsewhere");
            }
        }

        Ok(Evaluation {
            status: decision.access,
            subscription: Some(sub),
        })
    }

    fn transition_audit(
        &self,
        sub: &Subscription,
        transition: Transition,
        end_date: DateTime<Utc>,
    ) -> CreateAuditEntry {
        let grace_end = self.policy.grace_end(end_date);
        let (action, detail) = match transition {
            Transition::EnterGrace => (
                AuditAction::SubscriptionGrace,
                format!(
                    "Subscription {} entered grace period: ended {}, access until {}",
                    sub.id,
                    end_date.format("%Y-%m-%d"),
                    grace_end.format("%Y-%m-%d %H:%M:%S UTC"),
                ),
            ),
            Transition::Block => (
                AuditAction::SubscriptionBlocked,
                format!(
                    "Subscription {} blocked automatically: grace period ended {}",
                    sub.id,
                    grace_end.format("%Y-%m-%d %H:%M:%S UTC"),
                ),
            ),
        };

        audit_entry(Some(sub.user_id), action, detail)
    }

    // =========================================================================
    // Checkout and payment
    // =========================================================================

    /// Record a checkout as a pending subscription; it grants nothing until
    /// [`confirm_payment`](Self::confirm_payment) runs.
    #[instrument(skip(self))]
    pub async fn start_checkout(
        &self,
        user_id: &UserId,
        plan: Plan,
        payment_method: &str,
    ) -> Result<Subscription, SubscriptionError> {
        let payment_method = payment_method.trim();
        if payment_method.is_empty()
            || payment_method.len() > MAX_PAYMENT_METHOD_LEN
            || payment_method.eq_ignore_ascii_case(COUPON_PAYMENT_METHOD)
        {
            return Err(SubscriptionError::InvalidPaymentMethod);
        }

        let row = self
            .subscriptions
            .create(CreateSubscription {
                id: Uuid::new_v4(),
                user_id: user_id.0,
                plan: plan.as_str().to_string(),
                status: SubscriptionStatus::Pending.as_str().to_string(),
                start_date: None,
                end_date: None,
                payment_method: payment_method.to_string(),
            })
            .await?;

        let sub = Subscription::try_from(row)?;
        info!(subscription_id = %sub.id, plan = %plan, "Checkout started");
        Ok(sub)
    }

    /// Activate a subscription after the processor reported success.
    ///
    /// Already-active subscriptions are returned untouched, so duplicate
    /// webhook deliveries are harmless.
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Subscription, SubscriptionError> {
        let sub = self.load(subscription_id).await?;
        if sub.status == SubscriptionStatus::Active {
            debug!(subscription_id = %sub.id, "Already active, nothing to confirm");
            return Ok(sub);
        }

        let start_date = Utc::now();
        let end_date = period_end(sub.plan, start_date)?;
        let audit = audit_entry(
            Some(sub.user_id),
            AuditAction::PaymentConfirmed,
            format!(
                "Payment confirmed for subscription {}: {} plan until {}",
                sub.id,
                sub.plan,
                end_date.format("%Y-%m-%d"),
            ),
        );

        let activated = self
            .subscriptions
            .activate(ActivateSubscription {
                id: sub.id.0,
                start_date,
                end_date,
                audit,
            })
            .await?;

        match activated {
            Some(row) => {
                let sub = Subscription::try_from(row)?;
                info!(subscription_id = %sub.id, end_date = %end_date, "Payment confirmed");
                metrics::counter!("caja_payments_confirmed_total").increment(1);
                Ok(sub)
            }
            // A concurrent confirmation won; report what it stored
            None => self.load(subscription_id).await,
        }
    }

    /// Apply a verified payment webhook event.
    ///
    /// Returns the activated subscription, or `None` when the event needs
    /// no action (rejections, unknown types, unknown subscriptions).
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn apply_payment_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        match (&event.event_type, event.subscription_id) {
            (PaymentEventType::PaymentApproved, Some(id)) => match self.confirm_payment(&id).await {
                Ok(sub) => Ok(Some(sub)),
                Err(SubscriptionError::SubscriptionNotFound) => {
                    warn!(subscription_id = %id, "Payment approved for unknown subscription");
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            (PaymentEventType::PaymentApproved, None) => {
                warn!("Approved payment event without subscription reference");
                Ok(None)
            }
            (PaymentEventType::PaymentRejected, id) => {
                info!(subscription_id = ?id, "Payment rejected, subscription left as is");
                Ok(None)
            }
            (PaymentEventType::Unknown(kind), _) => {
                debug!(event_type = %kind, "Ignoring payment event");
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Redeem a coupon: grant a fresh active subscription and consume the
    /// coupon, all or nothing.
    #[instrument(skip(self, code))]
    pub async fn redeem_coupon(
        &self,
        user_id: &UserId,
        code: &str,
    ) -> Result<Subscription, SubscriptionError> {
        let code = normalize_code(code);
        let coupon: Coupon = self
            .coupons
            .find_by_code(&code)
            .await?
            .ok_or(SubscriptionError::InvalidCoupon)?
            .try_into()?;

        if coupon.status == CouponStatus::Used {
            return Err(SubscriptionError::AlreadyUsed);
        }

        let start_date = Utc::now();
        let end_date = period_end(coupon.coupon_type, start_date)?;
        let redemption = RedeemCoupon {
            code: coupon.code.clone(),
            coupon_type: coupon.coupon_type.as_str().to_string(),
            user_id: user_id.0,
            subscription: CreateSubscription {
                id: Uuid::new_v4(),
                user_id: user_id.0,
                plan: coupon.coupon_type.as_str().to_string(),
                status: SubscriptionStatus::Active.as_str().to_string(),
                start_date: Some(start_date),
                end_date: Some(end_date),
                payment_method: COUPON_PAYMENT_METHOD.to_string(),
            },
            audit: audit_entry(
                Some(*user_id),
                AuditAction::CouponRedeemed,
                format!(
                    "Coupon {} redeemed: {} subscription until {}",
                    coupon.code,
                    coupon.coupon_type,
                    end_date.format("%Y-%m-%d"),
                ),
            ),
        };

        let Some(row) = self.coupons.redeem(redemption).await? else {
            // Consumed between our read and the conditional update
            return Err(SubscriptionError::AlreadyUsed);
        };

        let sub = Subscription::try_from(row)?;
        info!(subscription_id = %sub.id, coupon = %coupon.code, "Coupon redeemed");
        metrics::counter!("caja_coupons_redeemed_total", "plan" => coupon.coupon_type.as_str())
            .increment(1);
        Ok(sub)
    }

    async fn load(&self, id: &SubscriptionId) -> Result<Subscription, SubscriptionError> {
        let row = self
            .subscriptions
            .find_by_id(id.0)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound)?;
        Ok(row.try_into()?)
    }
}

fn period_end(plan: Plan, start: DateTime<Utc>) -> Result<DateTime<Utc>, SubscriptionError> {
    plan.period_end(start)
        .ok_or_else(|| SubscriptionError::Internal(format!("{plan} period overflows from {start}")))
}

pub(crate) fn audit_entry(
    user_id: Option<UserId>,
    action: AuditAction,
    detail: String,
) -> CreateAuditEntry {
    CreateAuditEntry {
        id: Uuid::new_v4(),
        user_id: user_id.map(|u| u.0),
        action: action.as_str().to_string(),
        detail,
    }
}

impl<S: SubscriptionRepository, C: CouponRepository> std::fmt::Debug for SubscriptionEngine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
