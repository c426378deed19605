//! Coupon administration (back-office)

use std::sync::Arc;

use caja_db::{CouponRepository, CreateCoupon, DbError};
use caja_types::{AuditAction, Coupon, CouponStatus, Plan, UserId};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::subscription::audit_entry;
use crate::{SubscriptionConfig, SubscriptionError};

const MIN_CODE_LEN: usize = 4;
const MAX_CODE_LEN: usize = 32;
const GENERATED_SUFFIX_LEN: usize = 8;

/// Default and maximum page size for coupon listings
pub const MAX_LIST_LIMIT: i64 = 500;

/// Canonical form of a user-typed coupon code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Check a (normalized) code: 4-32 chars of `A-Z`, `0-9`, `-`
pub fn validate_code(code: &str) -> Result<(), SubscriptionError> {
    if code.len() < MIN_CODE_LEN || code.len() > MAX_CODE_LEN {
        return Err(SubscriptionError::InvalidCouponCode(format!(
            "length must be {MIN_CODE_LEN}-{MAX_CODE_LEN} characters"
        )));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(SubscriptionError::InvalidCouponCode(
            "use letters, digits and '-' only".to_string(),
        ));
    }

    Ok(())
}

/// Random code of the form `PREFIX-1A2B3C4D`
pub fn generate_code(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    let prefix = normalize_code(prefix);
    if prefix.is_empty() {
        random[..GENERATED_SUFFIX_LEN].to_string()
    } else {
        format!("{prefix}-{}", &random[..GENERATED_SUFFIX_LEN])
    }
}

/// Coupon issuing and listing
pub struct CouponService<C: CouponRepository> {
    repo: Arc<C>,
    code_prefix: String,
}

impl<C: CouponRepository> CouponService<C> {
    /// Create a new coupon service
    pub fn new(config: &SubscriptionConfig, repo: Arc<C>) -> Self {
        Self {
            repo,
            code_prefix: config.coupon_code_prefix.clone(),
        }
    }

    /// Issue a coupon. Uses `code` if given, otherwise generates one.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        code: Option<&str>,
        coupon_type: Plan,
        created_by: Option<UserId>,
    ) -> Result<Coupon, SubscriptionError> {
        let code = match code {
            Some(code) => normalize_code(code),
            None => generate_code(&self.code_prefix),
        };
        validate_code(&code)?;

        let audit = audit_entry(
            created_by,
            AuditAction::CouponCreated,
            format!("Coupon {code} created ({coupon_type})"),
        );

        let row = self
            .repo
            .create(
                CreateCoupon {
                    id: Uuid::new_v4(),
                    code: code.clone(),
                    coupon_type: coupon_type.as_str().to_string(),
                },
                audit,
            )
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation(_) => SubscriptionError::DuplicateCoupon(code.clone()),
                other => other.into(),
            })?;

        info!(coupon = %code, coupon_type = %coupon_type, "Coupon created");
        Ok(row.try_into()?)
    }

    /// List coupons, newest first
    pub async fn list(
        &self,
        status: Option<CouponStatus>,
        limit: i64,
    ) -> Result<Vec<Coupon>, SubscriptionError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let rows = self
            .repo
            .list(status.as_ref().map(CouponStatus::as_str), limit)
            .await?;

        rows.into_iter()
            .map(|row| Coupon::try_from(row).map_err(SubscriptionError::from))
            .collect()
    }
}

impl<C: CouponRepository> std::fmt::Debug for CouponService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponService")
            .field("code_prefix", &self.code_prefix)
            .finish()
    }
}
