//! # Subscription Plans
//!
//! Each install runs on a plan that caps how many users and products it can
//! hold.
//!
//! | Plan     | Users | Products  |
//! |----------|-------|-----------|
//! | Gratuit  | 2     | 50        |
//! | Standard | 5     | 500       |
//! | Premium  | ∞     | ∞         |

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Gratuit,
    Standard,
    Premium,
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Gratuit
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Plan::Gratuit => "gratuit",
            Plan::Standard => "standard",
            Plan::Premium => "premium",
        };
        f.write_str(name)
    }
}

impl Plan {
    /// `None` means unlimited.
    pub const fn max_users(&self) -> Option<i64> {
        match self {
            Plan::Gratuit => Some(2),
            Plan::Standard => Some(5),
            Plan::Premium => None,
        }
    }

    pub const fn max_products(&self) -> Option<i64> {
        match self {
            Plan::Gratuit => Some(50),
            Plan::Standard => Some(500),
            Plan::Premium => None,
        }
    }
}

/// Fails when adding one more user would exceed the plan.
pub fn check_user_limit(plan: Plan, current: i64) -> CoreResult<()> {
    check(plan, "users", plan.max_users(), current)
}

/// Fails when adding one more product would exceed the plan.
pub fn check_product_limit(plan: Plan, current: i64) -> CoreResult<()> {
    check(plan, "products", plan.max_products(), current)
}

fn check(plan: Plan, resource: &str, limit: Option<i64>, current: i64) -> CoreResult<()> {
    match limit {
        Some(limit) if current >= limit => Err(CoreError::SubscriptionLimit {
            resource: resource.to_string(),
            limit,
            plan: plan.to_string(),
        }),
        _ => Ok(()),
    }
}
