//! Subscription status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created ahead of payment confirmation.
    Pending,
    /// Paid and in its billing period.
    Active,
    /// Lapsed; may be reactivated.
    Inactive,
    /// Ended by the customer or an operator.
    Cancelled,
}

impl SubscriptionStatus {
    /// Open rows count against the one-per-(entity, plan) rule.
    pub fn is_open(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn successors(&self) -> &'static [Self] {
        use SubscriptionStatus::*;
        match self {
            Pending => &[Active, Cancelled],
            Active => &[Inactive, Cancelled],
            Inactive => &[Active, Cancelled],
            Cancelled => &[],
        }
    }
}
