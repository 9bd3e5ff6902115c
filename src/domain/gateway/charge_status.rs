//! Gateway charge status and its mapping to local payment status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::payment::PaymentStatus;

/// Charge status as reported by Pagar.me.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargeStatus {
    Paid,
    Authorized,
    AuthorizedPendingCapture,
    Pending,
    Processing,
    WaitingPayment,
    Refused,
    Failed,
    Canceled,
    Other(String),
}

impl ChargeStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" => ChargeStatus::Paid,
            "authorized" => ChargeStatus::Authorized,
            "authorized_pending_capture" => ChargeStatus::AuthorizedPendingCapture,
            "pending" => ChargeStatus::Pending,
            "processing" => ChargeStatus::Processing,
            "waiting_payment" => ChargeStatus::WaitingPayment,
            "refused" => ChargeStatus::Refused,
            "failed" => ChargeStatus::Failed,
            "canceled" | "cancelled" => ChargeStatus::Canceled,
            other => ChargeStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChargeStatus::Paid => "paid",
            ChargeStatus::Authorized => "authorized",
            ChargeStatus::AuthorizedPendingCapture => "authorized_pending_capture",
            ChargeStatus::Pending => "pending",
            ChargeStatus::Processing => "processing",
            ChargeStatus::WaitingPayment => "waiting_payment",
            ChargeStatus::Refused => "refused",
            ChargeStatus::Failed => "failed",
            ChargeStatus::Canceled => "canceled",
            ChargeStatus::Other(value) => value,
        }
    }

    /// True when the acquirer accepted a card charge.
    pub fn is_approved(&self) -> bool {
        matches!(
            self,
            ChargeStatus::Paid | ChargeStatus::Authorized | ChargeStatus::AuthorizedPendingCapture
        )
    }

    /// Local status this charge status implies.
    ///
    /// Anything not clearly approved or refused stays pending.
    pub fn to_payment_status(&self) -> PaymentStatus {
        match self {
            s if s.is_approved() => PaymentStatus::Completed,
            ChargeStatus::Refused | ChargeStatus::Failed => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

impl From<String> for ChargeStatus {
    fn from(value: String) -> Self {
        ChargeStatus::parse(&value)
    }
}

impl From<ChargeStatus> for String {
    fn from(value: ChargeStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
