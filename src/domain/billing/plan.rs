//! Catalog plan as seen by checkout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Money, PlanId, Timestamp, ValidationError};

/// How often a plan bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    /// End of a period that starts at `start`.
    pub fn period_end(&self, start: Timestamp) -> Timestamp {
        match self {
            BillingInterval::Monthly => start.add_months(1),
            BillingInterval::Yearly => start.add_years(1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingInterval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(BillingInterval::Monthly),
            "yearly" | "year" | "annual" => Ok(BillingInterval::Yearly),
            other => Err(ValidationError::invalid_format(
                "billing_interval",
                format!("unknown interval '{}'", other),
            )),
        }
    }
}

/// Read-only plan data resolved by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub price: Money,
    pub interval: BillingInterval,
}

impl Plan {
    pub fn new(id: PlanId, name: impl Into<String>, price: Money, interval: BillingInterval) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn monthly_period_ends_one_calendar_month_later() {
        let start = Timestamp::parse_rfc3339("2024-05-20T10:00:00Z").unwrap();
        let end = BillingInterval::Monthly.period_end(start);
        assert_eq!(end.as_datetime().month(), 6);
        assert_eq!(end.as_datetime().day(), 20);
    }

    #[test]
    fn yearly_period_ends_one_year_later() {
        let start = Timestamp::parse_rfc3339("2024-05-20T10:00:00Z").unwrap();
        let end = BillingInterval::Yearly.period_end(start);
        assert_eq!(end.as_datetime().year(), 2025);
    }

    #[test]
    fn interval_parses_common_spellings() {
        assert_eq!("MONTHLY".parse::<BillingInterval>().unwrap(), BillingInterval::Monthly);
        assert_eq!("annual".parse::<BillingInterval>().unwrap(), BillingInterval::Yearly);
        assert!("weekly".parse::<BillingInterval>().is_err());
    }
}
