//! The party a subscription is billed to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{CompanyId, CustomerId, ValidationError};

/// Wire tag selecting which entity id a checkout request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    Company,
    Customer,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Company => "company",
            SubscriptionType::Customer => "customer",
        }
    }

    /// Name of the request field that must accompany this type.
    pub fn id_field(&self) -> &'static str {
        match self {
            SubscriptionType::Company => "company_id",
            SubscriptionType::Customer => "customer_id",
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(SubscriptionType::Company),
            "customer" => Ok(SubscriptionType::Customer),
            other => Err(ValidationError::invalid_format(
                "subscription_type",
                format!("expected 'company' or 'customer', got '{}'", other),
            )),
        }
    }
}

/// Company or customer paying for a plan.
///
/// Resolved once from the request; everything downstream matches on this
/// instead of the string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum BilledEntity {
    Company(CompanyId),
    Customer(CustomerId),
}

impl BilledEntity {
    pub fn kind(&self) -> SubscriptionType {
        match self {
            BilledEntity::Company(_) => SubscriptionType::Company,
            BilledEntity::Customer(_) => SubscriptionType::Customer,
        }
    }

    /// Raw id regardless of kind.
    pub fn raw_id(&self) -> i64 {
        match self {
            BilledEntity::Company(id) => id.as_i64(),
            BilledEntity::Customer(id) => id.as_i64(),
        }
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        match self {
            BilledEntity::Company(id) => Some(*id),
            BilledEntity::Customer(_) => None,
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            BilledEntity::Customer(id) => Some(*id),
            BilledEntity::Company(_) => None,
        }
    }

    /// Rebuilds the entity from a stored (kind, id) pair.
    pub fn from_parts(kind: SubscriptionType, id: i64) -> Result<Self, ValidationError> {
        Ok(match kind {
            SubscriptionType::Company => BilledEntity::Company(CompanyId::new(id)?),
            SubscriptionType::Customer => BilledEntity::Customer(CustomerId::new(id)?),
        })
    }
}

impl fmt::Display for BilledEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw_id())
    }
}
