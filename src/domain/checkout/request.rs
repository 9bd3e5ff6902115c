//! Checkout request and its validation.
//!
//! Fields arrive optional so that a missing value is reported as a
//! validation error naming the field, in a fixed order:
//! required fields, then method-specific data, then the entity id that
//! matches `subscription_type`. Lookups happen afterwards, in the handlers.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{BilledEntity, SubscriptionType};
use crate::domain::foundation::{CompanyId, CustomerId, PlanId, ValidationError};
use crate::domain::payment::PaymentMethod;

use super::contact::{check_email, digits};
use super::{Phone, TaxDocument};

/// Lower and upper bounds for a PIX QR code lifetime, in seconds.
const PIX_EXPIRES_IN_RANGE: (u32, u32) = (60, 7 * 24 * 3600);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillingAddress {
    pub line_1: Option<String>,
    pub line_2: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub address: Option<BillingAddress>,
}

#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardData {
    pub number: Option<String>,
    pub holder_name: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
    pub cvv: Option<String>,
}

impl std::fmt::Debug for CardData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardData")
            .field("number", &self.number.as_ref().map(|_| "[REDACTED]"))
            .field("holder_name", &self.holder_name)
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvv", &self.cvv.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Checkout request as posted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub plan_id: Option<i64>,
    pub subscription_type: Option<String>,
    pub company_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub customer_data: Option<CustomerData>,
    pub card_data: Option<CardData>,
    pub billing_address: Option<BillingAddress>,
    /// PIX QR code lifetime override, seconds.
    pub expires_in: Option<u32>,
}

/// Validated payer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCustomer {
    pub name: String,
    pub email: String,
    pub document: TaxDocument,
    pub phone: Option<Phone>,
    pub address: Option<BillingAddress>,
}

/// Validated card. Only held for the duration of the gateway call.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidCard {
    pub number: String,
    pub holder_name: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvv: String,
}

impl ValidCard {
    pub fn last_four(&self) -> &str {
        &self.number[self.number.len().saturating_sub(4)..]
    }
}

impl std::fmt::Debug for ValidCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidCard")
            .field("last_four", &self.last_four())
            .field("holder_name", &self.holder_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInstrument {
    Pix {
        expires_in: Option<u32>,
    },
    Card {
        card: ValidCard,
        billing_address: Option<BillingAddress>,
    },
}

/// A request that passed every check that needs no lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub plan_id: PlanId,
    pub billed_entity: BilledEntity,
    pub customer: ValidCustomer,
    pub instrument: PaymentInstrument,
}

impl CheckoutRequest {
    /// Validates the request for `method`.
    ///
    /// # Errors
    ///
    /// The first failing field, in precedence order.
    pub fn validate(&self, method: PaymentMethod) -> Result<ValidatedCheckout, ValidationError> {
        // 1. Required fields
        let plan_id = PlanId::new(required(self.plan_id, "plan_id")?)?;
        let subscription_type: SubscriptionType =
            required_str(self.subscription_type.as_deref(), "subscription_type")?.parse()?;
        let customer = self.validate_customer()?;

        // 2. Method-specific data
        let instrument = match method {
            PaymentMethod::Pix => PaymentInstrument::Pix {
                expires_in: self.validate_expires_in()?,
            },
            PaymentMethod::CreditCard => PaymentInstrument::Card {
                card: self.validate_card()?,
                billing_address: self.billing_address.clone(),
            },
        };

        // 3. Entity id matching subscription_type
        let billed_entity = match subscription_type {
            SubscriptionType::Company => BilledEntity::Company(CompanyId::new(required(
                self.company_id,
                subscription_type.id_field(),
            )?)?),
            SubscriptionType::Customer => BilledEntity::Customer(CustomerId::new(required(
                self.customer_id,
                subscription_type.id_field(),
            )?)?),
        };

        Ok(ValidatedCheckout {
            plan_id,
            billed_entity,
            customer,
            instrument,
        })
    }

    fn validate_customer(&self) -> Result<ValidCustomer, ValidationError> {
        let data = self
            .customer_data
            .as_ref()
            .ok_or_else(|| ValidationError::empty_field("customer_data"))?;
        let name = required_str(data.name.as_deref(), "customer_data.name")?.to_string();
        let email = check_email(data.email.as_deref().unwrap_or_default())?;
        let document =
            TaxDocument::parse(required_str(data.document.as_deref(), "customer_data.document")?)?;
        let phone = match data.phone.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(Phone::parse(raw)?),
            _ => None,
        };
        let address = data.address.clone().map(normalize_address).transpose()?;
        Ok(ValidCustomer {
            name,
            email,
            document,
            phone,
            address,
        })
    }

    fn validate_card(&self) -> Result<ValidCard, ValidationError> {
        let card = self
            .card_data
            .as_ref()
            .ok_or_else(|| ValidationError::empty_field("card_data"))?;

        let number = digits(required_str(card.number.as_deref(), "card_data.number")?);
        if !(13..=19).contains(&number.len()) {
            return Err(ValidationError::invalid_format(
                "card_data.number",
                "expected 13 to 19 digits",
            ));
        }
        let holder_name =
            required_str(card.holder_name.as_deref(), "card_data.holder_name")?.to_string();
        let exp_month = required(card.exp_month, "card_data.exp_month")?;
        if !(1..=12).contains(&exp_month) {
            return Err(ValidationError::out_of_range(
                "card_data.exp_month",
                1,
                12,
                i64::from(exp_month),
            ));
        }
        let mut exp_year = required(card.exp_year, "card_data.exp_year")?;
        if exp_year < 100 {
            exp_year += 2000;
        }
        let cvv = required_str(card.cvv.as_deref(), "card_data.cvv")?.to_string();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "card_data.cvv",
                "expected 3 or 4 digits",
            ));
        }

        Ok(ValidCard {
            number,
            holder_name,
            exp_month,
            exp_year,
            cvv,
        })
    }

    fn validate_expires_in(&self) -> Result<Option<u32>, ValidationError> {
        let (min, max) = PIX_EXPIRES_IN_RANGE;
        match self.expires_in {
            Some(secs) if !(min..=max).contains(&secs) => Err(ValidationError::out_of_range(
                "expires_in",
                i64::from(min),
                i64::from(max),
                i64::from(secs),
            )),
            other => Ok(other),
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::empty_field(field))
}

fn required_str<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::empty_field(field)),
    }
}

fn normalize_address(mut address: BillingAddress) -> Result<BillingAddress, ValidationError> {
    if let Some(zip) = address.zip_code.as_deref() {
        let zip = digits(zip);
        if zip.len() != 8 {
            return Err(ValidationError::invalid_format(
                "customer_data.address.zip_code",
                "expected 8 digits",
            ));
        }
        address.zip_code = Some(zip);
    }
    Ok(address)
}
