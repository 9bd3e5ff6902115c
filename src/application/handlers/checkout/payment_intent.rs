//! Steps shared by both checkout commands: validate, resolve, open the row.

use std::sync::Arc;

use crate::domain::billing::{BilledEntity, Plan};
use crate::domain::checkout::{CheckoutError, CheckoutRequest, ValidatedCheckout};
use crate::domain::payment::{Payment, PaymentAttempt, PaymentMethod};
use crate::ports::{CatalogReader, ChargeMetadata, PaymentLedger};

/// A pending payment ready to be sent to the gateway.
pub(super) struct OpenedIntent {
    pub payment: Payment,
    pub plan: Plan,
    pub checkout: ValidatedCheckout,
}

impl OpenedIntent {
    pub fn metadata(&self) -> ChargeMetadata {
        ChargeMetadata {
            payment_id: self.payment.id,
            plan_id: self.plan.id,
            billed_entity: self.checkout.billed_entity,
        }
    }
}

fn entity_label(entity: BilledEntity) -> &'static str {
    match entity {
        BilledEntity::Company(_) => "Company",
        BilledEntity::Customer(_) => "Customer",
    }
}

/// Runs every check in precedence order, then creates the pending row.
///
/// Nothing is written and the gateway is never called when a check fails.
pub(super) async fn open_intent(
    catalog: &Arc<dyn CatalogReader>,
    ledger: &Arc<dyn PaymentLedger>,
    request: &CheckoutRequest,
    method: PaymentMethod,
) -> Result<OpenedIntent, CheckoutError> {
    // 1. Required fields, then the entity id matching subscription_type
    let checkout = request.validate(method)?;

    // 2. Plan exists
    let plan = catalog
        .find_plan(checkout.plan_id)
        .await?
        .ok_or_else(|| CheckoutError::not_found("Plan", checkout.plan_id))?;

    // 3. Billed entity exists
    let entity = checkout.billed_entity;
    if !catalog.billed_entity_exists(entity).await? {
        return Err(CheckoutError::not_found(entity_label(entity), entity.raw_id()));
    }

    // 4. Pending row with no transaction id yet
    let payment = ledger
        .create(PaymentAttempt {
            billed_entity: entity,
            plan_id: plan.id,
            amount: plan.price.clone(),
            method,
        })
        .await?;

    tracing::info!(
        payment_id = %payment.id,
        billed_entity = %entity,
        plan_id = %plan.id,
        method = method.as_str(),
        amount = %plan.price,
        "Payment intent opened"
    );

    Ok(OpenedIntent {
        payment,
        plan,
        checkout,
    })
}
