//! Shared fixture for checkout handler tests.

use std::sync::Arc;

use crate::adapters::memory::{InMemoryCatalog, InMemoryPaymentLedger, InMemorySubscriptionStore};
use crate::adapters::pagarme::MockPaymentGateway;
use crate::domain::billing::{BilledEntity, BillingInterval, Plan};
use crate::domain::checkout::{CheckoutRequest, CustomerData};
use crate::domain::foundation::{CompanyId, CustomerId, Money, PlanId, Timestamp};
use crate::domain::payment::{Payment, PaymentAttempt, PaymentMethod, PaymentStatus};
use crate::ports::PaymentLedger;

use super::SubscriptionActivator;

pub const PLAN_ID: i64 = 1;
pub const CUSTOMER_ID: i64 = 7;
pub const COMPANY_ID: i64 = 3;

pub struct Fixture {
    pub ledger: Arc<InMemoryPaymentLedger>,
    pub subscriptions: Arc<InMemorySubscriptionStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub gateway: Arc<MockPaymentGateway>,
}

impl Fixture {
    /// Plan 1 at BRL 99.90 monthly; customer 7 and company 3 exist.
    pub fn new() -> Self {
        let catalog = InMemoryCatalog::new()
            .with_plan(Plan::new(
                PlanId::new(PLAN_ID).unwrap(),
                "Pro",
                Money::brl(9990).unwrap(),
                BillingInterval::Monthly,
            ))
            .with_entity(customer())
            .with_entity(BilledEntity::Company(CompanyId::new(COMPANY_ID).unwrap()));
        Self {
            ledger: Arc::new(InMemoryPaymentLedger::new()),
            subscriptions: Arc::new(InMemorySubscriptionStore::new()),
            catalog: Arc::new(catalog),
            gateway: Arc::new(MockPaymentGateway::new()),
        }
    }

    pub fn activator(&self) -> Arc<SubscriptionActivator> {
        Arc::new(SubscriptionActivator::new(
            self.subscriptions.clone(),
            self.catalog.clone(),
        ))
    }

    pub async fn pending_payment(&self, method: PaymentMethod) -> Payment {
        self.ledger
            .create(PaymentAttempt {
                billed_entity: customer(),
                plan_id: PlanId::new(PLAN_ID).unwrap(),
                amount: Money::brl(9990).unwrap(),
                method,
            })
            .await
            .unwrap()
    }

    pub async fn completed_payment(&self, method: PaymentMethod) -> Payment {
        let payment = self.pending_payment(method).await;
        self.ledger
            .set_status(payment.id, PaymentStatus::Completed)
            .await
            .unwrap()
            .payment
    }
}

pub fn customer() -> BilledEntity {
    BilledEntity::Customer(CustomerId::new(CUSTOMER_ID).unwrap())
}

pub fn pix_request() -> CheckoutRequest {
    CheckoutRequest {
        plan_id: Some(PLAN_ID),
        subscription_type: Some("customer".into()),
        customer_id: Some(CUSTOMER_ID),
        customer_data: Some(CustomerData {
            name: Some("A".into()),
            email: Some("a@b.com".into()),
            document: Some("12345678901".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn card_request() -> CheckoutRequest {
    serde_json::from_value(serde_json::json!({
        "plan_id": PLAN_ID,
        "subscription_type": "customer",
        "customer_id": CUSTOMER_ID,
        "customer_data": {"name": "A", "email": "a@b.com", "document": "12345678901"},
        "card_data": {
            "number": "4111 1111 1111 1111",
            "holder_name": "A B",
            "exp_month": 12,
            "exp_year": 30,
            "cvv": "123"
        }
    }))
    .unwrap()
}

pub fn about_one_month_from_now(end: Timestamp) -> bool {
    let days = end.duration_since(&Timestamp::now()).num_days();
    (27..=31).contains(&days)
}
