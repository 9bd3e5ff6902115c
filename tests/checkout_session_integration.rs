//! The client checkout session driving a live server over HTTP.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;

use checkout_engine::adapters::http::{checkout_router, CheckoutAppState};
use checkout_engine::adapters::memory::{
    InMemoryCatalog, InMemoryPaymentLedger, InMemorySubscriptionStore,
};
use checkout_engine::adapters::pagarme::MockPaymentGateway;
use checkout_engine::adapters::HttpCheckoutApi;
use checkout_engine::application::CheckoutSession;
use checkout_engine::domain::billing::{BilledEntity, BillingInterval, Plan};
use checkout_engine::domain::checkout::{CheckoutRequest, CheckoutStep};
use checkout_engine::domain::foundation::{CustomerId, Money, PlanId, TransactionId};
use checkout_engine::domain::gateway::ChargeStatus;
use checkout_engine::domain::payment::PaymentMethod;

struct LiveServer {
    base_url: String,
    gateway: Arc<MockPaymentGateway>,
    subscriptions: Arc<InMemorySubscriptionStore>,
}

async fn spawn_server() -> LiveServer {
    let catalog = InMemoryCatalog::new()
        .with_plan(Plan::new(
            PlanId::new(1).unwrap(),
            "Pro",
            Money::brl(9990).unwrap(),
            BillingInterval::Monthly,
        ))
        .with_entity(BilledEntity::Customer(CustomerId::new(7).unwrap()));
    let gateway = Arc::new(MockPaymentGateway::new());
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let state = CheckoutAppState {
        catalog: Arc::new(catalog),
        ledger: Arc::new(InMemoryPaymentLedger::new()),
        subscriptions: subscriptions.clone(),
        gateway: gateway.clone(),
        pix_expires_in: 3600,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, checkout_router().with_state(state))
            .await
            .unwrap();
    });

    LiveServer {
        base_url: format!("http://{}", addr),
        gateway,
        subscriptions,
    }
}

fn request(with_card: bool) -> CheckoutRequest {
    let mut body = json!({
        "plan_id": 1,
        "subscription_type": "customer",
        "customer_id": 7,
        "customer_data": {"name": "Maria", "email": "maria@example.com", "document": "12345678901"}
    });
    if with_card {
        body["card_data"] = json!({
            "number": "4111111111111111",
            "holder_name": "MARIA",
            "exp_month": 12,
            "exp_year": 30,
            "cvv": "123"
        });
    }
    serde_json::from_value(body).unwrap()
}

async fn wait_for_step(session: &CheckoutSession, step: CheckoutStep) {
    for _ in 0..200 {
        if session.step().await == step {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached {:?}", step);
}

#[tokio::test]
async fn pix_session_polls_until_paid() {
    let server = spawn_server().await;
    let api = Arc::new(HttpCheckoutApi::new(&server.base_url));
    let session = CheckoutSession::with_poll_interval(api, Duration::from_millis(20));
    session.update_form(|form| form.request = request(false)).await;

    let step = session.submit().await.unwrap();
    assert_eq!(step, CheckoutStep::PixWaiting);
    assert!(session.is_polling());

    let snapshot = session.snapshot().await;
    let tx = snapshot.payment.unwrap().transaction_id().to_string();
    server
        .gateway
        .set_charge_status(&TransactionId::new(tx).unwrap(), ChargeStatus::Paid);

    wait_for_step(&session, CheckoutStep::Success).await;
    assert_eq!(server.subscriptions.all().len(), 1);
}

#[tokio::test]
async fn card_session_goes_straight_to_success() {
    let server = spawn_server().await;
    let api = Arc::new(HttpCheckoutApi::new(&server.base_url));
    let session = CheckoutSession::new(api);
    session
        .update_form(|form| {
            form.payment_method = PaymentMethod::CreditCard;
            form.request = request(true);
        })
        .await;

    assert_eq!(session.submit().await.unwrap(), CheckoutStep::Success);
    assert!(!session.is_polling());
}

#[tokio::test]
async fn declined_card_shows_acquirer_message() {
    let server = spawn_server().await;
    server.gateway.decline_cards("1011", "Cartão expirado");
    let api = Arc::new(HttpCheckoutApi::new(&server.base_url));
    let session = CheckoutSession::new(api);
    session
        .update_form(|form| {
            form.payment_method = PaymentMethod::CreditCard;
            form.request = request(true);
        })
        .await;

    assert_eq!(session.submit().await.unwrap(), CheckoutStep::Error);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.error_message.as_deref(), Some("Cartão expirado"));
}

#[tokio::test]
async fn config_is_readable_by_the_client() {
    let server = spawn_server().await;
    let api = HttpCheckoutApi::new(&server.base_url);

    let config = api.checkout_config().await.unwrap();

    assert_eq!(config.payment_methods, PaymentMethod::ALL.to_vec());
    assert_eq!(config.pix_expires_in, 3600);
}
