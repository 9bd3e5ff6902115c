//! Axum router configuration for checkout endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_card_payment, create_pix_payment, get_checkout_config, get_payment_status,
    handle_pagarme_webhook, CheckoutAppState,
};

/// Create the checkout API router.
///
/// # Routes
///
/// - `POST /pix` - Open a PIX payment
/// - `POST /card` - Charge a card
/// - `GET /status/:transaction_id` - Poll a payment
/// - `GET /config` - Client configuration
pub fn checkout_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/pix", post(create_pix_payment))
        .route("/card", post(create_card_payment))
        .route("/status/:transaction_id", get(get_payment_status))
        .route("/config", get(get_checkout_config))
}

/// Create the webhook router.
///
/// Separate from the checkout routes because it authenticates by body
/// signature instead of by caller.
///
/// # Routes
/// - `POST /pagarme` - Pagar.me notifications
pub fn webhook_routes() -> Router<CheckoutAppState> {
    Router::new().route("/pagarme", post(handle_pagarme_webhook))
}

/// Create the complete checkout module router, mounted at `/checkout`
/// and `/webhook`.
///
/// # Example
///
/// ```ignore
/// let app = checkout_router().with_state(app_state);
/// ```
pub fn checkout_router() -> Router<CheckoutAppState> {
    Router::new()
        .nest("/checkout", checkout_routes())
        .nest("/webhook", webhook_routes())
}
