//! HTTP handlers for checkout endpoints.
//!
//! These handlers connect Axum routes to the checkout command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::checkout::{
    CreateCardPaymentCommand, CreateCardPaymentHandler, CreatePixPaymentCommand,
    CreatePixPaymentHandler, GetCheckoutConfigHandler, GetPaymentStatusHandler,
    GetPaymentStatusQuery, HandleGatewayWebhookCommand, HandleGatewayWebhookHandler,
    SubscriptionActivator,
};
use crate::domain::checkout::{CheckoutError, CheckoutRequest};
use crate::domain::foundation::ValidationError;
use crate::domain::gateway::{WebhookError, SIGNATURE_HEADER};
use crate::ports::{
    CardPaymentView, CatalogReader, ErrorBody, PaymentGateway, PaymentLedger, PaymentStatusView,
    PixPaymentView, SubscriptionRepository,
};

use super::dto::WebhookAckResponse;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; handlers are built on demand from it.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub catalog: Arc<dyn CatalogReader>,
    pub ledger: Arc<dyn PaymentLedger>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// Default PIX QR lifetime in seconds.
    pub pix_expires_in: u32,
}

impl CheckoutAppState {
    fn activator(&self) -> Arc<SubscriptionActivator> {
        Arc::new(SubscriptionActivator::new(
            self.subscriptions.clone(),
            self.catalog.clone(),
        ))
    }

    pub fn create_pix_payment_handler(&self) -> CreatePixPaymentHandler {
        CreatePixPaymentHandler::new(
            self.catalog.clone(),
            self.ledger.clone(),
            self.gateway.clone(),
            self.pix_expires_in,
        )
    }

    pub fn create_card_payment_handler(&self) -> CreateCardPaymentHandler {
        CreateCardPaymentHandler::new(
            self.catalog.clone(),
            self.ledger.clone(),
            self.gateway.clone(),
            self.activator(),
        )
    }

    pub fn payment_status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.ledger.clone(), self.gateway.clone(), self.activator())
    }

    pub fn webhook_handler(&self) -> HandleGatewayWebhookHandler {
        HandleGatewayWebhookHandler::new(
            self.ledger.clone(),
            self.gateway.clone(),
            self.activator(),
        )
    }

    pub fn checkout_config_handler(&self) -> GetCheckoutConfigHandler {
        GetCheckoutConfigHandler::new(self.gateway.clone(), self.pix_expires_in)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /checkout/pix - Open a PIX payment and return its QR code
pub async fn create_pix_payment(
    State(state): State<CheckoutAppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<PixPaymentView>, CheckoutApiError> {
    let Json(request) = body.map_err(malformed_body)?;
    let result = state
        .create_pix_payment_handler()
        .handle(CreatePixPaymentCommand { request })
        .await?;
    Ok(Json(PixPaymentView::from(result)))
}

/// POST /checkout/card - Charge a card
pub async fn create_card_payment(
    State(state): State<CheckoutAppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CardPaymentView>, CheckoutApiError> {
    let Json(request) = body.map_err(malformed_body)?;
    let result = state
        .create_card_payment_handler()
        .handle(CreateCardPaymentCommand { request })
        .await?;
    Ok(Json(CardPaymentView::from(result)))
}

/// POST /webhook/pagarme - Gateway notifications, verified by signature
pub async fn handle_pagarme_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let result = state
        .webhook_handler()
        .handle(HandleGatewayWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse::from(&result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /checkout/status/:transaction_id - Current status, re-read from the gateway while pending
pub async fn get_payment_status(
    State(state): State<CheckoutAppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<PaymentStatusView>, CheckoutApiError> {
    let result = state
        .payment_status_handler()
        .handle(GetPaymentStatusQuery { transaction_id })
        .await?;
    Ok(Json(PaymentStatusView::from(result)))
}

/// GET /checkout/config - Public key and supported methods
pub async fn get_checkout_config(State(state): State<CheckoutAppState>) -> impl IntoResponse {
    Json(state.checkout_config_handler().handle())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

fn malformed_body(rejection: JsonRejection) -> CheckoutApiError {
    CheckoutApiError(CheckoutError::Validation(ValidationError::invalid_format(
        "body",
        rejection.body_text(),
    )))
}

/// API error type that converts checkout errors to HTTP responses.
#[derive(Debug)]
pub struct CheckoutApiError(CheckoutError);

impl From<CheckoutError> for CheckoutApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::NotFound { .. } => StatusCode::NOT_FOUND,
            CheckoutError::Gateway { .. } | CheckoutError::Infrastructure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Checkout request failed");
        }
        let body = ErrorBody::new(self.0.code(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// Webhook errors keep their own status mapping: 401, 400, 500.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody::new(self.0.code(), self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}
