//! reqwest implementation of the client-side checkout port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::domain::checkout::CheckoutRequest;
use crate::ports::{
    CardPaymentView, CheckoutApi, CheckoutConfigView, ClientError, ErrorBody, PaymentStatusView,
    PixPaymentView,
};

/// Talks to a running checkout server.
pub struct HttpCheckoutApi {
    client: Client,
    base_url: String,
}

impl HttpCheckoutApi {
    /// `base_url` is where `/checkout/...` is served, without trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches `GET /checkout/config`.
    pub async fn checkout_config(&self) -> Result<CheckoutConfigView, ClientError> {
        let response = self
            .client
            .get(format!("{}/checkout/config", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &CheckoutRequest,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text)
        .unwrap_or_else(|_| ErrorBody::new(status.as_str(), String::new()));
    Err(ClientError::Api {
        status: status.as_u16(),
        code: body.code,
        message: body.message,
    })
}

#[async_trait]
impl CheckoutApi for HttpCheckoutApi {
    async fn create_pix_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<PixPaymentView, ClientError> {
        self.post("/checkout/pix", request).await
    }

    async fn create_card_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CardPaymentView, ClientError> {
        self.post("/checkout/card", request).await
    }

    async fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatusView, ClientError> {
        let response = self
            .client
            .get(format!(
                "{}/checkout/status/{}",
                self.base_url, transaction_id
            ))
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}
