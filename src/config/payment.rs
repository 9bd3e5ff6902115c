//! Payment gateway configuration (Pagar.me)

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Pagar.me configuration
#[derive(Clone, Deserialize)]
pub struct PaymentConfig {
    /// Secret API key (`sk_...`), used as the basic-auth user
    pub secret_key: Secret<String>,

    /// Public key (`pk_...`) handed to clients for card tokenisation
    pub public_key: String,

    /// Shared secret for webhook HMAC signatures
    pub webhook_secret: Secret<String>,

    /// API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Default PIX QR code lifetime in seconds
    #[serde(default = "default_pix_expires_in")]
    pub pix_expires_in_secs: u32,

    /// Text on the payer's card statement
    pub statement_descriptor: Option<String>,
}

impl PaymentConfig {
    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Checks key presence and prefixes (a swapped key pair fails here),
    /// the base URL scheme and the PIX expiry range.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        let secret_key = self.secret_key.expose_secret();
        let required = [
            ("pagarme.secret_key", secret_key.as_str()),
            ("pagarme.public_key", self.public_key.as_str()),
            ("pagarme.webhook_secret", self.webhook_secret.expose_secret().as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::Missing(*field));
        }

        for (field, value, prefix) in [
            ("pagarme.secret_key", secret_key.as_str(), "sk_"),
            ("pagarme.public_key", self.public_key.as_str(), "pk_"),
        ] {
            if !value.starts_with(prefix) {
                return Err(ValidationError::KeyPrefix { field, prefix });
            }
        }

        match self.api_base_url.split_once("://") {
            Some(("https", _)) => {}
            Some(("http", _)) if !production => {}
            Some(("http", _)) => return Err(ValidationError::InsecureApiBaseUrl),
            _ => return Err(ValidationError::ApiBaseUrl(self.api_base_url.clone())),
        }

        if !(60..=7 * 24 * 3600).contains(&self.pix_expires_in_secs) {
            return Err(ValidationError::PixExpiry(self.pix_expires_in_secs));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("secret_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("webhook_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("pix_expires_in_secs", &self.pix_expires_in_secs)
            .field("statement_descriptor", &self.statement_descriptor)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "https://api.pagar.me/core/v5".to_string()
}

fn default_pix_expires_in() -> u32 {
    3600
}
