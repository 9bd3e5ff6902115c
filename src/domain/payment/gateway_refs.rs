//! Gateway-provided fields merged into a payment after the charge call,
//! a status poll or a webhook.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, TransactionId};

use super::PaymentStatus;

/// PIX QR code data shown to the payer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixDetails {
    pub qr_code: Option<String>,
    pub qr_code_url: Option<String>,
    pub expires_at: Option<Timestamp>,
}

/// Masked card data echoed back by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardDetails {
    pub brand: Option<String>,
    pub last_four: Option<String>,
    pub holder_name: Option<String>,
    /// Gateway-side stored card id, when the gateway tokenised it.
    pub card_id: Option<String>,
}

/// Acquirer verdict on a card charge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AcquirerResponse {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Partial update from the gateway. `None` fields leave the stored value
/// alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayRefs {
    pub transaction_id: Option<TransactionId>,
    pub charge_id: Option<String>,
    pub gateway_customer_id: Option<String>,
    pub pix: Option<PixDetails>,
    pub card: Option<CardDetails>,
    pub acquirer: Option<AcquirerResponse>,
    pub fee_cents: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    /// Applied only when terminal.
    pub status: Option<PaymentStatus>,
}

impl GatewayRefs {
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

fn merge_opt<T>(target: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *target = incoming;
    }
}

impl PixDetails {
    pub(crate) fn merge(&mut self, other: PixDetails) {
        merge_opt(&mut self.qr_code, other.qr_code);
        merge_opt(&mut self.qr_code_url, other.qr_code_url);
        merge_opt(&mut self.expires_at, other.expires_at);
    }
}

impl CardDetails {
    pub(crate) fn merge(&mut self, other: CardDetails) {
        merge_opt(&mut self.brand, other.brand);
        merge_opt(&mut self.last_four, other.last_four);
        merge_opt(&mut self.holder_name, other.holder_name);
        merge_opt(&mut self.card_id, other.card_id);
    }
}

impl AcquirerResponse {
    pub(crate) fn merge(&mut self, other: AcquirerResponse) {
        merge_opt(&mut self.code, other.code);
        merge_opt(&mut self.message, other.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pix_merge_keeps_existing_values_for_missing_fields() {
        let mut stored = PixDetails {
            qr_code: Some("000201".into()),
            qr_code_url: Some("https://qr".into()),
            expires_at: None,
        };
        stored.merge(PixDetails {
            qr_code: None,
            qr_code_url: Some("https://qr2".into()),
            expires_at: None,
        });
        assert_eq!(stored.qr_code.as_deref(), Some("000201"));
        assert_eq!(stored.qr_code_url.as_deref(), Some("https://qr2"));
    }

    #[test]
    fn card_merge_overwrites_present_fields() {
        let mut stored = CardDetails::default();
        stored.merge(CardDetails {
            brand: Some("visa".into()),
            last_four: Some("4242".into()),
            ..Default::default()
        });
        assert_eq!(stored.brand.as_deref(), Some("visa"));
        assert_eq!(stored.last_four.as_deref(), Some("4242"));
        assert!(stored.holder_name.is_none());
    }
}
