//! Pagar.me v5 wire types.
//!
//! Request bodies are built from the port's charge requests; responses and
//! webhook bodies are parsed once here and converted into port types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::checkout::{BillingAddress, Phone};
use crate::domain::foundation::{PaymentId, Timestamp, TransactionId};
use crate::domain::gateway::{ChargeReference, ChargeStatus};
use crate::domain::payment::{CardDetails, PaymentMethod};
use crate::ports::{
    CardChargeRequest, GatewayCharge, GatewayCustomer, GatewayError, GatewayTransaction,
    LastTransaction, PixChargeRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
    pub customer: CustomerPayload,
    pub payments: Vec<PaymentPayload>,
    pub metadata: BTreeMap<String, String>,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderItem {
    pub amount: i64,
    pub description: String,
    pub quantity: u32,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerPayload {
    pub name: String,
    pub email: String,
    pub document: String,
    pub document_type: &'static str,
    #[serde(rename = "type")]
    pub customer_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<PhonesPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressPayload>,
}

#[derive(Debug, Serialize)]
pub struct PhonesPayload {
    pub mobile_phone: PhonePayload,
}

#[derive(Debug, Serialize)]
pub struct PhonePayload {
    pub country_code: String,
    pub area_code: String,
    pub number: String,
}

#[derive(Debug, Serialize)]
pub struct AddressPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "payment_method", rename_all = "snake_case")]
pub enum PaymentPayload {
    Pix { pix: PixPayload },
    CreditCard { credit_card: CreditCardPayload },
}

#[derive(Debug, Serialize)]
pub struct PixPayload {
    pub expires_in: u32,
}

#[derive(Debug, Serialize)]
pub struct CreditCardPayload {
    pub installments: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_descriptor: Option<String>,
    pub card: CardPayload,
}

#[derive(Debug, Serialize)]
pub struct CardPayload {
    pub number: String,
    pub holder_name: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<AddressPayload>,
}

impl From<&Phone> for PhonePayload {
    fn from(phone: &Phone) -> Self {
        Self {
            country_code: phone.country_code.clone(),
            area_code: phone.area_code.clone(),
            number: phone.number.clone(),
        }
    }
}

impl From<&BillingAddress> for AddressPayload {
    fn from(address: &BillingAddress) -> Self {
        Self {
            line_1: address.line_1.clone(),
            line_2: address.line_2.clone(),
            zip_code: address.zip_code.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone().unwrap_or_else(|| "BR".to_string()),
        }
    }
}

impl From<&GatewayCustomer> for CustomerPayload {
    fn from(customer: &GatewayCustomer) -> Self {
        Self {
            name: customer.name.clone(),
            email: customer.email.clone(),
            document: customer.document.number.clone(),
            document_type: customer.document.kind.as_str(),
            customer_type: customer.document.kind.customer_type(),
            phones: customer.phone.as_ref().map(|phone| PhonesPayload {
                mobile_phone: phone.into(),
            }),
            address: customer.address.as_ref().map(AddressPayload::from),
        }
    }
}

fn single_item(amount: i64, description: &str, code: String) -> Vec<OrderItem> {
    vec![OrderItem {
        amount,
        description: description.to_string(),
        quantity: 1,
        code,
    }]
}

impl OrderRequest {
    pub fn pix(request: &PixChargeRequest) -> Self {
        Self {
            items: single_item(
                request.amount.cents(),
                &request.description,
                format!("plan_{}", request.metadata.plan_id),
            ),
            customer: (&request.customer).into(),
            payments: vec![PaymentPayload::Pix {
                pix: PixPayload {
                    expires_in: request.expires_in,
                },
            }],
            metadata: request.metadata.to_map(),
            closed: true,
        }
    }

    pub fn card(request: &CardChargeRequest, statement_descriptor: Option<&str>) -> Self {
        Self {
            items: single_item(
                request.amount.cents(),
                &request.description,
                format!("plan_{}", request.metadata.plan_id),
            ),
            customer: (&request.customer).into(),
            payments: vec![PaymentPayload::CreditCard {
                credit_card: CreditCardPayload {
                    installments: 1,
                    statement_descriptor: statement_descriptor.map(str::to_string),
                    card: CardPayload {
                        number: request.card.number.clone(),
                        holder_name: request.card.holder_name.clone(),
                        exp_month: request.card.exp_month,
                        exp_year: request.card.exp_year,
                        cvv: request.card.cvv.clone(),
                        billing_address: request
                            .billing_address
                            .as_ref()
                            .or(request.customer.address.as_ref())
                            .map(AddressPayload::from),
                    },
                },
            }],
            metadata: request.metadata.to_map(),
            closed: true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct PagarmeOrder {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<PagarmeCustomer>,
    #[serde(default)]
    pub charges: Vec<PagarmeCharge>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagarmeCustomer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagarmeCharge {
    pub id: String,
    pub status: ChargeStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub customer: Option<PagarmeCustomer>,
    #[serde(default)]
    pub order: Option<PagarmeOrderRef>,
    #[serde(default)]
    pub last_transaction: Option<PagarmeLastTransaction>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Order link embedded in charge webhooks.
#[derive(Debug, Clone, Deserialize)]
pub struct PagarmeOrderRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagarmeLastTransaction {
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub acquirer_return_code: Option<String>,
    #[serde(default)]
    pub acquirer_message: Option<String>,
    #[serde(default)]
    pub card: Option<PagarmeCard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagarmeCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last_four_digits: Option<String>,
    #[serde(default)]
    pub holder_name: Option<String>,
}

impl From<&PagarmeCard> for CardDetails {
    fn from(card: &PagarmeCard) -> Self {
        CardDetails {
            brand: card.brand.clone(),
            last_four: card.last_four_digits.clone(),
            holder_name: card.holder_name.clone(),
            card_id: card.id.clone(),
        }
    }
}

impl From<&PagarmeLastTransaction> for LastTransaction {
    fn from(tx: &PagarmeLastTransaction) -> Self {
        LastTransaction {
            pix_qr_code: tx.qr_code.clone(),
            pix_qr_code_url: tx.qr_code_url.clone(),
            pix_expires_at: tx.expires_at.as_deref().and_then(Timestamp::parse_rfc3339),
            acquirer_response_code: tx.acquirer_return_code.clone(),
            acquirer_message: tx.acquirer_message.clone(),
            card: tx.card.as_ref().map(CardDetails::from),
        }
    }
}

impl PagarmeCharge {
    pub fn method(&self) -> Option<PaymentMethod> {
        self.payment_method.as_deref().and_then(|m| m.parse().ok())
    }

    fn to_port(&self) -> GatewayCharge {
        GatewayCharge {
            id: self.id.clone(),
            status: self.status.clone(),
            payment_method: self.method(),
            amount_cents: self.amount,
            fee_cents: None,
            last_transaction: self.last_transaction.as_ref().map(LastTransaction::from),
        }
    }
}

impl TryFrom<PagarmeOrder> for GatewayTransaction {
    type Error = GatewayError;

    fn try_from(order: PagarmeOrder) -> Result<Self, Self::Error> {
        let id = TransactionId::new(order.id)
            .map_err(|_| GatewayError::provider("Order response without id"))?;
        Ok(GatewayTransaction {
            id,
            customer_id: order.customer.map(|c| c.id),
            charges: order.charges.iter().map(PagarmeCharge::to_port).collect(),
        })
    }
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagarmeErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

/// Envelope of every webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct PagarmeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

/// Charge as seen through a webhook: either the charge itself or the
/// first charge of an order, with the order id and metadata resolved.
#[derive(Debug, Clone)]
pub struct WebhookCharge {
    pub order_id: String,
    pub customer_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub charge: PagarmeCharge,
}

impl WebhookCharge {
    pub fn from_order(order: PagarmeOrder) -> Option<Self> {
        let charge = order.charges.into_iter().next()?;
        Some(Self {
            order_id: order.id,
            customer_id: order
                .customer
                .map(|c| c.id)
                .or_else(|| charge.customer.as_ref().map(|c| c.id.clone())),
            metadata: if order.metadata.is_empty() {
                charge.metadata.clone()
            } else {
                order.metadata
            },
            charge,
        })
    }

    pub fn from_charge(charge: PagarmeCharge) -> Option<Self> {
        let order_id = charge.order.as_ref()?.id.clone();
        Some(Self {
            order_id,
            customer_id: charge.customer.as_ref().map(|c| c.id.clone()),
            metadata: charge.metadata.clone(),
            charge,
        })
    }

    pub fn reference(&self) -> Result<ChargeReference, GatewayError> {
        let transaction_id = TransactionId::new(self.order_id.clone())
            .map_err(|_| GatewayError::invalid_webhook("Webhook without order id"))?;
        Ok(ChargeReference {
            transaction_id,
            charge_id: Some(self.charge.id.clone()),
            payment_id: self
                .metadata
                .get("payment_id")
                .and_then(|id| id.parse::<PaymentId>().ok()),
            gateway_customer_id: self.customer_id.clone(),
        })
    }
}
