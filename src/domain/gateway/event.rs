//! Normalised webhook events.

use crate::domain::foundation::{PaymentId, TransactionId};
use crate::domain::payment::{
    AcquirerResponse, CardDetails, GatewayRefs, PaymentStatus, PixDetails,
};

/// Identifies the local payment a gateway event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReference {
    pub transaction_id: TransactionId,
    pub charge_id: Option<String>,
    /// Local id echoed back from the order metadata, when present.
    pub payment_id: Option<PaymentId>,
    pub gateway_customer_id: Option<String>,
}

/// A gateway notification, closed over the cases the reconciler handles.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// PIX charge paid.
    PixCompleted {
        reference: ChargeReference,
        pix: PixDetails,
    },
    /// PIX charge failed or was refused.
    PixFailed {
        reference: ChargeReference,
        message: Option<String>,
    },
    /// Card charge reached a verdict.
    CardResult {
        reference: ChargeReference,
        status: PaymentStatus,
        card: CardDetails,
        acquirer: AcquirerResponse,
    },
    /// Any event type this engine does not act on.
    Unknown { event_type: String },
}

impl GatewayEvent {
    pub fn reference(&self) -> Option<&ChargeReference> {
        match self {
            GatewayEvent::PixCompleted { reference, .. }
            | GatewayEvent::PixFailed { reference, .. }
            | GatewayEvent::CardResult { reference, .. } => Some(reference),
            GatewayEvent::Unknown { .. } => None,
        }
    }

    /// Local status the event asserts, if any.
    pub fn status(&self) -> Option<PaymentStatus> {
        match self {
            GatewayEvent::PixCompleted { .. } => Some(PaymentStatus::Completed),
            GatewayEvent::PixFailed { .. } => Some(PaymentStatus::Failed),
            GatewayEvent::CardResult { status, .. } => Some(*status),
            GatewayEvent::Unknown { .. } => None,
        }
    }

    /// Ledger update carrying the event's method-specific fields and status.
    pub fn to_refs(&self) -> GatewayRefs {
        let mut refs = GatewayRefs::default();
        if let Some(reference) = self.reference() {
            refs.transaction_id = Some(reference.transaction_id.clone());
            refs.charge_id = reference.charge_id.clone();
            refs.gateway_customer_id = reference.gateway_customer_id.clone();
        }
        match self {
            GatewayEvent::PixCompleted { pix, .. } => refs.pix = Some(pix.clone()),
            GatewayEvent::PixFailed { message, .. } => {
                refs.acquirer = Some(AcquirerResponse {
                    code: None,
                    message: message.clone(),
                })
            }
            GatewayEvent::CardResult { card, acquirer, .. } => {
                refs.card = Some(card.clone());
                refs.acquirer = Some(acquirer.clone());
            }
            GatewayEvent::Unknown { .. } => {}
        }
        refs.status = self.status();
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ChargeReference {
        ChargeReference {
            transaction_id: TransactionId::new("or_abc").unwrap(),
            charge_id: Some("ch_1".into()),
            payment_id: PaymentId::new(3).ok(),
            gateway_customer_id: None,
        }
    }

    #[test]
    fn pix_completed_asserts_completed() {
        let event = GatewayEvent::PixCompleted {
            reference: reference(),
            pix: PixDetails::default(),
        };
        assert_eq!(event.status(), Some(PaymentStatus::Completed));
        let refs = event.to_refs();
        assert_eq!(refs.transaction_id.unwrap().as_str(), "or_abc");
        assert_eq!(refs.charge_id.as_deref(), Some("ch_1"));
        assert_eq!(refs.status, Some(PaymentStatus::Completed));
    }

    #[test]
    fn card_result_carries_acquirer_message() {
        let event = GatewayEvent::CardResult {
            reference: reference(),
            status: PaymentStatus::Failed,
            card: CardDetails {
                last_four: Some("0002".into()),
                ..Default::default()
            },
            acquirer: AcquirerResponse {
                code: Some("1011".into()),
                message: Some("Cartão expirado".into()),
            },
        };
        let refs = event.to_refs();
        assert_eq!(refs.status, Some(PaymentStatus::Failed));
        assert_eq!(refs.card.unwrap().last_four.as_deref(), Some("0002"));
        assert_eq!(refs.acquirer.unwrap().code.as_deref(), Some("1011"));
    }

    #[test]
    fn unknown_event_has_no_reference_or_status() {
        let event = GatewayEvent::Unknown {
            event_type: "customer.created".into(),
        };
        assert!(event.reference().is_none());
        assert!(event.status().is_none());
        assert_eq!(event.to_refs(), GatewayRefs::default());
    }
}
