//! GetCheckoutConfigHandler - What a client needs before rendering checkout.

use std::sync::Arc;

use crate::domain::payment::PaymentMethod;
use crate::ports::{CheckoutConfigView, PaymentGateway};

pub struct GetCheckoutConfigHandler {
    gateway: Arc<dyn PaymentGateway>,
    pix_expires_in: u32,
}

impl GetCheckoutConfigHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, pix_expires_in: u32) -> Self {
        Self {
            gateway,
            pix_expires_in,
        }
    }

    pub fn handle(&self) -> CheckoutConfigView {
        CheckoutConfigView {
            public_key: self.gateway.public_key(),
            payment_methods: PaymentMethod::ALL.to_vec(),
            pix_expires_in: self.pix_expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pagarme::{MockPaymentGateway, MOCK_PUBLIC_KEY};

    #[test]
    fn config_exposes_public_key_and_both_methods() {
        let handler = GetCheckoutConfigHandler::new(Arc::new(MockPaymentGateway::new()), 1800);
        let config = handler.handle();

        assert_eq!(config.public_key, MOCK_PUBLIC_KEY);
        assert_eq!(
            config.payment_methods,
            vec![PaymentMethod::Pix, PaymentMethod::CreditCard]
        );
        assert_eq!(config.pix_expires_in, 1800);
    }
}
