//! Client checkout step machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where a checkout session is in the purchase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Collecting form data.
    Form,
    /// Request sent to the server.
    Processing,
    /// PIX QR shown, waiting for the poll loop to see a verdict.
    PixWaiting,
    Success,
    Error,
}

impl StateMachine for CheckoutStep {
    fn successors(&self) -> &'static [Self] {
        use CheckoutStep::*;
        match self {
            Form => &[Processing],
            Processing => &[PixWaiting, Success, Error],
            PixWaiting => &[Success, Error],
            Success | Error => &[],
        }
    }
}
