//! Checkout requests, their validation, and the client-side step machine.

mod contact;
mod errors;
mod request;
mod step;

pub use contact::{DocumentKind, Phone, TaxDocument};
pub use errors::CheckoutError;
pub use request::{
    BillingAddress, CardData, CheckoutRequest, CustomerData, PaymentInstrument, ValidCard,
    ValidCustomer, ValidatedCheckout,
};
pub use step::CheckoutStep;
