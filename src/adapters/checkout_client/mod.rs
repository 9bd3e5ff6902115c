//! Client-side adapters: how a checkout session reaches the server.

mod http_checkout_api;

pub use http_checkout_api::HttpCheckoutApi;
