//! Checkout Engine - PIX and card checkout with subscription activation
//!
//! This crate turns a purchase intent into a PIX or card payment through the
//! Pagar.me gateway and activates exactly one subscription per completed
//! payment, whether confirmation arrives by webhook, by client poll or both.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
