//! Stripe API module
//!
//! Contains types, search query construction, and the client for the Stripe API.

pub mod client;
pub mod query;
pub mod types;
