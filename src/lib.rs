//! Stripe Invoice MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Stripe billing.
//! Provides tools for searching invoices by metadata and issuing credit notes.

pub mod config;
pub mod error;
pub mod mcp;
pub mod stripe;

pub use config::Config;
pub use error::{ClassifiedError, ErrorKind, Result, StripeMcpError};
