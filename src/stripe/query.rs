//! Stripe search query construction
//!
//! Turns caller-supplied `key:value` strings into Stripe Search Query
//! Language clauses.

use crate::error::{Result, ValidationError};

/// Separator between metadata key and value
const SEPARATOR: char = ':';

/// Build a metadata search clause from a `key:value` string.
///
/// Only the first separator splits; the rest belongs to the value, so
/// URLs and timestamps survive intact.
///
/// ```
/// use stripe_invoice_mcp_server::stripe::query::build_metadata_query;
///
/// let query = build_metadata_query("order_id:1234").unwrap();
/// assert_eq!(query, "metadata['order_id']:'1234'");
/// ```
pub fn build_metadata_query(raw: &str) -> Result<String> {
    let (key, value) = raw.split_once(SEPARATOR).ok_or_else(|| invalid_query(format!(
        "expected 'key:value' format, got '{}'",
        raw
    )))?;

    let key = key.trim();
    let value = value.trim();

    if key.is_empty() {
        return Err(invalid_query(format!("metadata key is empty in '{}'", raw)));
    }
    if value.is_empty() {
        return Err(invalid_query(format!("metadata value is empty in '{}'", raw)));
    }

    Ok(format!(
        "metadata['{}']:'{}'",
        escape_quoted(key),
        escape_quoted(value)
    ))
}

/// Escape a string for embedding between single quotes
pub fn escape_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn invalid_query(message: String) -> crate::error::StripeMcpError {
    ValidationError::InvalidQuery { message }.into()
}
