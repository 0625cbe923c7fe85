//! Stripe API type definitions
//!
//! These types mirror the subset of Stripe API responses this server reads,
//! and the request bodies it sends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A field that is either an object ID or the expanded object itself
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Expandable<T> {
    /// Unexpanded object ID
    Id(String),

    /// Expanded object
    Object(Box<T>),
}

impl<T: HasId> Expandable<T> {
    /// ID of the referenced object, whether expanded or not
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(obj) => obj.id(),
        }
    }

    /// The expanded object, if present
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(obj) => Some(obj),
        }
    }
}

/// Objects carrying a Stripe ID
pub trait HasId {
    fn id(&self) -> &str;
}

/// A Stripe customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Customer {
    /// Customer ID
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,
}

impl HasId for Customer {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A Stripe invoice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Invoice {
    /// Invoice ID
    pub id: String,

    /// Invoice status (draft, open, paid, uncollectible, void)
    #[serde(default)]
    pub status: Option<String>,

    /// Customer, expanded when requested
    #[serde(default)]
    pub customer: Option<Expandable<Customer>>,

    /// Customer name snapshot on the invoice
    #[serde(default)]
    pub customer_name: Option<String>,

    /// Customer email snapshot on the invoice
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Total in minor currency units
    #[serde(default)]
    pub total: Option<i64>,

    /// Amount still due in minor currency units
    #[serde(default)]
    pub amount_due: Option<i64>,

    /// Three-letter ISO currency code
    #[serde(default)]
    pub currency: String,

    /// Creation time (Unix seconds)
    #[serde(default)]
    pub created: Option<i64>,

    /// Metadata key/value pairs
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,

    /// Hosted invoice page
    #[serde(default)]
    pub hosted_invoice_url: Option<String>,
}

impl HasId for Invoice {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Response of a Stripe search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult<T> {
    /// Objects in this page
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    /// Whether another page is available
    #[serde(default)]
    pub has_more: bool,

    /// Cursor for the next page
    #[serde(default)]
    pub next_page: Option<String>,

    /// Total matches (only when requested)
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl<T> Default for SearchResult<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
            next_page: None,
            total_count: None,
        }
    }
}

/// Reason attached to a credit note
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteReason {
    Duplicate,
    Fraudulent,
    OrderChange,
    ProductUnsatisfactory,
}

impl CreditNoteReason {
    /// All accepted reasons, in schema order
    pub const ALL: [CreditNoteReason; 4] = [
        CreditNoteReason::Duplicate,
        CreditNoteReason::Fraudulent,
        CreditNoteReason::OrderChange,
        CreditNoteReason::ProductUnsatisfactory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditNoteReason::Duplicate => "duplicate",
            CreditNoteReason::Fraudulent => "fraudulent",
            CreditNoteReason::OrderChange => "order_change",
            CreditNoteReason::ProductUnsatisfactory => "product_unsatisfactory",
        }
    }
}

/// A line of a credit note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreditNoteLineItem {
    /// Line item ID
    #[serde(default)]
    pub id: Option<String>,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Amount in minor currency units
    #[serde(default)]
    pub amount: Option<i64>,

    /// Quantity
    #[serde(default)]
    pub quantity: Option<u64>,

    /// Unit amount in minor currency units
    #[serde(default)]
    pub unit_amount: Option<i64>,
}

/// A paginated list of credit note lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreditNoteLines {
    #[serde(default)]
    pub data: Vec<CreditNoteLineItem>,

    #[serde(default)]
    pub has_more: bool,
}

/// A Stripe credit note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreditNote {
    /// Credit note ID
    pub id: String,

    /// Human-readable number
    #[serde(default)]
    pub number: Option<String>,

    /// Status (issued, void)
    #[serde(default)]
    pub status: Option<String>,

    /// Credited amount in minor currency units
    #[serde(default)]
    pub amount: Option<i64>,

    /// Amount before discounts
    #[serde(default)]
    pub subtotal: Option<i64>,

    /// Total discount applied
    #[serde(default)]
    pub discount_amount: Option<i64>,

    /// Amount after discounts
    #[serde(default)]
    pub total: Option<i64>,

    /// Three-letter ISO currency code
    #[serde(default)]
    pub currency: String,

    /// Credited invoice
    #[serde(default)]
    pub invoice: Option<Expandable<Invoice>>,

    /// Customer the credit applies to
    #[serde(default)]
    pub customer: Option<Expandable<Customer>>,

    /// Reason for the credit
    #[serde(default)]
    pub reason: Option<CreditNoteReason>,

    /// Memo shown on the credit note PDF
    #[serde(default)]
    pub memo: Option<String>,

    /// Line items
    #[serde(default)]
    pub lines: CreditNoteLines,

    /// Link to the credit note PDF
    #[serde(default)]
    pub pdf: Option<String>,

    /// Creation time (Unix seconds)
    #[serde(default)]
    pub created: Option<i64>,

    /// Time the credit note took effect (Unix seconds)
    #[serde(default)]
    pub effective_at: Option<i64>,
}

/// Form body for `POST /v1/credit_notes`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateCreditNoteRequest {
    /// Invoice to credit
    pub invoice: String,

    /// Amount to credit in minor currency units
    pub amount: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CreditNoteReason>,
}

impl CreateCreditNoteRequest {
    /// Request crediting the invoice's full total
    pub fn full_credit(invoice_id: &str, total: i64) -> Self {
        Self {
            invoice: invoice_id.to_string(),
            amount: total,
            memo: None,
            reason: None,
        }
    }
}

/// Error envelope returned by the Stripe API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Body of a Stripe API error
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub param: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
