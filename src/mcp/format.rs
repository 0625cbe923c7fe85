//! Text rendering of Stripe objects
//!
//! Every function here is pure: the same record always renders to the same
//! bytes, and missing numbers or timestamps render as `N/A`.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::stripe::types::{CreditNote, Invoice, SearchResult};

/// Placeholder for absent values
pub const NOT_AVAILABLE: &str = "N/A";

/// Format an amount in minor currency units, e.g. `12345, "usd"` → `123.45 USD`
pub fn format_amount(amount: Option<i64>, currency: &str) -> String {
    let Some(amount) = amount else {
        return NOT_AVAILABLE.to_string();
    };

    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!(
        "{}{}.{:02} {}",
        sign,
        abs / 100,
        abs % 100,
        currency.to_uppercase()
    )
}

/// Format a Unix timestamp (seconds) in UTC
pub fn format_timestamp(timestamp: Option<i64>) -> String {
    match timestamp {
        Some(ts) if ts != 0 => DateTime::<Utc>::from_timestamp(ts, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Display name for an invoice's customer
pub fn customer_display(invoice: &Invoice) -> String {
    let expanded = invoice.customer.as_ref().and_then(|c| c.as_object());

    let name = expanded
        .and_then(|c| c.name.as_deref())
        .or(invoice.customer_name.as_deref())
        .filter(|s| !s.is_empty());
    let email = expanded
        .and_then(|c| c.email.as_deref())
        .or(invoice.customer_email.as_deref())
        .filter(|s| !s.is_empty());

    match (name, email) {
        (Some(name), Some(email)) => format!("{} ({})", name, email),
        (Some(name), None) => name.to_string(),
        (None, Some(email)) => email.to_string(),
        (None, None) => invoice
            .customer
            .as_ref()
            .map(|c| c.id().to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Render one invoice as an indented block
pub fn format_invoice(invoice: &Invoice) -> String {
    let mut text = String::new();
    let currency = invoice.currency.as_str();

    let _ = writeln!(text, "Invoice: {}", invoice.id);
    let _ = writeln!(
        text,
        "  Status: {}",
        invoice.status.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(text, "  Customer: {}", customer_display(invoice));
    let _ = writeln!(text, "  Total: {}", format_amount(invoice.total, currency));
    let _ = writeln!(
        text,
        "  Amount Due: {}",
        format_amount(invoice.amount_due, currency)
    );
    let _ = writeln!(text, "  Created: {}", format_timestamp(invoice.created));

    if !invoice.metadata.is_empty() {
        let pairs = invoice
            .metadata
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(text, "  Metadata: {}", pairs);
    }

    if let Some(url) = invoice.hosted_invoice_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(text, "  View: {}", url);
    }

    text
}

/// Render an invoice search result, including the pagination hint
pub fn format_invoice_list(query: &str, result: &SearchResult<Invoice>) -> String {
    let mut text = format!(
        "Found {} matching query: {}\n",
        plural(result.data.len(), "invoice", "invoices"),
        query
    );

    if result.data.is_empty() {
        text.push_str("\nNo invoices found for this metadata query.\n");
        return text;
    }

    for invoice in &result.data {
        text.push('\n');
        text.push_str(&format_invoice(invoice));
    }

    if result.has_more {
        if let Some(cursor) = result.next_page.as_deref() {
            let _ = write!(
                text,
                "\nMore results are available. Call search_invoices again with page: \"{}\" to fetch the next page.\n",
                cursor
            );
        }
    }

    text.push_str("\nTip: use create_credit_note with an invoice ID above to issue a full credit note.\n");
    text
}

/// Render a newly created credit note
pub fn format_credit_note(note: &CreditNote) -> String {
    let mut text = String::new();
    let currency = note.currency.as_str();

    let _ = writeln!(text, "Credit note created: {}", note.id);
    if let Some(number) = note.number.as_deref() {
        let _ = writeln!(text, "Number: {}", number);
    }
    let _ = writeln!(
        text,
        "Status: {}",
        note.status.as_deref().unwrap_or(NOT_AVAILABLE)
    );

    text.push_str("\nFinancial Summary:\n");
    let _ = writeln!(text, "  Amount: {}", format_amount(note.amount, currency));
    let _ = writeln!(text, "  Subtotal: {}", format_amount(note.subtotal, currency));
    if let Some(discount) = note.discount_amount.filter(|d| *d != 0) {
        let _ = writeln!(
            text,
            "  Discounts: {}",
            format_amount(Some(discount), currency)
        );
    }
    let _ = writeln!(text, "  Total: {}", format_amount(note.total, currency));

    text.push_str("\nRelated:\n");
    let _ = writeln!(
        text,
        "  Invoice: {}",
        note.invoice.as_ref().map(|i| i.id()).unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(
        text,
        "  Customer: {}",
        note.customer.as_ref().map(|c| c.id()).unwrap_or(NOT_AVAILABLE)
    );

    let memo = note.memo.as_deref().filter(|m| !m.is_empty());
    if note.reason.is_some() || memo.is_some() {
        text.push_str("\nDetails:\n");
        if let Some(reason) = note.reason {
            let _ = writeln!(text, "  Reason: {}", reason.as_str());
        }
        if let Some(memo) = memo {
            let _ = writeln!(text, "  Memo: {}", memo);
        }
    }

    text.push_str("\nTimeline:\n");
    let _ = writeln!(text, "  Created: {}", format_timestamp(note.created));
    if note.effective_at.is_some_and(|ts| ts != 0) {
        let _ = writeln!(
            text,
            "  Effective At: {}",
            format_timestamp(note.effective_at)
        );
    }

    if !note.lines.data.is_empty() {
        let _ = writeln!(text, "\nLine Items ({}):", note.lines.data.len());
        for (index, line) in note.lines.data.iter().enumerate() {
            let description = line
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("No description");
            let _ = writeln!(text, "  {}. {}", index + 1, description);
            let _ = writeln!(
                text,
                "     Amount: {}",
                format_amount(line.amount, currency)
            );
            if let Some(quantity) = line.quantity {
                let _ = writeln!(text, "     Quantity: {}", quantity);
            }
            if line.unit_amount.is_some() {
                let _ = writeln!(
                    text,
                    "     Unit Amount: {}",
                    format_amount(line.unit_amount, currency)
                );
            }
        }
    }

    if let Some(pdf) = note.pdf.as_deref().filter(|p| !p.is_empty()) {
        let _ = writeln!(text, "\nDownload PDF: {}", pdf);
    }

    text
}
