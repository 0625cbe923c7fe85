//! Static guide resources
//!
//! Markdown documents the assistant host can read to learn how to use the
//! tools. The table is built once and never changes.

use crate::error::ClassifiedError;
use crate::mcp::types::{ReadResourceResult, Resource, ResourceContent};

const MARKDOWN: &str = "text/markdown";

struct Guide {
    uri: &'static str,
    name: &'static str,
    description: &'static str,
    text: &'static str,
}

const GUIDES: &[Guide] = &[
    Guide {
        uri: "stripe://guides/invoice-search",
        name: "Invoice search guide",
        description: "How to find invoices by metadata with search_invoices",
        text: INVOICE_SEARCH_GUIDE,
    },
    Guide {
        uri: "stripe://guides/credit-notes",
        name: "Credit note guide",
        description: "How create_credit_note issues full credit notes",
        text: CREDIT_NOTE_GUIDE,
    },
];

const INVOICE_SEARCH_GUIDE: &str = "# Searching invoices by metadata

Call `search_invoices` with a `metadata` argument of the form `key:value`.

- Only the first `:` separates key from value, so `url:https://example.com/a:b`
  searches key `url` for the value `https://example.com/a:b`.
- Whitespace around key and value is ignored.
- `limit` controls the page size (1-100, default 10). Larger values are
  capped at 100.
- When more results exist, the response ends with a `page` cursor. Repeat the
  call with the same `metadata` and that `page` value to continue.

Stripe search results can lag behind writes by up to a minute.
";

const CREDIT_NOTE_GUIDE: &str = "# Issuing credit notes

Call `create_credit_note` with the `invoice_id` (for example `in_1Abc23`).

- The credit note always covers the invoice's full total. Partial credits
  are not supported.
- `reason` is optional and must be one of `duplicate`, `fraudulent`,
  `order_change` or `product_unsatisfactory`.
- `memo` is optional free text printed on the credit note.

Stripe rejects credit notes for invoices that are not paid or that already
have a credit note; the error message explains which case applies.
";

/// List all resources
pub fn list_resources() -> Vec<Resource> {
    GUIDES
        .iter()
        .map(|g| Resource {
            uri: g.uri.to_string(),
            name: g.name.to_string(),
            description: Some(g.description.to_string()),
            mime_type: Some(MARKDOWN.to_string()),
        })
        .collect()
}

/// Read a resource by URI
pub fn read_resource(uri: &str) -> Result<ReadResourceResult, ClassifiedError> {
    let guide = GUIDES
        .iter()
        .find(|g| g.uri == uri)
        .ok_or_else(|| ClassifiedError::unknown_resource(uri))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent {
            uri: guide.uri.to_string(),
            mime_type: Some(MARKDOWN.to_string()),
            text: guide.text.to_string(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_every_listed_resource_is_readable() {
        for resource in list_resources() {
            let result = read_resource(&resource.uri).unwrap();
            assert_eq!(result.contents.len(), 1);
            assert!(result.contents[0].text.starts_with("# "));
        }
    }

    #[test]
    fn test_unknown_resource() {
        let err = read_resource("stripe://guides/refunds").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert!(err.message.contains("stripe://guides/refunds"));
    }
}
