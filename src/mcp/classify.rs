//! Failure classification
//!
//! Maps every error a tool call can produce onto the caller-facing
//! taxonomy. Rules are checked in order and the first match wins.

use serde_json::Value;

use crate::config::env;
use crate::error::{
    ClassifiedError, ErrorContext, ErrorKind, StripeError, StripeErrorKind, StripeMcpError,
    ValidationError,
};

const DETAIL_SEPARATOR: &str = " | ";

/// Classify a failure, attaching the operation's own parameters for traceability
pub fn classify(error: StripeMcpError, params: &Value) -> ClassifiedError {
    let classified = match error {
        StripeMcpError::Classified(classified) => return classified,
        StripeMcpError::Stripe(err) => classify_stripe(&err, params),
        StripeMcpError::Validation(ValidationError::InvalidQuery { message }) => {
            ClassifiedError::invalid_params(format!("Invalid metadata query: {}", message))
        }
        other => classify_unexpected(&other),
    };

    tracing::error!(
        kind = ?classified.kind,
        error = %classified.message,
        "Tool call failed"
    );
    classified
}

fn classify_stripe(err: &StripeError, params: &Value) -> ClassifiedError {
    let detail = detail_line(err, params);

    let (kind, message) = match err.kind {
        StripeErrorKind::InvalidRequest => (
            ErrorKind::InvalidParams,
            invalid_request_message(err, params, &detail),
        ),
        StripeErrorKind::Authentication => (
            ErrorKind::InternalError,
            format!(
                "Stripe authentication failed. Check that {} is set to a valid secret key. ({})",
                env::SECRET_KEY,
                detail
            ),
        ),
        StripeErrorKind::Permission => (
            ErrorKind::InternalError,
            format!(
                "The configured Stripe API key lacks the permissions required for this operation. ({})",
                detail
            ),
        ),
        StripeErrorKind::RateLimit => (
            ErrorKind::InternalError,
            format!(
                "Stripe rate limit exceeded. Wait a few seconds and retry the request. ({})",
                detail
            ),
        ),
        _ => (ErrorKind::InternalError, format!("Stripe API error: {}", detail)),
    };

    ClassifiedError::new(kind, message).with_context(ErrorContext {
        request_id: err.request_id.clone(),
        http_status: err.http_status,
        param: err.param.clone(),
    })
}

fn invalid_request_message(err: &StripeError, params: &Value, detail: &str) -> String {
    let invoice_id = params
        .get("invoice_id")
        .and_then(Value::as_str)
        .unwrap_or("the requested invoice");

    if err.message.contains("No such invoice") {
        format!(
            "Invoice {} was not found. Verify the invoice ID and that it belongs to this Stripe account. ({})",
            invoice_id, detail
        )
    } else if err.message.contains("already has a credit note") {
        format!(
            "Invoice {} already has a credit note covering its full amount. ({})",
            invoice_id, detail
        )
    } else if err.message.contains("not paid") {
        format!(
            "Invoice {} is not paid. Credit notes can only be issued for paid invoices. ({})",
            invoice_id, detail
        )
    } else {
        format!("Invalid parameters: {}", detail)
    }
}

/// Message, type, code, status, request id, then the caller's parameters
fn detail_line(err: &StripeError, params: &Value) -> String {
    let mut parts = vec![
        err.message.clone(),
        format!("type: {}", err.kind),
        format!("code: {}", err.code.as_deref().unwrap_or("N/A")),
    ];
    if let Some(status) = err.http_status {
        parts.push(format!("status: {}", status));
    }
    if let Some(request_id) = &err.request_id {
        parts.push(format!("request: {}", request_id));
    }
    if !params.is_null() {
        parts.push(format!("params: {}", params));
    }
    parts.join(DETAIL_SEPARATOR)
}

fn classify_unexpected(err: &StripeMcpError) -> ClassifiedError {
    let message = err.to_string();
    if message.trim().is_empty() {
        return ClassifiedError::internal("An unexpected error occurred");
    }
    ClassifiedError::internal(format!("Unexpected {} error: {}", err.category(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stripe_error(kind: StripeErrorKind, message: &str) -> StripeMcpError {
        StripeMcpError::Stripe(StripeError {
            kind,
            message: message.to_string(),
            code: Some("resource_missing".to_string()),
            param: Some("invoice".to_string()),
            http_status: Some(400),
            request_id: Some("req_123".to_string()),
        })
    }

    #[test]
    fn test_classified_errors_pass_through() {
        let original = ClassifiedError::invalid_params("invoice_id is required");
        let result = classify(original.clone().into(), &json!({}));
        assert_eq!(result, original);
    }

    #[test]
    fn test_not_paid_is_specialized() {
        let err = stripe_error(
            StripeErrorKind::InvalidRequest,
            "Invoice in_123 is not paid and cannot be credited",
        );
        let result = classify(err, &json!({"invoice_id": "in_123"}));
        assert_eq!(result.kind, ErrorKind::InvalidParams);
        assert!(result.message.starts_with("Invoice in_123 is not paid."));
        assert!(!result.message.starts_with("Invalid parameters"));
    }

    #[test]
    fn test_no_such_invoice_is_specialized() {
        let err = stripe_error(StripeErrorKind::InvalidRequest, "No such invoice: 'in_404'");
        let result = classify(err, &json!({"invoice_id": "in_404"}));
        assert_eq!(result.kind, ErrorKind::InvalidParams);
        assert!(result.message.contains("was not found"));
    }

    #[test]
    fn test_existing_credit_note_is_specialized() {
        let err = stripe_error(
            StripeErrorKind::InvalidRequest,
            "This invoice already has a credit note for the full amount",
        );
        let result = classify(err, &json!({"invoice_id": "in_123"}));
        assert!(result.message.contains("already has a credit note"));
    }

    #[test]
    fn test_generic_invalid_request_carries_detail() {
        let err = stripe_error(StripeErrorKind::InvalidRequest, "Invalid search query");
        let result = classify(err, &json!({"metadata": "a:b", "limit": 10}));
        assert_eq!(result.kind, ErrorKind::InvalidParams);
        assert_eq!(
            result.message,
            "Invalid parameters: Invalid search query | type: invalid_request_error | code: resource_missing | status: 400 | request: req_123 | params: {\"limit\":10,\"metadata\":\"a:b\"}"
        );
        assert_eq!(result.context.request_id.as_deref(), Some("req_123"));
        assert_eq!(result.context.http_status, Some(400));
        assert_eq!(result.context.param.as_deref(), Some("invoice"));
    }

    #[test]
    fn test_remote_subtypes_map_to_internal() {
        let cases = [
            (StripeErrorKind::Authentication, "STRIPE_SECRET_KEY"),
            (StripeErrorKind::Permission, "lacks the permissions"),
            (StripeErrorKind::RateLimit, "retry"),
            (StripeErrorKind::Api, "Stripe API error"),
            (StripeErrorKind::Connection, "Stripe API error"),
        ];
        for (kind, expected) in cases {
            let result = classify(stripe_error(kind, "boom"), &json!({}));
            assert_eq!(result.kind, ErrorKind::InternalError, "{:?}", kind);
            assert!(result.message.contains(expected), "{:?}: {}", kind, result.message);
        }
    }

    #[test]
    fn test_missing_code_uses_placeholder() {
        let err = StripeMcpError::Stripe(StripeError::new(StripeErrorKind::Api, "down"));
        let result = classify(err, &Value::Null);
        assert_eq!(
            result.message,
            "Stripe API error: down | type: api_error | code: N/A"
        );
        assert!(result.context.is_empty());
    }

    #[test]
    fn test_invalid_query_passes_message_through() {
        let err = StripeMcpError::Validation(ValidationError::InvalidQuery {
            message: "expected 'key:value' format, got 'novalue'".to_string(),
        });
        let result = classify(err, &json!({"metadata": "novalue"}));
        assert_eq!(result.kind, ErrorKind::InvalidParams);
        assert_eq!(
            result.message,
            "Invalid metadata query: expected 'key:value' format, got 'novalue'"
        );
    }

    #[test]
    fn test_unexpected_errors_are_internal() {
        let json_err = serde_json::from_str::<Value>("{").unwrap_err();
        let result = classify(json_err.into(), &json!({}));
        assert_eq!(result.kind, ErrorKind::InternalError);
        assert!(result.message.starts_with("Unexpected Json error:"));

        let other = StripeMcpError::Config(crate::error::ConfigError::InvalidConfig {
            message: "bad timeout".to_string(),
        });
        let result = classify(other, &json!({}));
        assert_eq!(result.kind, ErrorKind::InternalError);
        assert!(result.message.starts_with("Unexpected Config error:"));
    }
}
