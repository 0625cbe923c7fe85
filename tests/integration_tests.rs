//! Integration tests for Stripe Invoice MCP Server
//!
//! These tests drive the tool registry and the JSON-RPC server end to end.
//! Note: the Stripe API is mocked - they don't make real API calls.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use stripe_invoice_mcp_server::error::{Result, StripeError, StripeErrorKind};
use stripe_invoice_mcp_server::mcp::server::McpServer;
use stripe_invoice_mcp_server::mcp::tools::ToolRegistry;
use stripe_invoice_mcp_server::stripe::client::{InvoiceSearch, StripeApi};
use stripe_invoice_mcp_server::stripe::types::{
    CreateCreditNoteRequest, CreditNote, CreditNoteReason, Customer, Expandable, Invoice,
    SearchResult,
};
use stripe_invoice_mcp_server::ErrorKind;

/// In-memory Stripe API that records every request
#[derive(Default)]
struct MockStripe {
    searches: Mutex<Vec<InvoiceSearch>>,
    retrieved: Mutex<Vec<String>>,
    created: Mutex<Vec<CreateCreditNoteRequest>>,
    search_result: Mutex<Option<SearchResult<Invoice>>>,
    invoice: Mutex<Option<Invoice>>,
    create_error: Mutex<Option<StripeError>>,
}

impl MockStripe {
    fn with_invoices(invoices: Vec<Invoice>, next_page: Option<&str>) -> Self {
        let mock = Self::default();
        *mock.search_result.lock().unwrap() = Some(SearchResult {
            data: invoices,
            has_more: next_page.is_some(),
            next_page: next_page.map(str::to_string),
            total_count: None,
        });
        mock
    }

    fn with_invoice(invoice: Invoice) -> Self {
        let mock = Self::default();
        *mock.invoice.lock().unwrap() = Some(invoice);
        mock
    }

    fn call_count(&self) -> usize {
        self.searches.lock().unwrap().len()
            + self.retrieved.lock().unwrap().len()
            + self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl StripeApi for MockStripe {
    async fn search_invoices(&self, search: &InvoiceSearch) -> Result<SearchResult<Invoice>> {
        self.searches.lock().unwrap().push(search.clone());
        Ok(self.search_result.lock().unwrap().clone().unwrap_or_default())
    }

    async fn retrieve_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        self.retrieved.lock().unwrap().push(invoice_id.to_string());
        match self.invoice.lock().unwrap().clone() {
            Some(invoice) => Ok(invoice),
            None => Err(StripeError {
                kind: StripeErrorKind::InvalidRequest,
                message: format!("No such invoice: '{}'", invoice_id),
                code: Some("resource_missing".to_string()),
                param: Some("id".to_string()),
                http_status: Some(404),
                request_id: Some("req_missing".to_string()),
            }
            .into()),
        }
    }

    async fn create_credit_note(&self, request: &CreateCreditNoteRequest) -> Result<CreditNote> {
        self.created.lock().unwrap().push(request.clone());
        if let Some(err) = self.create_error.lock().unwrap().clone() {
            return Err(err.into());
        }

        Ok(CreditNote {
            id: "cn_test_1".to_string(),
            status: Some("issued".to_string()),
            amount: Some(request.amount),
            subtotal: Some(request.amount),
            total: Some(request.amount),
            currency: "usd".to_string(),
            invoice: Some(Expandable::Id(request.invoice.clone())),
            customer: Some(Expandable::Id("cus_1".to_string())),
            reason: request.reason,
            memo: request.memo.clone(),
            created: Some(1_704_067_200),
            ..Default::default()
        })
    }
}

fn paid_invoice() -> Invoice {
    let mut metadata = BTreeMap::new();
    metadata.insert("order_id".to_string(), "1234".to_string());

    Invoice {
        id: "in_1Abc".to_string(),
        status: Some("paid".to_string()),
        customer: Some(Expandable::Object(Box::new(Customer {
            id: "cus_1".to_string(),
            name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
        }))),
        total: Some(4999),
        amount_due: Some(0),
        currency: "usd".to_string(),
        created: Some(1_704_067_200),
        metadata,
        hosted_invoice_url: Some("https://invoice.stripe.com/i/test".to_string()),
        ..Default::default()
    }
}

fn setup(mock: MockStripe) -> (Arc<MockStripe>, ToolRegistry) {
    let mock = Arc::new(mock);
    let registry = ToolRegistry::new(mock.clone());
    (mock, registry)
}

mod search_invoices_tests {
    use super::*;

    #[tokio::test]
    async fn test_search_builds_query_and_expands_customer() {
        let (mock, registry) = setup(MockStripe::with_invoices(vec![paid_invoice()], None));

        let result = registry
            .call_tool("search_invoices", json!({"metadata": "order_id:1234"}))
            .await
            .unwrap();

        let searches = mock.searches.lock().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].query, "metadata['order_id']:'1234'");
        assert_eq!(searches[0].limit, 10);
        assert_eq!(searches[0].page, None);
        assert_eq!(searches[0].expand, vec!["data.customer".to_string()]);

        let text = result.first_text().unwrap();
        assert!(text.starts_with("Found 1 invoice matching query: metadata['order_id']:'1234'"));
        assert!(text.contains("Customer: Jane Doe (jane@example.com)"));
        assert!(text.contains("Total: 49.99 USD"));
    }

    #[tokio::test]
    async fn test_limit_is_clamped_before_remote_call() {
        let (mock, registry) = setup(MockStripe::default());

        registry
            .call_tool("search_invoices", json!({"metadata": "a:b", "limit": 500}))
            .await
            .unwrap();

        assert_eq!(mock.searches.lock().unwrap()[0].limit, 100);
    }

    #[tokio::test]
    async fn test_page_cursor_round_trip() {
        let (mock, registry) = setup(MockStripe::with_invoices(
            vec![paid_invoice()],
            Some("page_2_cursor"),
        ));

        let result = registry
            .call_tool(
                "search_invoices",
                json!({"metadata": "order_id:1234", "page": "page_1_cursor"}),
            )
            .await
            .unwrap();

        assert_eq!(
            mock.searches.lock().unwrap()[0].page.as_deref(),
            Some("page_1_cursor")
        );
        assert!(result.first_text().unwrap().contains("page: \"page_2_cursor\""));
    }

    #[tokio::test]
    async fn test_empty_result() {
        let (_, registry) = setup(MockStripe::default());

        let result = registry
            .call_tool("search_invoices", json!({"metadata": "order_id:none"}))
            .await
            .unwrap();

        let text = result.first_text().unwrap();
        assert!(text.starts_with("Found 0 invoices"));
        assert!(text.contains("No invoices found"));
        assert!(!text.contains("Invoice: "));
    }

    #[tokio::test]
    async fn test_missing_metadata_fails_without_network() {
        let (mock, registry) = setup(MockStripe::default());

        let err = registry
            .call_tool("search_invoices", json!({"limit": 5}))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert_eq!(mock.call_count(), 0);
    }
}

mod create_credit_note_tests {
    use super::*;

    #[tokio::test]
    async fn test_credits_full_invoice_total() {
        let (mock, registry) = setup(MockStripe::with_invoice(paid_invoice()));

        let result = registry
            .call_tool(
                "create_credit_note",
                json!({
                    "invoice_id": "in_1Abc",
                    "memo": "Duplicate charge",
                    "reason": "duplicate",
                    "amount": 1
                }),
            )
            .await
            .unwrap();

        assert_eq!(mock.retrieved.lock().unwrap().as_slice(), ["in_1Abc"]);

        let created = mock.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].invoice, "in_1Abc");
        assert_eq!(created[0].amount, 4999);
        assert_eq!(created[0].memo.as_deref(), Some("Duplicate charge"));
        assert_eq!(created[0].reason, Some(CreditNoteReason::Duplicate));

        let text = result.first_text().unwrap();
        assert!(text.starts_with("Credit note created: cn_test_1"));
        assert!(text.contains("  Amount: 49.99 USD"));
        assert!(text.contains("  Reason: duplicate"));
    }

    #[tokio::test]
    async fn test_missing_invoice_is_invalid_params() {
        let (mock, registry) = setup(MockStripe::default());

        let err = registry
            .call_tool("create_credit_note", json!({"invoice_id": "in_404"}))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert!(err.message.contains("Invoice in_404 was not found"));
        assert!(err.message.contains("request: req_missing"));
        assert!(err.message.contains("\"invoice_id\":\"in_404\""));
        assert_eq!(err.context.http_status, Some(404));
        assert!(mock.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unpaid_invoice_is_specialized() {
        let mock = MockStripe::with_invoice(paid_invoice());
        *mock.create_error.lock().unwrap() = Some(StripeError {
            kind: StripeErrorKind::InvalidRequest,
            message: "Invoice in_1Abc is not paid".to_string(),
            code: None,
            param: Some("invoice".to_string()),
            http_status: Some(400),
            request_id: Some("req_unpaid".to_string()),
        });
        let (_, registry) = setup(mock);

        let err = registry
            .call_tool(
                "create_credit_note",
                json!({"invoice_id": "in_1Abc", "reason": "order_change"}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert!(err.message.starts_with("Invoice in_1Abc is not paid."));
        assert!(err.message.contains("\"reason\":\"order_change\""));
        assert!(err.message.contains("code: N/A"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_internal() {
        let mock = MockStripe::with_invoice(paid_invoice());
        *mock.create_error.lock().unwrap() = Some(StripeError {
            http_status: Some(429),
            ..StripeError::new(StripeErrorKind::RateLimit, "Too many requests")
        });
        let (_, registry) = setup(mock);

        let err = registry
            .call_tool("create_credit_note", json!({"invoice_id": "in_1Abc"}))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(err.message.contains("rate limit"));
    }

    #[tokio::test]
    async fn test_bad_reason_fails_without_network() {
        let (mock, registry) = setup(MockStripe::with_invoice(paid_invoice()));

        let err = registry
            .call_tool(
                "create_credit_note",
                json!({"invoice_id": "in_1Abc", "reason": "customer_request"}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert_eq!(mock.call_count(), 0);
    }
}

mod mcp_protocol_tests {
    use super::*;

    /// Helper to create a JSON-RPC request line
    fn make_request(id: i64, method: &str, params: Option<Value>) -> String {
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
        });
        if let Some(p) = params {
            request["params"] = p;
        }
        request.to_string()
    }

    async fn send(server: &mut McpServer, line: &str) -> Value {
        let response = server.handle_message(line).await.expect("expected a response");
        serde_json::to_value(response).unwrap()
    }

    fn server(mock: MockStripe) -> (Arc<MockStripe>, McpServer) {
        let (mock, registry) = setup(mock);
        (mock, McpServer::new(registry))
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_and_resources() {
        let (_, mut server) = server(MockStripe::default());

        let response = send(&mut server, &make_request(1, "initialize", Some(json!({})))).await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert!(response["result"]["capabilities"]["tools"].is_object());
        assert!(response["result"]["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_response() {
        let (_, mut server) = server(MockStripe::default());

        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(server.handle_message(line).await.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (_, mut server) = server(MockStripe::default());

        let response = send(&mut server, &make_request(2, "tools/list", None)).await;
        let tools = response["result"]["tools"].as_array().unwrap();

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "create_credit_note");
        assert_eq!(tools[1]["name"], "search_invoices");
        assert_eq!(tools[1]["inputSchema"]["required"], json!(["metadata"]));
    }

    #[tokio::test]
    async fn test_call_tool_success() {
        let (_, mut server) = server(MockStripe::with_invoices(vec![paid_invoice()], None));

        let request = make_request(
            3,
            "tools/call",
            Some(json!({"name": "search_invoices", "arguments": {"metadata": "order_id:1234"}})),
        );
        let response = send(&mut server, &request).await;

        assert!(response["error"].is_null());
        assert_eq!(response["result"]["content"][0]["type"], "text");
        assert!(response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("in_1Abc"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let (mock, mut server) = server(MockStripe::default());

        let request = make_request(
            4,
            "tools/call",
            Some(json!({"name": "refund_invoice", "arguments": {}})),
        );
        let response = send(&mut server, &request).await;

        assert_eq!(response["error"]["code"], -32601);
        assert!(response["result"].is_null());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_classified_error_carries_context() {
        let (_, mut server) = server(MockStripe::default());

        let request = make_request(
            5,
            "tools/call",
            Some(json!({"name": "create_credit_note", "arguments": {"invoice_id": "in_404"}})),
        );
        let response = send(&mut server, &request).await;

        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["data"]["request_id"], "req_missing");
        assert_eq!(response["error"]["data"]["http_status"], 404);
    }

    #[tokio::test]
    async fn test_resources() {
        let (_, mut server) = server(MockStripe::default());

        let response = send(&mut server, &make_request(6, "resources/list", None)).await;
        let resources = response["result"]["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 2);

        let uri = resources[0]["uri"].as_str().unwrap().to_string();
        let response = send(
            &mut server,
            &make_request(7, "resources/read", Some(json!({"uri": uri}))),
        )
        .await;
        assert_eq!(response["result"]["contents"][0]["mimeType"], "text/markdown");

        let response = send(
            &mut server,
            &make_request(8, "resources/read", Some(json!({"uri": "stripe://nope"}))),
        )
        .await;
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_unknown_method_and_parse_error() {
        let (_, mut server) = server(MockStripe::default());

        let response = send(&mut server, &make_request(9, "prompts/list", None)).await;
        assert_eq!(response["error"]["code"], -32601);

        let response = send(&mut server, "{not json").await;
        assert_eq!(response["error"]["code"], -32700);
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_run_over_in_memory_streams() {
        let (_, mut server) = server(MockStripe::default());

        let input = format!(
            "{}\n\n{}\n",
            make_request(1, "ping", None),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
        );
        let mut output = Vec::new();
        server.run(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let response: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"], json!({}));
    }
}
