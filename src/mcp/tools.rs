//! MCP Tool definitions and handlers
//!
//! Each exposed tool is an [`Operation`]: it validates untyped arguments,
//! executes against the Stripe API, and formats the result. The
//! [`ToolRegistry`] dispatches by name and classifies failures.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationErrors};

use crate::config::stripe::INVOICE_ID_PREFIX;
use crate::error::{ClassifiedError, Result, StripeMcpError};
use crate::mcp::classify::classify;
use crate::mcp::format::{format_credit_note, format_invoice_list};
use crate::mcp::types::{CallToolResult, Tool};
use crate::stripe::client::{InvoiceSearch, StripeApi};
use crate::stripe::query::build_metadata_query;
use crate::stripe::types::{
    CreateCreditNoteRequest, CreditNote, CreditNoteReason, Invoice, SearchResult,
};

/// Default page size for invoice search
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Largest page size Stripe accepts
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// A tool exposed over MCP
#[async_trait]
pub trait Operation: Send + Sync {
    /// Validated, typed parameters
    type Params: Send + Sync;

    /// Result of a successful execution
    type Output: Send;

    /// Name, description and input schema
    fn definition(&self) -> Tool;

    /// Check untyped caller arguments before any network call
    fn validate(&self, args: Value) -> std::result::Result<Self::Params, ClassifiedError>;

    /// Parameters echoed into error details
    fn context(&self, params: &Self::Params) -> Value;

    /// Perform the remote work
    async fn execute(&self, api: &dyn StripeApi, params: &Self::Params) -> Result<Self::Output>;

    /// Render a successful result
    fn format(&self, params: &Self::Params, output: &Self::Output) -> String;
}

/// Object-safe view of an [`Operation`], stored in the registry
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> Tool;

    async fn call(
        &self,
        api: &dyn StripeApi,
        args: Value,
    ) -> std::result::Result<CallToolResult, ClassifiedError>;
}

#[async_trait]
impl<T: Operation> ToolHandler for T {
    fn definition(&self) -> Tool {
        Operation::definition(self)
    }

    async fn call(
        &self,
        api: &dyn StripeApi,
        args: Value,
    ) -> std::result::Result<CallToolResult, ClassifiedError> {
        let params = self.validate(args)?;

        match self.execute(api, &params).await {
            Ok(output) => Ok(CallToolResult::text(self.format(&params, &output))),
            Err(err) => {
                tracing::debug!(error = ?err, "Operation failed");
                Err(classify(err, &self.context(&params)))
            }
        }
    }
}

/// Name → handler table, built once at startup
pub struct ToolRegistry {
    api: Arc<dyn StripeApi>,
    handlers: BTreeMap<String, Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a registry with every built-in tool
    pub fn new(api: Arc<dyn StripeApi>) -> Self {
        let mut registry = Self {
            api,
            handlers: BTreeMap::new(),
        };
        registry.register(SearchInvoices);
        registry.register(CreateCreditNote);
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register<H: ToolHandler + 'static>(&mut self, handler: H) {
        let name = handler.definition().name;
        self.handlers.insert(name, Box::new(handler));
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    /// Call a tool by name
    pub async fn call_tool(
        &self,
        name: &str,
        args: Value,
    ) -> std::result::Result<CallToolResult, ClassifiedError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ClassifiedError::method_not_found(name))?;

        tracing::info!(tool = name, "Calling tool");
        handler.call(self.api.as_ref(), args).await
    }
}

// ==================== search_invoices ====================

/// Search invoices by a metadata key/value pair
pub struct SearchInvoices;

#[derive(Debug, Deserialize, Validate)]
struct SearchInvoicesArgs {
    #[validate(custom = "validate_not_blank")]
    metadata: String,

    #[validate(range(min = 1, message = "must be at least 1"))]
    limit: Option<u32>,

    page: Option<String>,
}

/// Validated `search_invoices` parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInvoicesParams {
    pub metadata: String,
    pub limit: u32,
    pub page: Option<String>,
}

/// Built query plus the page of matches
#[derive(Debug, Clone)]
pub struct InvoiceSearchOutput {
    pub query: String,
    pub result: SearchResult<Invoice>,
}

#[async_trait]
impl Operation for SearchInvoices {
    type Params = SearchInvoicesParams;
    type Output = InvoiceSearchOutput;

    fn definition(&self) -> Tool {
        tool_def(
            "search_invoices",
            "Search Stripe invoices by a metadata key/value pair",
            search_invoices_schema(),
        )
    }

    fn validate(&self, args: Value) -> std::result::Result<Self::Params, ClassifiedError> {
        let args: SearchInvoicesArgs = parse_args(args)?;

        Ok(SearchInvoicesParams {
            metadata: args.metadata,
            limit: args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT),
            page: args.page.filter(|p| !p.is_empty()),
        })
    }

    fn context(&self, params: &Self::Params) -> Value {
        let mut context = Map::new();
        context.insert("metadata".to_string(), json!(params.metadata));
        context.insert("limit".to_string(), json!(params.limit));
        if let Some(page) = &params.page {
            context.insert("page".to_string(), json!(page));
        }
        Value::Object(context)
    }

    async fn execute(&self, api: &dyn StripeApi, params: &Self::Params) -> Result<Self::Output> {
        let query = build_metadata_query(&params.metadata)?;

        tracing::info!(query = %query, limit = params.limit, "Searching invoices");
        let search = InvoiceSearch {
            query: query.clone(),
            limit: params.limit,
            page: params.page.clone(),
            expand: vec!["data.customer".to_string()],
        };
        let result = api.search_invoices(&search).await?;
        tracing::info!(count = result.data.len(), has_more = result.has_more, "Invoice search complete");

        Ok(InvoiceSearchOutput { query, result })
    }

    fn format(&self, _params: &Self::Params, output: &Self::Output) -> String {
        format_invoice_list(&output.query, &output.result)
    }
}

// ==================== create_credit_note ====================

/// Issue a credit note for an invoice's full total
pub struct CreateCreditNote;

#[derive(Debug, Deserialize, Validate)]
struct CreateCreditNoteArgs {
    #[validate(custom = "validate_invoice_id")]
    invoice_id: String,

    memo: Option<String>,

    reason: Option<CreditNoteReason>,
}

/// Validated `create_credit_note` parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCreditNoteParams {
    pub invoice_id: String,
    pub memo: Option<String>,
    pub reason: Option<CreditNoteReason>,
}

#[async_trait]
impl Operation for CreateCreditNote {
    type Params = CreateCreditNoteParams;
    type Output = CreditNote;

    fn definition(&self) -> Tool {
        tool_def(
            "create_credit_note",
            "Issue a credit note for the full total of a Stripe invoice",
            create_credit_note_schema(),
        )
    }

    fn validate(&self, args: Value) -> std::result::Result<Self::Params, ClassifiedError> {
        let args: CreateCreditNoteArgs = parse_args(args)?;

        Ok(CreateCreditNoteParams {
            invoice_id: args.invoice_id,
            memo: args.memo.filter(|m| !m.trim().is_empty()),
            reason: args.reason,
        })
    }

    fn context(&self, params: &Self::Params) -> Value {
        let mut context = Map::new();
        context.insert("invoice_id".to_string(), json!(params.invoice_id));
        if let Some(memo) = &params.memo {
            context.insert("memo".to_string(), json!(memo));
        }
        if let Some(reason) = params.reason {
            context.insert("reason".to_string(), json!(reason.as_str()));
        }
        Value::Object(context)
    }

    async fn execute(&self, api: &dyn StripeApi, params: &Self::Params) -> Result<Self::Output> {
        tracing::info!(invoice_id = %params.invoice_id, "Fetching invoice");
        let invoice = api.retrieve_invoice(&params.invoice_id).await?;

        let total = invoice.total.ok_or_else(|| {
            StripeMcpError::from(ClassifiedError::invalid_params(format!(
                "Invoice {} has no total to credit",
                invoice.id
            )))
        })?;

        // Full credit only: the amount always comes from the invoice.
        let mut request = CreateCreditNoteRequest::full_credit(&invoice.id, total);
        request.memo = params.memo.clone();
        request.reason = params.reason;

        tracing::info!(
            invoice_id = %invoice.id,
            amount = total,
            currency = %invoice.currency,
            "Creating credit note"
        );
        let note = api.create_credit_note(&request).await?;
        tracing::info!(credit_note_id = %note.id, "Credit note created");

        Ok(note)
    }

    fn format(&self, _params: &Self::Params, output: &Self::Output) -> String {
        format_credit_note(output)
    }
}

// ==================== Argument Validation ====================

/// Deserialize and validate untyped tool arguments
fn parse_args<T>(args: Value) -> std::result::Result<T, ClassifiedError>
where
    T: DeserializeOwned + Validate,
{
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };

    let parsed: T = serde_json::from_value(args)
        .map_err(|e| ClassifiedError::invalid_params(format!("Invalid arguments: {}", e)))?;
    parsed.validate().map_err(describe_validation_errors)?;
    Ok(parsed)
}

fn describe_validation_errors(errors: ValidationErrors) -> ClassifiedError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let mut details = Vec::new();
    for (field, errs) in fields {
        for e in errs.iter() {
            details.push(match &e.message {
                Some(message) => format!("{} {}", field, message),
                None => format!("{} is invalid ({})", field, e.code),
            });
        }
    }

    ClassifiedError::invalid_params(format!("Invalid arguments: {}", details.join("; ")))
}

fn validate_not_blank(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("is required (format: key:value)".into());
        return Err(err);
    }
    Ok(())
}

fn validate_invoice_id(invoice_id: &str) -> std::result::Result<(), validator::ValidationError> {
    let valid = invoice_id
        .strip_prefix(INVOICE_ID_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()));

    if !valid {
        let mut err = validator::ValidationError::new("invoice_id_format");
        err.message = Some(
            format!(
                "must start with '{}' followed by letters and digits, got '{}'",
                INVOICE_ID_PREFIX, invoice_id
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

// ==================== Schema Definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn search_invoices_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "metadata": {
                "type": "string",
                "description": "Metadata to match, as key:value (e.g. order_id:1234)"
            },
            "limit": {
                "type": "number",
                "minimum": 1,
                "maximum": MAX_SEARCH_LIMIT,
                "default": DEFAULT_SEARCH_LIMIT,
                "description": "Maximum number of invoices to return"
            },
            "page": {
                "type": "string",
                "description": "Cursor from a previous search to fetch the next page"
            }
        },
        "required": ["metadata"]
    })
}

fn create_credit_note_schema() -> Value {
    let reasons: Vec<&str> = CreditNoteReason::ALL.iter().map(|r| r.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "invoice_id": {
                "type": "string",
                "pattern": format!("^{}[A-Za-z0-9]+$", INVOICE_ID_PREFIX),
                "description": "ID of the invoice to credit in full"
            },
            "memo": {
                "type": "string",
                "description": "Memo printed on the credit note"
            },
            "reason": {
                "type": "string",
                "enum": reasons,
                "description": "Reason for issuing the credit note"
            }
        },
        "required": ["invoice_id"]
    })
}
