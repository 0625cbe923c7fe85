//! Stripe API client
//!
//! The `StripeApi` trait is the seam tool handlers call through;
//! `StripeClient` implements it over HTTP with `reqwest`.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Result, StripeError, StripeErrorKind};
use crate::stripe::types::{
    ApiErrorResponse, CreateCreditNoteRequest, CreditNote, Invoice, SearchResult,
};

/// Invoice search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSearch {
    /// Query in Stripe Search Query Language
    pub query: String,

    /// Page size
    pub limit: u32,

    /// Continuation cursor from a previous page
    pub page: Option<String>,

    /// Fields to expand on each result
    pub expand: Vec<String>,
}

/// Remote operations used by the tool handlers
#[async_trait]
pub trait StripeApi: Send + Sync {
    /// Search invoices
    async fn search_invoices(&self, search: &InvoiceSearch) -> Result<SearchResult<Invoice>>;

    /// Retrieve a single invoice
    async fn retrieve_invoice(&self, invoice_id: &str) -> Result<Invoice>;

    /// Create a credit note
    async fn create_credit_note(&self, request: &CreateCreditNoteRequest) -> Result<CreditNote>;
}

/// Stripe API client
pub struct StripeClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// Secret key, sent as a bearer token
    secret_key: String,

    /// API base URL
    api_base: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http_client,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }

    /// Send a request and decode the success body, or map the failure
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let request_id = request_id(response.headers());
        let text = response.text().await.unwrap_or_default();
        Err(parse_error_response(status.as_u16(), request_id, &text).into())
    }
}

#[async_trait]
impl StripeApi for StripeClient {
    async fn search_invoices(&self, search: &InvoiceSearch) -> Result<SearchResult<Invoice>> {
        let mut params: Vec<(&str, String)> = vec![
            ("query", search.query.clone()),
            ("limit", search.limit.to_string()),
        ];
        if let Some(page) = &search.page {
            params.push(("page", page.clone()));
        }
        for field in &search.expand {
            params.push(("expand[]", field.clone()));
        }

        let request = self
            .http_client
            .get(self.url("invoices/search"))
            .query(&params);

        self.send(request).await
    }

    async fn retrieve_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        let request = self
            .http_client
            .get(self.url(&format!("invoices/{}", invoice_id)));

        self.send(request).await
    }

    async fn create_credit_note(&self, request: &CreateCreditNoteRequest) -> Result<CreditNote> {
        let request = self
            .http_client
            .post(self.url("credit_notes"))
            .form(request);

        self.send(request).await
    }
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn connection_error(err: reqwest::Error) -> StripeError {
    let message = if err.is_timeout() {
        format!("Request to Stripe timed out: {}", err)
    } else {
        format!("Could not connect to Stripe: {}", err)
    };
    StripeError::new(StripeErrorKind::Connection, message)
}

/// Map a non-success Stripe response onto a `StripeError`
pub fn parse_error_response(status: u16, request_id: Option<String>, body: &str) -> StripeError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => {
            let error = parsed.error;
            StripeError {
                kind: StripeErrorKind::from_response(status, error.error_type.as_deref()),
                message: error
                    .message
                    .unwrap_or_else(|| format!("Stripe returned HTTP {}", status)),
                code: error.code,
                param: error.param,
                http_status: Some(status),
                request_id,
            }
        }
        Err(_) => {
            let message = if body.trim().is_empty() {
                format!("Stripe returned HTTP {}", status)
            } else {
                format!("Stripe returned HTTP {}: {}", status, body.trim())
            };
            StripeError {
                kind: StripeErrorKind::from_response(status, None),
                message,
                code: None,
                param: None,
                http_status: Some(status),
                request_id,
            }
        }
    }
}
