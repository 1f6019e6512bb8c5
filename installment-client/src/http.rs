//! HTTP client for the back-office API

use crate::{ClientConfig, ClientError, ClientResult};
use http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::request::{ContractRequest, CustomerCreate, StockCheckRequest};
use shared::response::{ApiResponse, ContractCreated, CustomerSummary, StockCheckResult};
use shared::models::Operator;
use std::time::Duration;

/// HTTP client for making network requests to the back-office services
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    contract_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            contract_timeout: Duration::from_secs(config.contract_timeout),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Build authorization header value
    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let mut request = self.client.get(self.url(path));

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(ClientError::from_reqwest)?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);

        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(ClientError::from_reqwest)?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response, classifying every non-success status
    /// exactly once
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.map_err(ClientError::from_reqwest)?;
            return match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::Validation(text))
                }
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::CONFLICT => Err(ClientError::Conflict(text)),
                StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited(text)),
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => Err(ClientError::Transient {
                    status: status.as_u16(),
                    body: text,
                }),
                _ => Err(ClientError::Internal {
                    status: status.as_u16(),
                    body: text,
                }),
            };
        }

        response.json().await.map_err(ClientError::from_reqwest)
    }

    fn unwrap_data<T>(resp: ApiResponse<T>, what: &str) -> ClientResult<T> {
        resp.data
            .ok_or_else(|| ClientError::InvalidResponse(format!("Missing {} data", what)))
    }

    // ========== Identity API ==========

    /// Get the operating user for submission attribution
    pub async fn me(&self) -> ClientResult<Operator> {
        let resp = self.get::<ApiResponse<Operator>>("/api/auth/me").await?;
        Self::unwrap_data(resp, "user")
    }

    // ========== Customer API ==========

    /// Search customers by tax id, phone or name fragment
    pub async fn search_customers(
        &self,
        query: &str,
        limit: u32,
    ) -> ClientResult<Vec<CustomerSummary>> {
        let path = format!(
            "/api/customers/search?q={}&limit={}",
            urlencode(query),
            limit
        );
        let resp = self.get::<ApiResponse<Vec<CustomerSummary>>>(&path).await?;
        Self::unwrap_data(resp, "customer search")
    }

    /// Create a customer record.
    ///
    /// A duplicate tax id surfaces as `ClientError::Conflict`; callers
    /// re-search instead of treating it as fatal.
    pub async fn create_customer(&self, customer: &CustomerCreate) -> ClientResult<CustomerSummary> {
        let resp = self
            .post::<ApiResponse<CustomerSummary>, _>("/api/customers", customer)
            .await?;
        Self::unwrap_data(resp, "customer")
    }

    // ========== Inventory API ==========

    /// Branch-scoped availability pre-flight (never deducts stock)
    pub async fn check_stock(&self, request: &StockCheckRequest) -> ClientResult<StockCheckResult> {
        let resp = self
            .post::<ApiResponse<StockCheckResult>, _>("/api/stock/check", request)
            .await?;
        Self::unwrap_data(resp, "stock check")
    }

    // ========== Contract API ==========

    /// Create the installment contract.
    ///
    /// Uses the long contract timeout and carries the client-generated
    /// request id so the server can reject duplicates.
    pub async fn create_contract(&self, request: &ContractRequest) -> ClientResult<ContractCreated> {
        let mut builder = self
            .client
            .post(self.url("/api/installment"))
            .timeout(self.contract_timeout)
            .header("X-Request-ID", request.request_id.clone())
            .json(request);

        if let Some(auth) = self.auth_header() {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }

        tracing::debug!(
            request_id = %request.request_id,
            branch = %request.branch_code,
            items = request.items.len(),
            "Sending contract creation request"
        );

        let response = builder.send().await.map_err(ClientError::from_reqwest)?;
        let resp: ApiResponse<ContractCreated> = Self::handle_response(response).await?;
        Self::unwrap_data(resp, "contract")
    }
}

/// Minimal percent-encoding for query values (space, reserved and
/// non-ASCII bytes)
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
