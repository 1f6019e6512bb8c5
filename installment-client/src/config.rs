//! Client configuration

/// Client configuration for the back-office API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Bearer token supplied by the surrounding application.
    /// The wizard never acquires tokens itself.
    pub token: Option<String>,

    /// Default request timeout in seconds
    pub timeout: u64,

    /// Contract-creation timeout in seconds. Contract creation cascades
    /// into several downstream writes server-side, so it gets a much
    /// longer bound than ordinary lookups.
    pub contract_timeout: u64,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
            contract_timeout: 120,
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the default request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the contract-creation timeout
    pub fn with_contract_timeout(mut self, seconds: u64) -> Self {
        self.contract_timeout = seconds;
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> super::HttpClient {
        super::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
