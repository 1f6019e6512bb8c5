//! HTTP client for the installment wizard collaborator services
//!
//! Thin reqwest wrapper that attaches the caller-supplied bearer token,
//! classifies every non-success response exactly once, and exposes typed
//! methods for the endpoints the wizard consumes (identity, customer
//! search/create, branch stock check, contract creation).

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
