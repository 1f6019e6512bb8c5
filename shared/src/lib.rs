//! Shared types for the installment wizard engine
//!
//! Domain models, the submission error taxonomy, and the wire
//! request/response types used by both the engine and the HTTP client.

pub mod error;
pub mod models;
pub mod request;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{SubmitError, SubmitResult};
pub use models::{
    Address, CartItem, CustomerRecord, InstallmentPlan, NationalId, NationalIdError, Operator,
    PlanKind, TaxInfo, TaxMode,
};
pub use request::{ContractRequest, CustomerCreate, StockCheckRequest};
pub use response::{ApiResponse, ContractCreated, CustomerSummary, StockCheckResult, SubmissionOutcome};
