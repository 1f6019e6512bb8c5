//! API response types
//!
//! Standardized envelope plus the typed payloads the wizard consumes.

use serde::{Deserialize, Serialize};

/// Standard API response code
pub const API_CODE_SUCCESS: &str = "E0000";

/// Unified API response structure
///
/// All collaborator responses follow this format:
/// ```json
/// {
///     "code": "E0000",
///     "message": "Success",
///     "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (E0000 = success, others = error codes)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Whether the envelope signals success
    pub fn is_success(&self) -> bool {
        self.code == API_CODE_SUCCESS
    }
}

/// Customer summary returned by `GET /api/customers/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

/// Per-item result of a branch stock check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItemResult {
    pub product_id: String,
    #[serde(default)]
    pub imei: Option<String>,
    pub available: bool,
    /// Branch the unit is actually recorded in, when known
    #[serde(default)]
    pub recorded_branch: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of `POST /api/stock/check`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckResult {
    pub results: Vec<StockItemResult>,
}

/// Document numbers issued by contract creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCreated {
    pub quotation_no: String,
    pub contract_no: String,
    pub invoice_no: String,
}

/// Server-side stock deduction performed with the contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOutcome {
    pub deducted: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Terminal result of a successful submission. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub quotation_no: String,
    pub contract_no: String,
    pub invoice_no: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_outcome: Option<StockOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let resp = ApiResponse::ok(42u32);
        assert!(resp.is_success());
        let err: ApiResponse<u32> = ApiResponse::error("E0002", "Validation failed");
        assert!(!err.is_success());
        assert!(err.data.is_none());
    }

    #[test]
    fn test_outcome_round_trip() {
        let outcome = SubmissionOutcome {
            quotation_no: "QT-690806-123".to_string(),
            contract_no: "CT-690806-123".to_string(),
            invoice_no: "IV-690806-123".to_string(),
            success: true,
            stock_outcome: None,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"quotationNo\""));
        let back: SubmissionOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quotation_no, outcome.quotation_no);
    }
}
