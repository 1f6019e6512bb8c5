//! Outbound request payloads
//!
//! Shapes accepted by the collaborator services. Field names follow the
//! document-store backend (camelCase).

use crate::models::{Address, PlanKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of the contract-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractItem {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_or_imei: Option<String>,
}

/// Customer block of the contract-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCustomer {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    pub address: Address,
    /// Pre-rendered single-line address for documents
    pub full_address: String,
}

/// Plan block of the contract-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPlan {
    #[serde(rename = "type")]
    pub kind: PlanKind,
    pub down_payment: Decimal,
    pub installment_period: u32,
    pub installment_amount: Decimal,
    pub total_amount: Decimal,
}

/// Payment block: what changes hands at signing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPayment {
    pub method: String,
    pub down_payment: Decimal,
    pub doc_fee: Decimal,
}

/// The contract-creation request (`POST /api/installment`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRequest {
    pub items: Vec<ContractItem>,
    pub customer: ContractCustomer,
    /// Server-side customer document id once found or created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub branch_code: String,
    pub installment_plan: ContractPlan,
    pub payment: ContractPayment,
    pub customer_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson_name: Option<String>,
    /// Client-generated id so the server can reject duplicate submissions
    pub request_id: String,
}

/// One line of a branch stock check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
}

/// Branch-scoped availability check (`POST /api/stock/check`).
///
/// `check_only` must stay true on the pre-flight path; stock is deducted
/// server-side as part of contract creation, never by the wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckRequest {
    pub branch_code: String,
    pub check_only: bool,
    pub items: Vec<StockCheckItem>,
}

/// Individual-customer fields for customer creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualCustomer {
    #[serde(default)]
    pub prefix: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    /// Single-line rendering; the CRM stores addresses denormalized
    pub address: String,
}

/// Customer creation request (`POST /api/customers`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreate {
    pub customer_type: String,
    pub individual: IndividualCustomer,
    pub branch_code: String,
    pub status: String,
}
