//! Tax mode and computed tax info

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How VAT applies to the signing-day receipt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxMode {
    /// No VAT on the receipt
    #[default]
    None,
    /// VAT already contained in the amount (`vat = base - base / 1.07`)
    Inclusive,
    /// VAT added on top (`vat = base * 0.07`)
    Exclusive,
}

/// Computed VAT figures for the signing-day receipt.
///
/// The base is `down_payment + doc_fee` (what changes hands at signing),
/// not the full contract value. The full schedule is invoiced separately
/// by the server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxInfo {
    pub tax_mode: TaxMode,
    pub vat_amount: Decimal,
    pub before_tax_amount: Decimal,
    pub base_amount: Decimal,
}
