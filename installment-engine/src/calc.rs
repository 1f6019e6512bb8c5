//! Financial breakdown calculations
//!
//! Pure decimal arithmetic; no I/O and no hidden state. All monetary
//! results are rounded to 2 decimal places, half-up.
//!
//! VAT is computed only over `down_payment + doc_fee` (the signing-day
//! receipt), never over the full contract value. The full schedule is
//! invoiced server-side.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::models::{CartItem, InstallmentPlan, PlanKind, TaxInfo, TaxMode};
use thiserror::Error;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Tolerance for the credit-amount invariant (one currency unit, since
/// credit is routinely entered in whole baht)
pub const CREDIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 0);

/// Statutory ceiling for the implied interest over the schedule (36%)
const MAX_IMPLIED_INTEREST: Decimal = Decimal::from_parts(36, 0, 0, false, 2);

/// Standard VAT rate (7%)
const VAT_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// Divisor for extracting VAT from an inclusive amount (1.07)
const VAT_DIVISOR: Decimal = Decimal::from_parts(107, 0, 0, false, 2);

/// Round to 2 decimal places, half-up
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// The verified breakdown produced from a cart and a chosen plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    /// Product lines only; fee lines are never part of this sum
    pub item_subtotal: Decimal,
    pub doc_fee: Decimal,
    /// `item_subtotal + doc_fee`
    pub sub_total: Decimal,
    /// VAT over the signing-day base (`down_payment + doc_fee`)
    pub vat_amount: Decimal,
    /// Full contract value
    pub total_amount: Decimal,
    /// Amount due at signing, before receipt VAT
    pub down_payment_with_fee: Decimal,
}

/// Plan validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("down payment {down} exceeds product subtotal {subtotal}")]
    DownPaymentExceedsSubtotal { down: Decimal, subtotal: Decimal },

    #[error("credit amount {credit} does not match subtotal {subtotal} minus down payment {down}")]
    CreditMismatch { credit: Decimal, subtotal: Decimal, down: Decimal },

    /// Financing can never imply the lender pays the customer
    #[error("schedule implies negative interest: repayment {repayment} below subtotal {subtotal}")]
    NegativeImpliedInterest { repayment: Decimal, subtotal: Decimal },

    #[error("installment plan has non-positive terms")]
    InvalidTerms,
}

/// Sum of the product lines (`unit_price * quantity`), rounded
pub fn item_subtotal(items: &[CartItem]) -> Decimal {
    round_money(items.iter().map(CartItem::line_total).sum())
}

/// VAT over a signing-day base for the given mode.
///
/// Inclusive mode extracts the VAT already contained in the amount
/// (`base - base / 1.07`); exclusive adds it on top (`base * 0.07`).
pub fn vat_over_base(base: Decimal, mode: TaxMode) -> Decimal {
    match mode {
        TaxMode::None => Decimal::ZERO,
        TaxMode::Inclusive => round_money(base - base / VAT_DIVISOR),
        TaxMode::Exclusive => round_money(base * VAT_RATE),
    }
}

/// Full tax figures for the signing-day receipt
pub fn tax_info(down_payment: Decimal, doc_fee: Decimal, mode: TaxMode) -> TaxInfo {
    let base = down_payment + doc_fee;
    let vat = vat_over_base(base, mode);
    let before_tax = match mode {
        TaxMode::Inclusive => base - vat,
        TaxMode::None | TaxMode::Exclusive => base,
    };
    TaxInfo {
        tax_mode: mode,
        vat_amount: vat,
        before_tax_amount: before_tax,
        base_amount: base,
    }
}

/// Compute the breakdown for a cart and chosen plan.
///
/// `contract_vat` is caller-supplied: only when the overall contract is
/// VAT-bearing (not just the signing receipt) does exclusive VAT enter
/// the full contract value. Inclusive VAT is already contained in the
/// prices, so the total never changes for it.
pub fn compute_breakdown(
    items: &[CartItem],
    plan: &InstallmentPlan,
    tax_mode: TaxMode,
    contract_vat: bool,
) -> Breakdown {
    let item_subtotal = item_subtotal(items);
    let doc_fee = plan.doc_fee;
    let sub_total = item_subtotal + doc_fee;
    let down_payment_with_fee = plan.down_payment + doc_fee;
    let vat_amount = vat_over_base(down_payment_with_fee, tax_mode);

    let total_amount = if contract_vat && tax_mode == TaxMode::Exclusive {
        sub_total + vat_amount
    } else {
        sub_total
    };

    Breakdown {
        item_subtotal,
        doc_fee,
        sub_total,
        vat_amount,
        total_amount,
        down_payment_with_fee,
    }
}

/// Enforce the plan invariants against the cart.
///
/// Hard violations come back as `CalcError` (inputs are rejected, never
/// clamped). An implied interest rate above the statutory ceiling is
/// only a warning, returned for UI display.
pub fn validate_breakdown(
    items: &[CartItem],
    plan: &InstallmentPlan,
) -> Result<Vec<String>, CalcError> {
    if plan.installment_count == 0
        || plan.installment_amount <= Decimal::ZERO
        || plan.down_payment < Decimal::ZERO
        || plan.doc_fee < Decimal::ZERO
    {
        return Err(CalcError::InvalidTerms);
    }

    let subtotal = item_subtotal(items);

    if plan.down_payment > subtotal {
        return Err(CalcError::DownPaymentExceedsSubtotal {
            down: plan.down_payment,
            subtotal,
        });
    }

    let expected_credit = subtotal - plan.down_payment;
    if (plan.credit_amount - expected_credit).abs() > CREDIT_TOLERANCE {
        return Err(CalcError::CreditMismatch {
            credit: plan.credit_amount,
            subtotal,
            down: plan.down_payment,
        });
    }

    let repayment = plan.total_repayment();
    if repayment + MONEY_TOLERANCE < subtotal {
        return Err(CalcError::NegativeImpliedInterest { repayment, subtotal });
    }

    let mut warnings = Vec::new();
    if expected_credit > Decimal::ZERO {
        let implied = (repayment - subtotal) / expected_credit;
        if implied > MAX_IMPLIED_INTEREST {
            warnings.push(format!(
                "อัตราดอกเบี้ยโดยนัย {:.1}% เกินเพดาน 36%",
                implied * Decimal::from(100)
            ));
        }
    }

    Ok(warnings)
}

/// The three generated plan tiers offered before manual entry:
/// 50% down over 12 periods, 70% over 9 (the suggested default),
/// 80% over 6. Installments spread the credit plus the document fee.
pub fn recommended_plans(subtotal: Decimal, doc_fee: Decimal) -> Vec<InstallmentPlan> {
    const TIERS: [(PlanKind, u32, u32, bool); 3] = [
        (PlanKind::RecommendedMinDown, 50, 12, false),
        (PlanKind::RecommendedBalanced, 70, 9, true),
        (PlanKind::RecommendedHighDown, 80, 6, false),
    ];

    TIERS
        .into_iter()
        .map(|(kind, down_pct, periods, recommended)| {
            let down = round_money(subtotal * Decimal::from(down_pct) / Decimal::from(100));
            let credit = subtotal - down;
            let installment = round_money((credit + doc_fee) / Decimal::from(periods));
            InstallmentPlan {
                kind,
                down_payment: down,
                installment_count: periods,
                installment_amount: installment,
                credit_amount: credit,
                doc_fee,
                recommended,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(price: &str, qty: u32) -> CartItem {
        CartItem {
            product_ref: "p1".to_string(),
            name: "Phone".to_string(),
            unit_price: dec(price),
            quantity: qty,
            serial_or_imei: None,
            branch_code: "00001".to_string(),
            has_vat: false,
            vat_rate: Decimal::ZERO,
        }
    }

    fn plan(down: &str, count: u32, amount: &str, credit: &str, fee: &str) -> InstallmentPlan {
        InstallmentPlan {
            kind: PlanKind::Manual,
            down_payment: dec(down),
            installment_count: count,
            installment_amount: dec(amount),
            credit_amount: dec(credit),
            doc_fee: dec(fee),
            recommended: false,
        }
    }

    #[test]
    fn test_exclusive_vat_example() {
        // cart 31000x1, fee 120, down 5000: base 5120, vat 5120 * 0.07
        let p = plan("5000", 12, "2200", "26000", "120");
        let b = compute_breakdown(&[item("31000", 1)], &p, TaxMode::Exclusive, false);
        assert_eq!(b.item_subtotal, dec("31000"));
        assert_eq!(b.sub_total, dec("31120"));
        assert_eq!(b.down_payment_with_fee, dec("5120"));
        assert_eq!(b.vat_amount, dec("358.40"));
    }

    #[test]
    fn test_inclusive_vat_example() {
        // same base 5120: vat = 5120 - 5120 / 1.07
        let p = plan("5000", 12, "2200", "26000", "120");
        let b = compute_breakdown(&[item("31000", 1)], &p, TaxMode::Inclusive, false);
        assert_eq!(b.vat_amount, dec("334.95"));
    }

    #[test]
    fn test_none_mode_zero_vat() {
        let p = plan("5000", 12, "2200", "26000", "120");
        let b = compute_breakdown(&[item("31000", 1)], &p, TaxMode::None, false);
        assert_eq!(b.vat_amount, Decimal::ZERO);
        assert_eq!(b.total_amount, b.sub_total);
    }

    #[test]
    fn test_fee_excluded_from_item_subtotal() {
        let p = plan("5000", 12, "2200", "26000", "500");
        let items = [item("31000", 1), item("250.50", 2)];
        let b = compute_breakdown(&items, &p, TaxMode::None, false);
        assert_eq!(b.item_subtotal, dec("31501.00"));
        // sub_total - item_subtotal == doc_fee exactly
        assert_eq!(b.sub_total - b.item_subtotal, b.doc_fee);
    }

    #[test]
    fn test_vat_idempotent() {
        let base = dec("5120");
        let first = vat_over_base(base, TaxMode::Inclusive);
        let second = vat_over_base(base, TaxMode::Inclusive);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tax_info_inclusive_components() {
        let info = tax_info(dec("5000"), dec("120"), TaxMode::Inclusive);
        assert_eq!(info.base_amount, dec("5120"));
        assert_eq!(info.vat_amount, dec("334.95"));
        assert_eq!(info.before_tax_amount, dec("4785.05"));
    }

    #[test]
    fn test_down_payment_exceeding_subtotal_rejected() {
        // down 40000 against 31000 must be rejected, not clamped
        let p = plan("40000", 12, "100", "0", "0");
        let err = validate_breakdown(&[item("31000", 1)], &p).unwrap_err();
        assert_eq!(
            err,
            CalcError::DownPaymentExceedsSubtotal {
                down: dec("40000"),
                subtotal: dec("31000"),
            }
        );
    }

    #[test]
    fn test_credit_mismatch_rejected() {
        let p = plan("5000", 12, "2200", "20000", "120");
        let err = validate_breakdown(&[item("31000", 1)], &p).unwrap_err();
        assert!(matches!(err, CalcError::CreditMismatch { .. }));
    }

    #[test]
    fn test_credit_within_unit_tolerance_accepted() {
        // 25999.50 vs expected 26000: inside the one-unit tolerance
        let p = plan("5000", 12, "2200", "25999.50", "120");
        assert!(validate_breakdown(&[item("31000", 1)], &p).is_ok());
    }

    #[test]
    fn test_negative_implied_interest_rejected() {
        // 5000 + 12 * 2000 = 29000 < 31000
        let p = plan("5000", 12, "2000", "26000", "120");
        let err = validate_breakdown(&[item("31000", 1)], &p).unwrap_err();
        assert!(matches!(err, CalcError::NegativeImpliedInterest { .. }));
    }

    #[test]
    fn test_interest_above_ceiling_warns() {
        // repayment 5000 + 12 * 3000 = 41000; interest 10000 over credit
        // 26000 is ~38.5%
        let p = plan("5000", 12, "3000", "26000", "0");
        let warnings = validate_breakdown(&[item("31000", 1)], &p).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("36%"));
    }

    #[test]
    fn test_reasonable_interest_no_warning() {
        // repayment 5000 + 12 * 2300 = 32600; interest 1600 / 26000 ≈ 6.2%
        let p = plan("5000", 12, "2300", "26000", "0");
        assert!(validate_breakdown(&[item("31000", 1)], &p).unwrap().is_empty());
    }

    #[test]
    fn test_zero_count_rejected() {
        let p = plan("5000", 0, "2300", "26000", "0");
        assert_eq!(
            validate_breakdown(&[item("31000", 1)], &p).unwrap_err(),
            CalcError::InvalidTerms
        );
    }

    #[test]
    fn test_recommended_tiers() {
        let plans = recommended_plans(dec("27300"), dec("500"));
        assert_eq!(plans.len(), 3);

        let min_down = &plans[0];
        assert_eq!(min_down.kind, PlanKind::RecommendedMinDown);
        assert_eq!(min_down.down_payment, dec("13650.00"));
        assert_eq!(min_down.credit_amount, dec("13650.00"));
        assert_eq!(min_down.installment_count, 12);
        // (13650 + 500) / 12 = 1179.17 (half-up)
        assert_eq!(min_down.installment_amount, dec("1179.17"));

        let balanced = &plans[1];
        assert!(balanced.recommended);
        assert_eq!(balanced.down_payment, dec("19110.00"));
        assert_eq!(balanced.installment_count, 9);

        let high = &plans[2];
        assert_eq!(high.down_payment, dec("21840.00"));
        assert_eq!(high.installment_count, 6);
    }

    #[test]
    fn test_recommended_plans_pass_validation() {
        let items = [item("27300", 1)];
        for plan in recommended_plans(dec("27300"), dec("500")) {
            validate_breakdown(&items, &plan).unwrap();
        }
    }
}
