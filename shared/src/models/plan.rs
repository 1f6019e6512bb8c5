//! Installment plan model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the plan was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// Generated tier: 50% down over 12 periods
    RecommendedMinDown,
    /// Generated tier: 70% down over 9 periods (the suggested default)
    RecommendedBalanced,
    /// Generated tier: 80% down over 6 periods
    RecommendedHighDown,
    /// Operator-entered terms
    Manual,
}

/// The payment plan chosen in stage 3.
///
/// Invariants (enforced by the calculator, not here):
/// - `down_payment <= product subtotal`
/// - `credit_amount == subtotal - down_payment` within rounding tolerance
/// - `installment_amount * installment_count + down_payment >= subtotal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlan {
    pub kind: PlanKind,
    pub down_payment: Decimal,
    pub installment_count: u32,
    pub installment_amount: Decimal,
    /// Financed remainder (`subtotal - down_payment`)
    pub credit_amount: Decimal,
    /// Fixed administrative fee charged at signing
    pub doc_fee: Decimal,
    /// Whether this tier is highlighted to the operator
    #[serde(default)]
    pub recommended: bool,
}

impl InstallmentPlan {
    /// Amount due at signing (`down_payment + doc_fee`)
    pub fn signing_amount(&self) -> Decimal {
        self.down_payment + self.doc_fee
    }

    /// Total the customer repays over the schedule
    pub fn total_repayment(&self) -> Decimal {
        self.down_payment + self.installment_amount * Decimal::from(self.installment_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_amount() {
        let plan = InstallmentPlan {
            kind: PlanKind::Manual,
            down_payment: Decimal::from(5000),
            installment_count: 10,
            installment_amount: Decimal::from(2612),
            credit_amount: Decimal::from(26000),
            doc_fee: Decimal::from(120),
            recommended: false,
        };
        assert_eq!(plan.signing_amount(), Decimal::from(5120));
        assert_eq!(plan.total_repayment(), Decimal::from(31120));
    }

    #[test]
    fn test_plan_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&PlanKind::RecommendedBalanced).unwrap(),
            "\"recommended_balanced\""
        );
        assert_eq!(serde_json::to_string(&PlanKind::Manual).unwrap(), "\"manual\"");
    }
}
