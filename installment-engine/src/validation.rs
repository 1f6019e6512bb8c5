//! Declarative per-stage validation
//!
//! One rule table per stage, evaluated against the stage's JSON payload.
//! Two result types keep the product behavior honest:
//!
//! - [`AdvisoryReport`] never blocks. Operators must be able to save
//!   partial work and come back, so stage navigation only ever gets
//!   advisory results.
//! - [`StrictReport`] blocks. It is consulted in exactly one place:
//!   immediately before submission.

use crate::steps::{Stage, StepStore};
use crate::store::StoreResult;
use regex::Regex;
use serde_json::Value;

/// A single declarative rule against a dotted path in the stage payload
#[derive(Debug, Clone)]
pub struct Rule {
    /// Dotted path into the stage payload (e.g. `customer.phone`)
    pub field: &'static str,
    pub required: bool,
    pub pattern: Option<&'static str>,
    pub min: Option<f64>,
    pub min_length: Option<usize>,
    /// Operator-facing message when the rule fails
    pub message: &'static str,
}

impl Rule {
    const fn required(field: &'static str, message: &'static str) -> Self {
        Self { field, required: true, pattern: None, min: None, min_length: None, message }
    }

    const fn with_pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    const fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    const fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }
}

const STAGE1_RULES: &[Rule] = &[
    Rule::required("cartItems", "กรุณาเลือกสินค้าผ่อนอย่างน้อย 1 รายการ").with_min_length(1),
    Rule::required("branchCode", "กรุณาเลือกสาขาที่ทำรายการ"),
];

const STAGE2_RULES: &[Rule] = &[
    Rule::required("customer", "กรุณากรอกข้อมูลลูกค้า"),
    Rule::required("customer.firstName", "กรุณากรอกชื่อลูกค้า"),
    Rule::required("customer.lastName", "กรุณากรอกนามสกุลลูกค้า"),
    Rule::required("customer.phone", "กรุณากรอกเบอร์โทรศัพท์")
        .with_pattern(r"^0[0-9]{8,9}$"),
    Rule {
        field: "customer.nationalId",
        required: false,
        pattern: Some(r"^[0-9]{13}$"),
        min: None,
        min_length: None,
        message: "เลขบัตรประชาชนไม่ครบ 13 หลัก",
    },
];

const STAGE3_RULES: &[Rule] = &[
    Rule::required("plan", "กรุณาเลือกแผนการชำระเงิน"),
    Rule::required("plan.downPayment", "ยอดดาวน์ต้องไม่ติดลบ").with_min(0.0),
    Rule::required("plan.installmentCount", "จำนวนงวดต้องมากกว่า 0").with_min(1.0),
];

const STAGE4_RULES: &[Rule] = &[];

/// Advisory result: problems are reported, progression is never blocked
#[derive(Debug, Clone, Default)]
pub struct AdvisoryReport {
    pub warnings: Vec<String>,
}

impl AdvisoryReport {
    /// Always true; advisory validation exists for UI hints only
    pub fn passable(&self) -> bool {
        true
    }
}

/// Strict result: any error blocks submission
#[derive(Debug, Clone, Default)]
pub struct StrictReport {
    pub errors: Vec<String>,
}

impl StrictReport {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-stage rule evaluation
#[derive(Debug, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn rules_for(stage: Stage) -> &'static [Rule] {
        match stage {
            Stage::ProductSelection => STAGE1_RULES,
            Stage::CustomerInfo => STAGE2_RULES,
            Stage::PaymentPlan => STAGE3_RULES,
            Stage::Finalization => STAGE4_RULES,
        }
    }

    /// Evaluate every rule for the stage; violations become warnings
    pub fn validate(steps: &StepStore, stage: Stage) -> StoreResult<AdvisoryReport> {
        let violations = Self::evaluate(steps, stage)?;
        for message in &violations {
            tracing::warn!(stage = stage.number(), %message, "advisory validation warning");
        }
        Ok(AdvisoryReport { warnings: violations })
    }

    /// Human-readable messages for UI display, without blocking anything
    pub fn errors(steps: &StepStore, stage: Stage) -> StoreResult<Vec<String>> {
        Self::evaluate(steps, stage)
    }

    /// The blocking variant used immediately before submission
    pub fn validate_strict(steps: &StepStore, stage: Stage) -> StoreResult<StrictReport> {
        Ok(StrictReport { errors: Self::evaluate(steps, stage)? })
    }

    fn evaluate(steps: &StepStore, stage: Stage) -> StoreResult<Vec<String>> {
        let payload = steps.payload_json(stage)?;
        let mut violations = Vec::new();

        for rule in Self::rules_for(stage) {
            if let Some(message) = check_rule(rule, &payload) {
                violations.push(message.to_string());
            }
        }
        Ok(violations)
    }
}

/// Evaluate one rule; returns the message on violation
fn check_rule(rule: &Rule, payload: &Value) -> Option<&'static str> {
    let value = lookup(payload, rule.field);

    let present = match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    };

    if !present {
        return rule.required.then_some(rule.message);
    }
    let value = value.expect("present implies Some");

    if let Some(min_length) = rule.min_length {
        let len = match value {
            Value::Array(a) => a.len(),
            Value::String(s) => s.chars().count(),
            _ => 0,
        };
        if len < min_length {
            return Some(rule.message);
        }
    }

    if let Some(min) = rule.min {
        if let Some(n) = value.as_f64() {
            if n < min {
                return Some(rule.message);
            }
        }
    }

    if let Some(pattern) = rule.pattern {
        if let Value::String(s) = value {
            let re = Regex::new(pattern).expect("rule patterns are static and valid");
            if !re.is_match(s) {
                return Some(rule.message);
            }
        }
    }

    None
}

/// Dotted-path lookup into a JSON payload
fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{Stage1Patch, Stage2Patch, Stage3Patch, StagePatch};
    use crate::store::SessionStore;
    use rust_decimal::Decimal;
    use shared::models::{CartItem, CustomerRecord, InstallmentPlan, NationalId, PlanKind};
    use std::sync::Arc;

    fn steps() -> StepStore {
        StepStore::load(Arc::new(SessionStore::open_in_memory().unwrap())).unwrap()
    }

    fn cart_item() -> CartItem {
        CartItem {
            product_ref: "p1".to_string(),
            name: "Phone".to_string(),
            unit_price: Decimal::from(31000),
            quantity: 1,
            serial_or_imei: None,
            branch_code: "00001".to_string(),
            has_vat: false,
            vat_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_empty_stage1_warns_but_passes() {
        let steps = steps();
        let report = ValidationEngine::validate(&steps, Stage::ProductSelection).unwrap();
        assert!(report.passable());
        assert!(report.warnings.contains(&"กรุณาเลือกสินค้าผ่อนอย่างน้อย 1 รายการ".to_string()));
    }

    #[test]
    fn test_populated_stage1_clean() {
        let steps = steps();
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item()]),
                branch_code: Some("00001".to_string()),
            }))
            .unwrap();
        let report = ValidationEngine::validate(&steps, Stage::ProductSelection).unwrap();
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_strict_blocks_where_advisory_does_not() {
        let steps = steps();
        let advisory = ValidationEngine::validate(&steps, Stage::CustomerInfo).unwrap();
        assert!(advisory.passable());
        let strict = ValidationEngine::validate_strict(&steps, Stage::CustomerInfo).unwrap();
        assert!(!strict.ok());
    }

    #[test]
    fn test_phone_pattern() {
        let steps = steps();
        steps
            .update(StagePatch::Customer(Stage2Patch {
                customer: Some(CustomerRecord {
                    first_name: "สมชาย".to_string(),
                    last_name: "ใจดี".to_string(),
                    phone: "12345".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }))
            .unwrap();
        let errors = ValidationEngine::errors(&steps, Stage::CustomerInfo).unwrap();
        assert!(errors.contains(&"กรุณากรอกเบอร์โทรศัพท์".to_string()));
    }

    #[test]
    fn test_valid_customer_clean() {
        let steps = steps();
        steps
            .update(StagePatch::Customer(Stage2Patch {
                customer: Some(CustomerRecord {
                    first_name: "สมชาย".to_string(),
                    last_name: "ใจดี".to_string(),
                    phone: "0812345678".to_string(),
                    national_id: Some(NationalId::parse("1941001330617").unwrap()),
                    ..Default::default()
                }),
                ..Default::default()
            }))
            .unwrap();
        let errors = ValidationEngine::errors(&steps, Stage::CustomerInfo).unwrap();
        assert!(errors.is_empty(), "unexpected: {errors:?}");
    }

    #[test]
    fn test_stage3_plan_required() {
        let steps = steps();
        let errors = ValidationEngine::errors(&steps, Stage::PaymentPlan).unwrap();
        assert!(errors.contains(&"กรุณาเลือกแผนการชำระเงิน".to_string()));

        steps
            .update(StagePatch::Plan(Stage3Patch {
                plan: Some(InstallmentPlan {
                    kind: PlanKind::Manual,
                    down_payment: Decimal::from(5000),
                    installment_count: 10,
                    installment_amount: Decimal::from(2612),
                    credit_amount: Decimal::from(26000),
                    doc_fee: Decimal::from(120),
                    recommended: false,
                }),
                ..Default::default()
            }))
            .unwrap();
        let errors = ValidationEngine::errors(&steps, Stage::PaymentPlan).unwrap();
        assert!(errors.is_empty(), "unexpected: {errors:?}");
    }

    #[test]
    fn test_stage4_has_no_rules() {
        let steps = steps();
        assert!(ValidationEngine::rules_for(Stage::Finalization).is_empty());
        let report = ValidationEngine::validate(&steps, Stage::Finalization).unwrap();
        assert!(report.warnings.is_empty());
    }
}
