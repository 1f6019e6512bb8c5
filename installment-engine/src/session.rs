//! Wizard session: the composition root
//!
//! One `WizardSession` per operator session, constructed explicitly and
//! passed by reference to whatever hosts the wizard (no global state).
//! It wires the step store, validation, calculator, identifier
//! allocator, stock validator and submission client together and exposes
//! the operations the surrounding UI calls.

use crate::calc::{self, Breakdown};
use crate::docnum::IdentifierAllocator;
use crate::kyc::{AttachmentKind, AttachmentSlot, AttachmentStore};
use crate::resolve::ResolvedField;
use crate::steps::{SessionState, Stage, StageChanged, StagePatch, StepStore};
use crate::store::{SessionStore, StoreResult};
use crate::submit::{ContractApi, CustomerApi, RetryPolicy, SubmissionClient, SubmitPhase};
use crate::stock::InventoryApi;
use crate::validation::{AdvisoryReport, ValidationEngine};
use installment_client::HttpClient;
use rust_decimal::Decimal;
use shared::error::{SubmitError, SubmitResult};
use shared::models::{InstallmentPlan, Operator, TaxInfo};
use shared::request::{
    ContractCustomer, ContractItem, ContractPayment, ContractPlan, ContractRequest,
};
use shared::response::SubmissionOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Default payment method when the operator never picked one
const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// Per-session wizard engine
pub struct WizardSession {
    store: Arc<SessionStore>,
    steps: Arc<StepStore>,
    allocator: IdentifierAllocator,
    attachments: AttachmentStore,
    submission: SubmissionClient,
    operator: Operator,
    /// At most one submission in flight; a second call is rejected, not
    /// queued, to rule out duplicate contract creation
    in_flight: AtomicBool,
}

impl WizardSession {
    /// Wire a session against the real HTTP client
    pub fn new(store: SessionStore, client: HttpClient, operator: Operator) -> StoreResult<Self> {
        let client = Arc::new(client);
        Self::with_apis(
            store,
            client.clone(),
            client.clone(),
            client,
            operator,
            RetryPolicy::contract_default(),
        )
    }

    /// Wire a session against explicit collaborator implementations
    /// (dependency injection; this is also what tests use)
    pub fn with_apis(
        store: SessionStore,
        contracts: Arc<dyn ContractApi>,
        customers: Arc<dyn CustomerApi>,
        inventory: Arc<dyn InventoryApi>,
        operator: Operator,
        policy: RetryPolicy,
    ) -> StoreResult<Self> {
        let store = Arc::new(store);
        let steps = Arc::new(StepStore::load(store.clone())?);
        let allocator = IdentifierAllocator::new(store.clone());
        let attachments = AttachmentStore::new(store.clone());
        let submission = SubmissionClient::new(
            contracts,
            customers,
            inventory,
            allocator.clone(),
            steps.clone(),
            policy,
        );

        Ok(Self {
            store,
            steps,
            allocator,
            attachments,
            submission,
            operator,
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    // ========== Stage access ==========

    pub fn steps(&self) -> &Arc<StepStore> {
        &self.steps
    }

    /// Shallow-merge an update into its stage (persists, then notifies)
    pub fn update_stage(&self, patch: StagePatch) -> StoreResult<()> {
        self.steps.update(patch)
    }

    /// Advisory validation for UI hints; never blocks navigation
    pub fn validate_stage(&self, stage: Stage) -> StoreResult<AdvisoryReport> {
        ValidationEngine::validate(&self.steps, stage)
    }

    /// Human-readable messages for the stage, without blocking
    pub fn stage_errors(&self, stage: Stage) -> StoreResult<Vec<String>> {
        ValidationEngine::errors(&self.steps, stage)
    }

    pub fn mark_complete(&self, stage: Stage) -> StoreResult<bool> {
        self.steps.mark_complete(stage)
    }

    pub fn is_complete(&self, stage: Stage) -> bool {
        self.steps.is_complete(stage)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StageChanged> {
        self.steps.subscribe()
    }

    pub fn progress_percentage(&self) -> u8 {
        self.steps.progress_percentage()
    }

    pub fn next_stage(&self) -> Stage {
        self.steps.next_stage()
    }

    // ========== Attachments ==========

    pub fn set_attachment(&self, kind: AttachmentKind, slot: &AttachmentSlot) -> StoreResult<()> {
        self.attachments.put(kind, slot)
    }

    /// Resolve an attachment: remote URL, then inline fallback, then the
    /// UI-held value
    pub fn attachment(
        &self,
        kind: AttachmentKind,
        ui_value: Option<String>,
    ) -> StoreResult<ResolvedField<String>> {
        self.attachments.resolve(kind, ui_value)
    }

    // ========== Financials ==========

    /// Generated plan tiers for the current cart
    pub fn recommended_plans(&self, doc_fee: Decimal) -> Vec<InstallmentPlan> {
        let subtotal = calc::item_subtotal(&self.steps.stage1().cart_items);
        calc::recommended_plans(subtotal, doc_fee)
    }

    /// VAT figures for the signing-day receipt of the chosen plan
    pub fn signing_tax_info(&self) -> SubmitResult<TaxInfo> {
        let stage3 = self.steps.stage3();
        let plan = stage3
            .plan
            .as_ref()
            .ok_or_else(|| SubmitError::Validation(vec!["กรุณาเลือกแผนการชำระเงิน".to_string()]))?;
        Ok(calc::tax_info(plan.down_payment, plan.doc_fee, stage3.tax_mode))
    }

    /// Breakdown for the current cart and chosen plan
    pub fn compute_breakdown(&self) -> SubmitResult<Breakdown> {
        let stage1 = self.steps.stage1();
        let stage3 = self.steps.stage3();
        let plan = stage3
            .plan
            .as_ref()
            .ok_or_else(|| SubmitError::Validation(vec!["กรุณาเลือกแผนการชำระเงิน".to_string()]))?;
        Ok(calc::compute_breakdown(
            &stage1.cart_items,
            plan,
            stage3.tax_mode,
            stage3.contract_vat,
        ))
    }

    // ========== Submission ==========

    /// Assemble the contract-creation payload from the stage records
    pub fn build_contract_request(&self) -> SubmitResult<ContractRequest> {
        let stage1 = self.steps.stage1();
        let stage2 = self.steps.stage2();
        let stage3 = self.steps.stage3();

        let mut missing = Vec::new();
        if stage1.cart_items.is_empty() {
            missing.push("กรุณาเลือกสินค้าผ่อนอย่างน้อย 1 รายการ".to_string());
        }
        let customer = match stage2.customer {
            Some(customer) => Some(customer),
            None => {
                missing.push("กรุณากรอกข้อมูลลูกค้า".to_string());
                None
            }
        };
        let plan = match stage3.plan {
            Some(plan) => Some(plan),
            None => {
                missing.push("กรุณาเลือกแผนการชำระเงิน".to_string());
                None
            }
        };
        if !missing.is_empty() {
            return Err(SubmitError::Validation(missing));
        }
        let (customer, plan) = (customer.expect("checked"), plan.expect("checked"));

        let breakdown = calc::compute_breakdown(
            &stage1.cart_items,
            &plan,
            stage3.tax_mode,
            stage3.contract_vat,
        );

        let branch_code = stage1
            .branch_code
            .clone()
            .unwrap_or_else(|| self.operator.branch_code.clone());

        let items = stage1
            .cart_items
            .iter()
            .map(|item| ContractItem {
                product_id: item.product_ref.clone(),
                name: item.name.clone(),
                price: item.unit_price,
                quantity: item.quantity,
                serial_or_imei: item.serial_or_imei.clone(),
            })
            .collect();

        Ok(ContractRequest {
            items,
            customer: ContractCustomer {
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                phone: customer.phone.clone(),
                tax_id: customer.national_id.as_ref().map(|id| id.as_str().to_string()),
                address: customer.address.clone(),
                full_address: customer.mailing_address().thai_line(),
            },
            customer_id: None,
            branch_code,
            installment_plan: ContractPlan {
                kind: plan.kind,
                down_payment: plan.down_payment,
                installment_period: plan.installment_count,
                installment_amount: plan.installment_amount,
                total_amount: breakdown.total_amount,
            },
            payment: ContractPayment {
                method: stage3
                    .payment_method
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
                down_payment: plan.down_payment,
                doc_fee: plan.doc_fee,
            },
            customer_type: "individual".to_string(),
            salesperson: Some(self.operator.id.clone()),
            salesperson_name: Some(self.operator.name.clone()),
            request_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Current submission phase, for progress display
    pub fn submit_phase(&self) -> SubmitPhase {
        self.submission.phase()
    }

    /// Run the terminal submission. A second call while one attempt is
    /// outstanding is rejected with [`SubmitError::InFlight`].
    pub async fn submit(&self) -> SubmitResult<SubmissionOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SubmitError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let request = self.build_contract_request()?;
        self.submission.submit(request).await
    }

    // ========== Reset / backup ==========

    /// Tear all four stages down, along with mirrors, attachments and
    /// any provisional document number
    pub fn clear(&self) -> StoreResult<()> {
        self.steps.clear()?;
        self.attachments.clear()?;
        self.allocator.discard()?;
        Ok(())
    }

    /// Snapshot the session for support tooling
    pub fn export_data(&self) -> SessionState {
        self.steps.export_data()
    }

    /// Restore a previously exported session
    pub fn import_data(&self, state: SessionState) -> StoreResult<()> {
        self.steps.import_data(state)
    }

    /// The underlying store (read access for host diagnostics)
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}

impl std::fmt::Debug for WizardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardSession")
            .field("operator", &self.operator.id)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag when the submission future settles,
/// including on panic or cancellation
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
