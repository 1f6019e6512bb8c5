//! Four-stage wizard state
//!
//! One [`StageRecord`] per stage, held in memory behind a lock and
//! persisted as a single session document on every update. Updates are
//! shallow merges (last write wins per field). Navigation is advisory:
//! nothing here ever blocks moving between stages.
//!
//! # Update flow
//!
//! ```text
//! update(patch)
//!     ├─ 1. Apply patch to the in-memory stage record
//!     ├─ 2. Re-derive completion flags from the data
//!     ├─ 3. Persist the session document (commit before anything else)
//!     ├─ 4. Write legacy cart mirrors (stage 1 only)
//!     └─ 5. Broadcast StageChanged
//! ```
//!
//! Observers therefore never see a notification for state that is not
//! yet durable.

use crate::store::{
    LEGACY_CART_DATA_KEY, LEGACY_CART_ITEMS_KEY, SESSION_KEY, SessionStore, StoreResult,
};
use crate::resolve::FieldResolver;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::{CartItem, CustomerRecord, InstallmentPlan, TaxMode};
use shared::response::SubmissionOutcome;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Stage-change channel capacity; lagging subscribers drop oldest
const STAGE_CHANNEL_CAPACITY: usize = 64;

/// The four sequential data-collection phases of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    ProductSelection,
    CustomerInfo,
    PaymentPlan,
    Finalization,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::ProductSelection,
        Stage::CustomerInfo,
        Stage::PaymentPlan,
        Stage::Finalization,
    ];

    /// 1-based stage number as shown to the operator
    pub fn number(self) -> u8 {
        match self {
            Stage::ProductSelection => 1,
            Stage::CustomerInfo => 2,
            Stage::PaymentPlan => 3,
            Stage::Finalization => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        match n {
            1 => Some(Stage::ProductSelection),
            2 => Some(Stage::CustomerInfo),
            3 => Some(Stage::PaymentPlan),
            4 => Some(Stage::Finalization),
            _ => None,
        }
    }
}

/// Stage-1 payload: what is being bought, and where
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage1Data {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    /// Branch the session is scoped to
    #[serde(default)]
    pub branch_code: Option<String>,
}

/// Stage-2 payload: who is buying
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage2Data {
    #[serde(default)]
    pub customer: Option<CustomerRecord>,
    /// Attachment slot keys uploaded so far
    #[serde(default)]
    pub document_uploads: Vec<String>,
    #[serde(default)]
    pub auth_method: Option<String>,
    /// Signature slot key, once captured
    #[serde(default)]
    pub signature: Option<String>,
}

/// Stage-3 payload: how it is being paid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage3Data {
    #[serde(default)]
    pub plan: Option<InstallmentPlan>,
    #[serde(default)]
    pub tax_mode: TaxMode,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Whether the whole contract (not just the signing receipt) is
    /// VAT-bearing; decided by the host from the product lines
    #[serde(default)]
    pub contract_vat: bool,
}

/// Stage-4 payload: the terminal result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage4Data {
    #[serde(default)]
    pub outcome: Option<SubmissionOutcome>,
}

/// One stage record: payload plus completion flag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageRecord<T> {
    pub completed: bool,
    pub data: T,
}

/// The persisted session document (authoritative superset)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub step1: StageRecord<Stage1Data>,
    pub step2: StageRecord<Stage2Data>,
    pub step3: StageRecord<Stage3Data>,
    pub step4: StageRecord<Stage4Data>,
}

impl SessionState {
    /// Re-derive completion flags from the data, as the original wizard
    /// does after every update
    fn derive_completion(&mut self) {
        self.step1.completed = !self.step1.data.cart_items.is_empty();
        self.step2.completed = self.step2.data.customer.is_some();
        self.step3.completed = self.step3.data.plan.is_some();
        self.step4.completed = self.step4.data.outcome.is_some();
    }
}

/// Partial stage-1 update; `Some` fields overwrite, `None` fields keep
#[derive(Debug, Clone, Default)]
pub struct Stage1Patch {
    pub cart_items: Option<Vec<CartItem>>,
    pub branch_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Stage2Patch {
    pub customer: Option<CustomerRecord>,
    pub document_uploads: Option<Vec<String>>,
    pub auth_method: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Stage3Patch {
    pub plan: Option<InstallmentPlan>,
    pub tax_mode: Option<TaxMode>,
    pub payment_method: Option<String>,
    pub contract_vat: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Stage4Patch {
    pub outcome: Option<SubmissionOutcome>,
}

/// A shallow-merge update for one stage
#[derive(Debug, Clone)]
pub enum StagePatch {
    Product(Stage1Patch),
    Customer(Stage2Patch),
    Plan(Stage3Patch),
    Finalize(Stage4Patch),
}

impl StagePatch {
    pub fn stage(&self) -> Stage {
        match self {
            StagePatch::Product(_) => Stage::ProductSelection,
            StagePatch::Customer(_) => Stage::CustomerInfo,
            StagePatch::Plan(_) => Stage::PaymentPlan,
            StagePatch::Finalize(_) => Stage::Finalization,
        }
    }
}

/// Notification emitted after a stage update is durable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChanged {
    pub stage: Stage,
}

/// Owner of the four stage records
pub struct StepStore {
    store: Arc<SessionStore>,
    state: RwLock<SessionState>,
    change_tx: broadcast::Sender<StageChanged>,
}

impl StepStore {
    /// Load session state from the store, falling back to the legacy
    /// cart mirrors when no session document exists yet
    pub fn load(store: Arc<SessionStore>) -> StoreResult<Self> {
        let mut state: SessionState = store.get(SESSION_KEY)?.unwrap_or_default();

        if state.step1.data.cart_items.is_empty() {
            let legacy = {
                let s1 = store.clone();
                let s2 = store.clone();
                FieldResolver::new("cartItems")
                    .source("legacy:cartItems", move || {
                        s1.get::<Vec<CartItem>>(LEGACY_CART_ITEMS_KEY).ok().flatten()
                    })
                    .source("legacy:cartData", move || {
                        s2.get::<Vec<CartItem>>(LEGACY_CART_DATA_KEY).ok().flatten()
                    })
                    .resolve()
            };
            if let Some(items) = legacy.value {
                tracing::debug!(
                    source = ?legacy.source,
                    count = items.len(),
                    "restored cart from legacy mirror"
                );
                state.step1.data.cart_items = items;
            }
        }

        state.derive_completion();

        let (change_tx, _) = broadcast::channel(STAGE_CHANNEL_CAPACITY);
        Ok(Self { store, state: RwLock::new(state), change_tx })
    }

    /// Shallow-merge a patch into its stage, persist, then notify
    pub fn update(&self, patch: StagePatch) -> StoreResult<()> {
        let stage = patch.stage();
        let mut mirror_cart = None;
        {
            let mut state = self.state.write();
            match patch {
                StagePatch::Product(p) => {
                    if let Some(items) = p.cart_items {
                        state.step1.data.cart_items = items;
                        mirror_cart = Some(state.step1.data.cart_items.clone());
                    }
                    if let Some(branch) = p.branch_code {
                        state.step1.data.branch_code = Some(branch);
                    }
                }
                StagePatch::Customer(p) => {
                    if let Some(customer) = p.customer {
                        state.step2.data.customer = Some(customer);
                    }
                    if let Some(uploads) = p.document_uploads {
                        state.step2.data.document_uploads = uploads;
                    }
                    if let Some(method) = p.auth_method {
                        state.step2.data.auth_method = Some(method);
                    }
                    if let Some(signature) = p.signature {
                        state.step2.data.signature = Some(signature);
                    }
                }
                StagePatch::Plan(p) => {
                    if let Some(plan) = p.plan {
                        state.step3.data.plan = Some(plan);
                    }
                    if let Some(mode) = p.tax_mode {
                        state.step3.data.tax_mode = mode;
                    }
                    if let Some(method) = p.payment_method {
                        state.step3.data.payment_method = Some(method);
                    }
                    if let Some(flag) = p.contract_vat {
                        state.step3.data.contract_vat = flag;
                    }
                }
                StagePatch::Finalize(p) => {
                    if let Some(outcome) = p.outcome {
                        state.step4.data.outcome = Some(outcome);
                    }
                }
            }
            state.derive_completion();

            self.store.put(SESSION_KEY, &*state)?;
            if let Some(cart) = &mirror_cart {
                // Write-through for UI code still reading the old keys
                self.store.put(LEGACY_CART_ITEMS_KEY, cart)?;
                self.store.put(LEGACY_CART_DATA_KEY, cart)?;
            }
        }

        tracing::debug!(stage = stage.number(), "stage data updated");
        let _ = self.change_tx.send(StageChanged { stage });
        Ok(())
    }

    /// Record the terminal submission outcome and complete stage 4
    pub fn record_outcome(&self, outcome: SubmissionOutcome) -> StoreResult<()> {
        self.update(StagePatch::Finalize(Stage4Patch { outcome: Some(outcome) }))
    }

    // ========== Accessors ==========

    pub fn stage1(&self) -> Stage1Data {
        self.state.read().step1.data.clone()
    }

    pub fn stage2(&self) -> Stage2Data {
        self.state.read().step2.data.clone()
    }

    pub fn stage3(&self) -> Stage3Data {
        self.state.read().step3.data.clone()
    }

    pub fn stage4(&self) -> Stage4Data {
        self.state.read().step4.data.clone()
    }

    /// Stage payload as JSON, for the declarative validation rules
    pub fn payload_json(&self, stage: Stage) -> StoreResult<serde_json::Value> {
        let state = self.state.read();
        let value = match stage {
            Stage::ProductSelection => serde_json::to_value(&state.step1.data)?,
            Stage::CustomerInfo => serde_json::to_value(&state.step2.data)?,
            Stage::PaymentPlan => serde_json::to_value(&state.step3.data)?,
            Stage::Finalization => serde_json::to_value(&state.step4.data)?,
        };
        Ok(value)
    }

    pub fn is_complete(&self, stage: Stage) -> bool {
        let state = self.state.read();
        match stage {
            Stage::ProductSelection => state.step1.completed,
            Stage::CustomerInfo => state.step2.completed,
            Stage::PaymentPlan => state.step3.completed,
            Stage::Finalization => state.step4.completed,
        }
    }

    /// Explicitly mark a stage complete.
    ///
    /// Succeeds unless a hard validation rule fails; no hard rules exist
    /// today, so this always succeeds. Kept as the extension point the
    /// strict pre-submission path hangs off.
    pub fn mark_complete(&self, stage: Stage) -> StoreResult<bool> {
        {
            let mut state = self.state.write();
            match stage {
                Stage::ProductSelection => state.step1.completed = true,
                Stage::CustomerInfo => state.step2.completed = true,
                Stage::PaymentPlan => state.step3.completed = true,
                Stage::Finalization => state.step4.completed = true,
            }
            self.store.put(SESSION_KEY, &*state)?;
        }
        let _ = self.change_tx.send(StageChanged { stage });
        Ok(true)
    }

    /// Subscribe to durable stage changes
    pub fn subscribe(&self) -> broadcast::Receiver<StageChanged> {
        self.change_tx.subscribe()
    }

    // ========== Progress ==========

    /// Completed stages as a percentage (0, 25, 50, 75, 100)
    pub fn progress_percentage(&self) -> u8 {
        let state = self.state.read();
        let completed = [
            state.step1.completed,
            state.step2.completed,
            state.step3.completed,
            state.step4.completed,
        ]
        .iter()
        .filter(|c| **c)
        .count() as u8;
        completed * 100 / 4
    }

    /// First incomplete stage, or finalization when everything is done
    pub fn next_stage(&self) -> Stage {
        Stage::ALL
            .into_iter()
            .find(|s| !self.is_complete(*s))
            .unwrap_or(Stage::Finalization)
    }

    // ========== Reset / backup ==========

    /// Reset all four stages and the legacy mirrors
    pub fn clear(&self) -> StoreResult<()> {
        {
            let mut state = self.state.write();
            *state = SessionState::default();
            self.store.put(SESSION_KEY, &*state)?;
            self.store.remove_many(&[LEGACY_CART_ITEMS_KEY, LEGACY_CART_DATA_KEY])?;
        }
        tracing::info!("installment session cleared");
        for stage in Stage::ALL {
            let _ = self.change_tx.send(StageChanged { stage });
        }
        Ok(())
    }

    /// Snapshot the whole session for support tooling
    pub fn export_data(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Restore a previously exported session
    pub fn import_data(&self, mut imported: SessionState) -> StoreResult<()> {
        imported.derive_completion();
        {
            let mut state = self.state.write();
            *state = imported;
            self.store.put(SESSION_KEY, &*state)?;
            self.store.put(LEGACY_CART_ITEMS_KEY, &state.step1.data.cart_items)?;
            self.store.put(LEGACY_CART_DATA_KEY, &state.step1.data.cart_items)?;
        }
        for stage in Stage::ALL {
            let _ = self.change_tx.send(StageChanged { stage });
        }
        Ok(())
    }
}

impl std::fmt::Debug for StepStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepStore")
            .field("state", &"<SessionState>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn test_store() -> Arc<SessionStore> {
        Arc::new(SessionStore::open_in_memory().unwrap())
    }

    fn cart_item(name: &str) -> CartItem {
        CartItem {
            product_ref: format!("p-{name}"),
            name: name.to_string(),
            unit_price: Decimal::from(1000),
            quantity: 1,
            serial_or_imei: None,
            branch_code: "00001".to_string(),
            has_vat: false,
            vat_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_update_merges_per_field() {
        let steps = StepStore::load(test_store()).unwrap();
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: None,
            }))
            .unwrap();
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: None,
                branch_code: Some("00002".to_string()),
            }))
            .unwrap();

        let data = steps.stage1();
        // cart survived the second update; branch survived the first
        assert_eq!(data.cart_items.len(), 1);
        assert_eq!(data.branch_code.as_deref(), Some("00002"));
    }

    #[test]
    fn test_completion_derived_from_data() {
        let steps = StepStore::load(test_store()).unwrap();
        assert!(!steps.is_complete(Stage::ProductSelection));
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: None,
            }))
            .unwrap();
        assert!(steps.is_complete(Stage::ProductSelection));

        // emptying the cart un-completes the stage
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![]),
                branch_code: None,
            }))
            .unwrap();
        assert!(!steps.is_complete(Stage::ProductSelection));
    }

    #[test]
    fn test_state_survives_reload() {
        let store = test_store();
        {
            let steps = StepStore::load(store.clone()).unwrap();
            steps
                .update(StagePatch::Product(Stage1Patch {
                    cart_items: Some(vec![cart_item("a"), cart_item("b")]),
                    branch_code: Some("00001".to_string()),
                }))
                .unwrap();
        }
        let steps = StepStore::load(store).unwrap();
        assert_eq!(steps.stage1().cart_items.len(), 2);
        assert!(steps.is_complete(Stage::ProductSelection));
    }

    #[test]
    fn test_legacy_mirror_fallback() {
        let store = test_store();
        // an older UI wrote only the legacy key
        store.put(LEGACY_CART_ITEMS_KEY, &vec![cart_item("legacy")]).unwrap();

        let steps = StepStore::load(store).unwrap();
        assert_eq!(steps.stage1().cart_items[0].name, "legacy");
        assert!(steps.is_complete(Stage::ProductSelection));
    }

    #[test]
    fn test_mirror_written_through() {
        let store = test_store();
        let steps = StepStore::load(store.clone()).unwrap();
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: None,
            }))
            .unwrap();

        let mirrored: Option<Vec<CartItem>> = store.get(LEGACY_CART_ITEMS_KEY).unwrap();
        assert_eq!(mirrored.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notification_after_persist() {
        let store = test_store();
        let steps = StepStore::load(store.clone()).unwrap();
        let mut rx = steps.subscribe();

        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: None,
            }))
            .unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.stage, Stage::ProductSelection);
        // data is already durable by the time the notification arrives
        let persisted: SessionState = store.get(SESSION_KEY).unwrap().unwrap();
        assert_eq!(persisted.step1.data.cart_items.len(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = test_store();
        let steps = StepStore::load(store.clone()).unwrap();
        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: Some("00001".to_string()),
            }))
            .unwrap();
        steps.clear().unwrap();

        assert!(steps.stage1().cart_items.is_empty());
        assert!(!steps.is_complete(Stage::ProductSelection));
        let mirrored: Option<Vec<CartItem>> = store.get(LEGACY_CART_ITEMS_KEY).unwrap();
        assert!(mirrored.is_none());
    }

    #[test]
    fn test_progress_and_next_stage() {
        let steps = StepStore::load(test_store()).unwrap();
        assert_eq!(steps.progress_percentage(), 0);
        assert_eq!(steps.next_stage(), Stage::ProductSelection);

        steps
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: None,
            }))
            .unwrap();
        assert_eq!(steps.progress_percentage(), 25);
        assert_eq!(steps.next_stage(), Stage::CustomerInfo);
    }

    #[test]
    fn test_export_import_round_trip() {
        let store_a = test_store();
        let steps_a = StepStore::load(store_a).unwrap();
        steps_a
            .update(StagePatch::Product(Stage1Patch {
                cart_items: Some(vec![cart_item("a")]),
                branch_code: Some("00001".to_string()),
            }))
            .unwrap();

        let exported = steps_a.export_data();

        let steps_b = StepStore::load(test_store()).unwrap();
        steps_b.import_data(exported).unwrap();
        assert_eq!(steps_b.stage1().cart_items.len(), 1);
        assert!(steps_b.is_complete(Stage::ProductSelection));
    }
}
