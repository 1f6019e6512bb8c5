//! The terminal submission flow
//!
//! # Attempt state machine
//!
//! ```text
//! Idle -> Validating -> StockChecking -> Sending
//!             ^                             │
//!             │                     {Retrying -> Sending}*
//!             │                             │
//!         (next attempt)          {Succeeded | Failed}
//! ```
//!
//! Every attempt re-runs `Validating`; stale validation is never trusted.
//! Stock problems abort before any contract call (no partial side
//! effects). On success the provisional document number is resolved and
//! stage 4 completed before the outcome is returned; on terminal failure
//! the provisional number is discarded and all stage records are left
//! untouched so the operator can correct and resubmit.

mod retry;

pub use retry::{RetryPolicy, with_retry};

use crate::docnum::{DocNumberError, IdentifierAllocator};
use crate::calc::validate_breakdown;
use crate::steps::{Stage, StepStore};
use crate::stock::{InventoryApi, StockValidator};
use crate::store::StoreError;
use crate::validation::ValidationEngine;
use async_trait::async_trait;
use installment_client::{ClientError, ClientResult, HttpClient};
use parking_lot::RwLock;
use shared::error::{SubmitError, SubmitResult};
use shared::models::CustomerRecord;
use shared::request::{ContractRequest, CustomerCreate, IndividualCustomer};
use shared::response::{ContractCreated, CustomerSummary, SubmissionOutcome};
use std::sync::Arc;

/// Contract-creation endpoint consumed by the submission flow
#[async_trait]
pub trait ContractApi: Send + Sync {
    async fn create_contract(&self, request: &ContractRequest) -> ClientResult<ContractCreated>;
}

#[async_trait]
impl ContractApi for HttpClient {
    async fn create_contract(&self, request: &ContractRequest) -> ClientResult<ContractCreated> {
        HttpClient::create_contract(self, request).await
    }
}

/// Customer search / create endpoints used to avoid duplicate records
#[async_trait]
pub trait CustomerApi: Send + Sync {
    async fn search_customers(&self, query: &str, limit: u32) -> ClientResult<Vec<CustomerSummary>>;
    async fn create_customer(&self, customer: &CustomerCreate) -> ClientResult<CustomerSummary>;
}

#[async_trait]
impl CustomerApi for HttpClient {
    async fn search_customers(&self, query: &str, limit: u32) -> ClientResult<Vec<CustomerSummary>> {
        HttpClient::search_customers(self, query, limit).await
    }

    async fn create_customer(&self, customer: &CustomerCreate) -> ClientResult<CustomerSummary> {
        HttpClient::create_customer(self, customer).await
    }
}

/// Where a submission attempt currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Validating,
    StockChecking,
    Sending,
    Retrying { attempt: u32 },
    Succeeded,
    Failed,
}

/// Drives one submission attempt end to end
pub struct SubmissionClient {
    contracts: Arc<dyn ContractApi>,
    customers: Arc<dyn CustomerApi>,
    stock: StockValidator<Arc<dyn InventoryApi>>,
    allocator: IdentifierAllocator,
    steps: Arc<StepStore>,
    policy: RetryPolicy,
    phase: Arc<RwLock<SubmitPhase>>,
}

impl SubmissionClient {
    pub fn new(
        contracts: Arc<dyn ContractApi>,
        customers: Arc<dyn CustomerApi>,
        inventory: Arc<dyn InventoryApi>,
        allocator: IdentifierAllocator,
        steps: Arc<StepStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            contracts,
            customers,
            stock: StockValidator::new(inventory),
            allocator,
            steps,
            policy,
            phase: Arc::new(RwLock::new(SubmitPhase::Idle)),
        }
    }

    /// Current attempt phase
    pub fn phase(&self) -> SubmitPhase {
        *self.phase.read()
    }

    fn set_phase(&self, phase: SubmitPhase) {
        *self.phase.write() = phase;
    }

    /// Run the full submission flow for an assembled request.
    ///
    /// Stages are only mutated on success; every terminal failure leaves
    /// them untouched and discards the provisional document number.
    pub async fn submit(&self, mut request: ContractRequest) -> SubmitResult<SubmissionOutcome> {
        match self.run(&mut request).await {
            Ok(outcome) => {
                self.set_phase(SubmitPhase::Succeeded);
                Ok(outcome)
            }
            Err(err) => {
                if let Err(discard_err) = self.allocator.discard() {
                    tracing::error!(%discard_err, "failed to discard provisional number");
                }
                self.set_phase(SubmitPhase::Failed);
                tracing::warn!(error = %err, "submission failed: {}", err.user_message());
                Err(err)
            }
        }
    }

    async fn run(&self, request: &mut ContractRequest) -> SubmitResult<SubmissionOutcome> {
        // 1. Strict re-validation of stages 1-3; advisory results from
        //    earlier navigation are never trusted here.
        self.set_phase(SubmitPhase::Validating);
        self.allocator.allocate_provisional().map_err(store_error)?;

        let mut errors = Vec::new();
        for stage in [Stage::ProductSelection, Stage::CustomerInfo, Stage::PaymentPlan] {
            let report =
                ValidationEngine::validate_strict(&self.steps, stage).map_err(store_error)?;
            errors.extend(report.errors);
        }

        let stage1 = self.steps.stage1();
        let stage3 = self.steps.stage3();
        if let Some(plan) = &stage3.plan {
            match validate_breakdown(&stage1.cart_items, plan) {
                Ok(warnings) => {
                    for warning in warnings {
                        tracing::warn!(%warning, "plan accepted with warning");
                    }
                }
                Err(calc_err) => errors.push(calc_err.to_string()),
            }
        }

        if !errors.is_empty() {
            return Err(SubmitError::Validation(errors));
        }

        // 2. Stock pre-flight; abort before any contract call
        self.set_phase(SubmitPhase::StockChecking);
        let report = self
            .stock
            .check_availability(&stage1.cart_items, &request.branch_code)
            .await
            .map_err(classify)?;
        if !report.valid {
            return Err(SubmitError::StockConflict(report.errors));
        }

        // 3. Resolve the customer document before contract creation
        if request.customer_id.is_none() {
            let customer = self
                .steps
                .stage2()
                .customer
                .ok_or_else(|| SubmitError::Validation(vec!["กรุณากรอกข้อมูลลูกค้า".to_string()]))?;
            let customer_id = self
                .find_or_create_customer(&customer, &request.branch_code)
                .await?;
            request.customer_id = Some(customer_id);
        }

        // 4. Send with bounded linear-backoff retries
        self.set_phase(SubmitPhase::Sending);
        let contracts = self.contracts.clone();
        let phase = self.phase.clone();
        let send_request = request.clone();
        let created = with_retry(
            move |attempt| {
                let contracts = contracts.clone();
                let request = send_request.clone();
                if attempt > 1 {
                    *phase.write() = SubmitPhase::Retrying { attempt };
                }
                let phase = phase.clone();
                async move {
                    *phase.write() = SubmitPhase::Sending;
                    contracts.create_contract(&request).await
                }
            },
            &self.policy,
            ClientError::is_retryable,
        )
        .await
        .map_err(classify)?;

        // 5. Success: swap the provisional number for the canonical one
        //    and complete stage 4, atomically with returning the outcome
        self.allocator
            .resolve(&created.quotation_no)
            .map_err(docnum_error)?;

        let outcome = SubmissionOutcome {
            quotation_no: created.quotation_no,
            contract_no: created.contract_no,
            invoice_no: created.invoice_no,
            success: true,
            stock_outcome: None,
        };
        self.steps.record_outcome(outcome.clone()).map_err(store_error)?;

        tracing::info!(
            quotation = %outcome.quotation_no,
            contract = %outcome.contract_no,
            "installment contract created"
        );
        Ok(outcome)
    }

    /// Search for an existing customer (by tax id, then phone) before
    /// creating one; a duplicate-tax-id conflict means the record was
    /// created concurrently, so search once more instead of failing.
    async fn find_or_create_customer(
        &self,
        customer: &CustomerRecord,
        branch_code: &str,
    ) -> SubmitResult<String> {
        let query = customer
            .national_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| customer.phone.clone());

        if let Some(found) = self.search_one(&query).await? {
            tracing::debug!(customer_id = %found.id, "using existing customer record");
            return Ok(found.id);
        }

        let create = CustomerCreate {
            customer_type: "individual".to_string(),
            individual: IndividualCustomer {
                prefix: customer.prefix.clone(),
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                tax_id: customer.national_id.as_ref().map(|id| id.as_str().to_string()),
                phone: customer.phone.clone(),
                email: customer.email.clone(),
                birth_date: customer.birth_date.clone(),
                address: customer.mailing_address().thai_line(),
            },
            branch_code: branch_code.to_string(),
            status: "active".to_string(),
        };

        match self.customers.create_customer(&create).await {
            Ok(created) => Ok(created.id),
            Err(ClientError::Conflict(_)) => {
                // created concurrently; one re-search before giving up
                self.search_one(&query)
                    .await?
                    .map(|found| found.id)
                    .ok_or_else(|| {
                        SubmitError::Conflict(
                            "duplicate customer exists but could not be found".to_string(),
                        )
                    })
            }
            Err(err) => Err(classify(err)),
        }
    }

    async fn search_one(&self, query: &str) -> SubmitResult<Option<CustomerSummary>> {
        let mut matches = self
            .customers
            .search_customers(query, 1)
            .await
            .map_err(classify)?;
        Ok(if matches.is_empty() { None } else { Some(matches.remove(0)) })
    }
}

impl std::fmt::Debug for SubmissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionClient")
            .field("policy", &self.policy)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

fn store_error(err: StoreError) -> SubmitError {
    SubmitError::Storage(err.to_string())
}

fn docnum_error(err: DocNumberError) -> SubmitError {
    SubmitError::Storage(err.to_string())
}

/// Map a transport-layer error into the submission taxonomy.
/// Classification happens here exactly once; callers only surface.
fn classify(err: ClientError) -> SubmitError {
    match err {
        ClientError::Timeout => SubmitError::UnknownOutcome,
        ClientError::Validation(body) => SubmitError::Validation(vec![body]),
        ClientError::Unauthorized => SubmitError::Auth("authentication required".to_string()),
        ClientError::Forbidden(body) => SubmitError::Auth(body),
        ClientError::NotFound(body) => SubmitError::NotFound(body),
        ClientError::Conflict(body) => SubmitError::Conflict(body),
        ClientError::RateLimited(body) => SubmitError::TransientServer { status: 429, body },
        ClientError::Transient { status, body } => SubmitError::TransientServer { status, body },
        ClientError::Internal { status, body } => SubmitError::FatalServer { status, body },
        ClientError::Http(e) => {
            if e.is_timeout() {
                SubmitError::UnknownOutcome
            } else if e.is_connect() {
                // no status line ever arrived
                SubmitError::TransientServer { status: 0, body: e.to_string() }
            } else {
                SubmitError::FatalServer { status: 0, body: e.to_string() }
            }
        }
        ClientError::InvalidResponse(body) => SubmitError::FatalServer { status: 0, body },
        ClientError::Serialization(e) => SubmitError::FatalServer { status: 0, body: e.to_string() },
    }
}
