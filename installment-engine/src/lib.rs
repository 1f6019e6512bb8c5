//! Installment wizard engine
//!
//! Client-resident core of the installment-contract wizard: accumulates
//! the four-stage transaction across process restarts, performs the
//! down-payment/VAT/installment arithmetic, and drives the single
//! must-not-duplicate submission against the back-office services.
//!
//! # Component graph (leaves first)
//!
//! ```text
//! SessionStore (redb)
//!     ├── StepStore ──────────── ValidationEngine
//!     ├── IdentifierAllocator
//!     └── WizardSession ─┬── FinancialCalculator (pure)
//!                        ├── StockValidator ── InventoryApi
//!                        └── SubmissionClient ── ContractApi / CustomerApi
//! ```

pub mod calc;
pub mod docnum;
pub mod kyc;
pub mod resolve;
pub mod session;
pub mod steps;
pub mod stock;
pub mod store;
pub mod submit;
pub mod validation;

// Re-exports
pub use calc::{Breakdown, CalcError, compute_breakdown, recommended_plans, validate_breakdown};
pub use docnum::{DocNumber, DocNumberError, IdentifierAllocator};
pub use kyc::{AttachmentKind, AttachmentSlot, AttachmentStore};
pub use resolve::{FieldResolver, ResolvedField};
pub use session::WizardSession;
pub use steps::{
    SessionState, Stage, Stage1Patch, Stage2Patch, Stage3Patch, Stage4Patch, StageChanged,
    StagePatch, StepStore,
};
pub use stock::{InventoryApi, StockReport, StockValidator};
pub use store::{SessionStore, StoreError};
pub use submit::{ContractApi, CustomerApi, RetryPolicy, SubmissionClient, SubmitPhase, with_retry};
pub use validation::{AdvisoryReport, StrictReport, ValidationEngine};
