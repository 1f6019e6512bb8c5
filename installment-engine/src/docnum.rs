//! Provisional / canonical document number lifecycle
//!
//! A submission attempt claims a session-local placeholder number before
//! the network call; the server-issued number replaces it on success, and
//! an abandoned attempt discards it. A discarded number is never reused,
//! so retries and parallel wizard tabs cannot collide on numbering.

use crate::store::{PROVISIONAL_DOC_KEY, SessionStore, StoreError};
use chrono::{Datelike, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Quotation-number prefix on provisional documents
const DOC_PREFIX: &str = "QT";

/// A document number in one of its two states. The only allowed
/// transition is `Provisional -> Canonical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "number", rename_all = "lowercase")]
pub enum DocNumber {
    /// Session-local placeholder pending server confirmation
    Provisional(String),
    /// Server-issued number
    Canonical(String),
}

impl DocNumber {
    pub fn as_str(&self) -> &str {
        match self {
            DocNumber::Provisional(n) | DocNumber::Canonical(n) => n,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, DocNumber::Provisional(_))
    }
}

#[derive(Debug, Error)]
pub enum DocNumberError {
    #[error("no provisional number to resolve")]
    NothingToResolve,

    /// The slot already holds a canonical number; the one allowed
    /// transition has happened
    #[error("document number already canonical")]
    AlreadyCanonical,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Allocates and retires provisional document numbers
#[derive(Debug, Clone)]
pub struct IdentifierAllocator {
    store: Arc<SessionStore>,
}

impl IdentifierAllocator {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Build and persist a fresh provisional number:
    /// `QT-{yymmdd}-{entropy}`, with the year in the Buddhist era as on
    /// every printed document.
    pub fn allocate_provisional(&self) -> Result<String, StoreError> {
        let now = Local::now();
        let buddhist_year = (now.year() + 543) % 100;
        let entropy: u16 = rand::thread_rng().gen_range(0..1000);
        let number = format!(
            "{}-{:02}{:02}{:02}-{:03}",
            DOC_PREFIX,
            buddhist_year,
            now.month(),
            now.day(),
            entropy
        );

        self.store
            .put(PROVISIONAL_DOC_KEY, &DocNumber::Provisional(number.clone()))?;
        tracing::debug!(%number, "allocated provisional document number");
        Ok(number)
    }

    /// Current slot contents, if any
    pub fn current(&self) -> Result<Option<DocNumber>, StoreError> {
        self.store.get(PROVISIONAL_DOC_KEY)
    }

    /// Replace the provisional number with the server-issued one and
    /// clear the slot. The canonical value is returned for the caller to
    /// mirror into the stage-4 payload.
    pub fn resolve(&self, canonical: &str) -> Result<DocNumber, DocNumberError> {
        match self.current()? {
            Some(DocNumber::Provisional(provisional)) => {
                self.store.remove(PROVISIONAL_DOC_KEY)?;
                tracing::debug!(%provisional, %canonical, "provisional number resolved");
                Ok(DocNumber::Canonical(canonical.to_string()))
            }
            Some(DocNumber::Canonical(_)) => Err(DocNumberError::AlreadyCanonical),
            None => Err(DocNumberError::NothingToResolve),
        }
    }

    /// Clear the slot without resolution (abandoned attempt)
    pub fn discard(&self) -> Result<(), StoreError> {
        self.store.remove(PROVISIONAL_DOC_KEY)?;
        tracing::debug!("provisional document number discarded");
        Ok(())
    }
}
