//! KYC attachment slots
//!
//! Each slot (id card photo, selfie, signature) may hold a remote URL
//! once uploaded, an inline-encoded fallback captured offline, or
//! neither. Resolution order is remote URL, then inline data, then
//! whatever value the UI still holds.

use crate::resolve::{FieldResolver, ResolvedField};
use crate::store::{SessionStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The attachment slots collected during stage 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentKind {
    IdCard,
    Selfie,
    Signature,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 3] =
        [AttachmentKind::IdCard, AttachmentKind::Selfie, AttachmentKind::Signature];

    /// Persisted slot key
    pub fn key(self) -> &'static str {
        match self {
            AttachmentKind::IdCard => "attachment.idCard",
            AttachmentKind::Selfie => "attachment.selfie",
            AttachmentKind::Signature => "attachment.signature",
        }
    }
}

/// Persisted contents of one slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSlot {
    /// URL on the document service once the upload went through
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Base64-encoded fallback captured before the upload completed
    #[serde(default)]
    pub inline_data: Option<String>,
}

/// Attachment persistence and resolution over the session store
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    store: Arc<SessionStore>,
}

impl AttachmentStore {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn put(&self, kind: AttachmentKind, slot: &AttachmentSlot) -> StoreResult<()> {
        self.store.put_attachment(kind.key(), slot)
    }

    pub fn get(&self, kind: AttachmentKind) -> StoreResult<Option<AttachmentSlot>> {
        self.store.get_attachment(kind.key())
    }

    /// Resolve the displayable value for a slot: remote URL first, then
    /// the inline fallback, then the UI-held value
    pub fn resolve(
        &self,
        kind: AttachmentKind,
        ui_value: Option<String>,
    ) -> StoreResult<ResolvedField<String>> {
        let slot = self.get(kind)?.unwrap_or_default();
        let remote = slot.remote_url;
        let inline = slot.inline_data;
        Ok(FieldResolver::new(kind.key())
            .source("remote", move || remote)
            .source("inline", move || inline)
            .source("ui", move || ui_value)
            .resolve())
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.clear_attachments()
    }
}
