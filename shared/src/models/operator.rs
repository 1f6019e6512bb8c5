//! Operating user identity

use serde::{Deserialize, Serialize};

/// The logged-in operator submitting on behalf of a branch.
///
/// Shape of the `GET /api/auth/me` response; the engine only reads it to
/// attribute submissions, it never manages token acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    /// Display name; older identity services return `username` instead
    #[serde(alias = "username")]
    pub name: String,
    pub branch_code: String,
    #[serde(default)]
    pub role: String,
}
