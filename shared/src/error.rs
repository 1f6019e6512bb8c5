//! Submission error taxonomy
//!
//! Every terminal submission failure is classified exactly once (at the
//! HTTP client layer) into one of these kinds. The wizard controller only
//! surfaces them. `Display` keeps the raw diagnostics; `user_message`
//! returns the localized operator-facing string.

use thiserror::Error;

/// Terminal error of a submission attempt
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    /// Client-detectable data problems; recoverable by user edit
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Items unavailable in the target branch; recoverable by item swap
    /// or branch change
    #[error("stock conflict: {}", .0.join("; "))]
    StockConflict(Vec<String>),

    /// Token missing or expired (401/403)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Endpoint or referenced resource missing (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate record (409), e.g. customer tax id already registered
    #[error("conflict: {0}")]
    Conflict(String),

    /// Retryable server-side failure (502/503/504, connection reset)
    #[error("transient server error ({status}): {body}")]
    TransientServer { status: u16, body: String },

    /// Not retried; diagnostic payload preserved for support (500, other)
    #[error("fatal server error ({status}): {body}")]
    FatalServer { status: u16, body: String },

    /// The request timed out after the server may have committed.
    /// Never auto-retried; the operator must check existing records first.
    #[error("request timed out with unknown outcome")]
    UnknownOutcome,

    /// A submission is already outstanding on this wizard session
    #[error("submission already in flight")]
    InFlight,

    /// Local persistence failed
    #[error("storage error: {0}")]
    Storage(String),
}

impl SubmitError {
    /// Localized message shown to the operator. Raw server detail stays in
    /// the variant fields and `Display` output for diagnostics.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(details) => {
                if details.is_empty() {
                    "ข้อมูลไม่ถูกต้อง กรุณาตรวจสอบข้อมูลอีกครั้ง".to_string()
                } else {
                    format!("ข้อมูลไม่ถูกต้อง กรุณาตรวจสอบ:\n• {}", details.join("\n• "))
                }
            }
            Self::StockConflict(details) => {
                format!("สินค้าไม่เพียงพอ:\n• {}", details.join("\n• "))
            }
            Self::Auth(_) => "กรุณาเข้าสู่ระบบใหม่อีกครั้ง".to_string(),
            Self::NotFound(_) => "ไม่พบบริการที่ร้องขอ".to_string(),
            Self::Conflict(_) => "ข้อมูลซ้ำในระบบ กรุณาตรวจสอบรายการเดิมก่อน".to_string(),
            Self::TransientServer { .. } => {
                "เซิร์ฟเวอร์ไม่สามารถรับคำขอได้ในขณะนี้ กรุณาลองใหม่อีกครั้ง".to_string()
            }
            Self::FatalServer { .. } => "เกิดข้อผิดพลาดในเซิร์ฟเวอร์".to_string(),
            Self::UnknownOutcome => {
                "หมดเวลารอการตอบกลับ ระบบอาจบันทึกสัญญาแล้ว กรุณาตรวจสอบรายการสัญญาก่อนส่งซ้ำ"
                    .to_string()
            }
            Self::InFlight => "กำลังดำเนินการอยู่ กรุณารอสักครู่".to_string(),
            Self::Storage(_) => "ไม่สามารถบันทึกข้อมูลในเครื่องได้".to_string(),
        }
    }

    /// Whether the submission flow may re-issue the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientServer { .. })
    }
}

/// Result type for submission operations
pub type SubmitResult<T> = Result<T, SubmitError>;
