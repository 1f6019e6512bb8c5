//! Customer and address models

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Thai address value object.
///
/// All components are optional; `thai_line` renders whatever is present
/// in the conventional เลขที่/หมู่/ซอย/ถนน/ตำบล/อำเภอ/จังหวัด ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub house_no: Option<String>,
    #[serde(default)]
    pub moo: Option<String>,
    #[serde(default)]
    pub lane: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub sub_district: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

impl Address {
    /// Render as a single display line for documents and receipts
    pub fn thai_line(&self) -> String {
        let mut parts = Vec::new();
        if let Some(v) = &self.house_no {
            parts.push(format!("เลขที่ {v}"));
        }
        if let Some(v) = &self.moo {
            parts.push(format!("หมู่ {v}"));
        }
        if let Some(v) = &self.lane {
            parts.push(format!("ซอย {v}"));
        }
        if let Some(v) = &self.road {
            parts.push(format!("ถนน {v}"));
        }
        if let Some(v) = &self.sub_district {
            parts.push(format!("ตำบล {v}"));
        }
        if let Some(v) = &self.district {
            parts.push(format!("อำเภอ {v}"));
        }
        if let Some(v) = &self.province {
            parts.push(format!("จังหวัด {v}"));
        }
        if let Some(v) = &self.zipcode {
            parts.push(format!("รหัสไปรษณีย์ {v}"));
        }
        if parts.is_empty() {
            "ไม่มีข้อมูล".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// National id / tax id: exactly 13 ASCII digits.
///
/// Parsing strips common separators but never pads or truncates. An input
/// that does not reduce to exactly 13 digits is rejected; padding would
/// fabricate identity data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NationalId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NationalIdError {
    #[error("national id is empty")]
    Empty,
    #[error("national id must be exactly 13 digits, got {0}")]
    WrongLength(usize),
}

impl NationalId {
    /// Parse a raw user input, stripping non-digit separators
    pub fn parse(raw: &str) -> Result<Self, NationalIdError> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(NationalIdError::Empty);
        }
        if digits.len() != 13 {
            return Err(NationalIdError::WrongLength(digits.len()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NationalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer identity collected in stage 2
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(default)]
    pub prefix: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub national_id: Option<NationalId>,
    /// Kept as the original "YYYY-MM-DD" string entered by the operator
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub address: Address,
    /// Mailing address when it differs from the primary one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_address: Option<Address>,
}

impl CustomerRecord {
    /// Display name ("{first} {last}", trimmed)
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The address contracts should be mailed to
    pub fn mailing_address(&self) -> &Address {
        self.contact_address.as_ref().unwrap_or(&self.address)
    }
}
