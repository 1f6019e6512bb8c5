//! Cart item model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product line selected for installment purchase.
///
/// Fee lines are never represented as cart items; the document fee is
/// tracked on the payment plan and enters the totals separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product document id
    pub product_ref: String,
    pub name: String,
    /// Cash price per unit, frozen at the time the item was added
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Serial or IMEI for serialized stock; absent for fungible items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_or_imei: Option<String>,
    /// Branch whose catalog the item was picked from
    pub branch_code: String,
    #[serde(default)]
    pub has_vat: bool,
    /// VAT rate in percent (7 for standard Thai VAT)
    #[serde(default)]
    pub vat_rate: Decimal,
}

impl CartItem {
    /// Line total (`unit_price * quantity`), unrounded
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this item is tracked per unit (serial / IMEI)
    pub fn is_serialized(&self) -> bool {
        self.serial_or_imei.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, qty: u32) -> CartItem {
        CartItem {
            product_ref: "p1".to_string(),
            name: "Phone".to_string(),
            unit_price: Decimal::from(price),
            quantity: qty,
            serial_or_imei: None,
            branch_code: "00001".to_string(),
            has_vat: false,
            vat_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item(31000, 1).line_total(), Decimal::from(31000));
        assert_eq!(item(500, 3).line_total(), Decimal::from(1500));
    }

    #[test]
    fn test_is_serialized() {
        let mut i = item(100, 1);
        assert!(!i.is_serialized());
        i.serial_or_imei = Some(String::new());
        assert!(!i.is_serialized());
        i.serial_or_imei = Some("356938035643809".to_string());
        assert!(i.is_serialized());
    }
}
