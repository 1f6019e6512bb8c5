//! Pre-flight branch-scoped stock validation
//!
//! The most common real-world failure is an item picked while browsing
//! branch A's catalog in a session that is now scoped to branch B, so
//! every mismatch is reported per item with both branches named.
//!
//! Only serialized items (serial / IMEI) are checked against the
//! inventory service; items without a serialized identity are
//! branch-fungible and always valid.

use async_trait::async_trait;
use installment_client::{ClientResult, HttpClient};
use shared::models::CartItem;
use shared::request::{StockCheckItem, StockCheckRequest};
use shared::response::StockCheckResult;

/// Branch-scoped inventory query consumed by the validator.
/// Implemented over the real endpoint by [`HttpClient`]; tests mock it.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn check_stock(&self, request: &StockCheckRequest) -> ClientResult<StockCheckResult>;
}

#[async_trait]
impl InventoryApi for HttpClient {
    async fn check_stock(&self, request: &StockCheckRequest) -> ClientResult<StockCheckResult> {
        HttpClient::check_stock(self, request).await
    }
}

#[async_trait]
impl<T: InventoryApi + ?Sized> InventoryApi for std::sync::Arc<T> {
    async fn check_stock(&self, request: &StockCheckRequest) -> ClientResult<StockCheckResult> {
        (**self).check_stock(request).await
    }
}

/// Result of the availability pre-flight
#[derive(Debug, Clone)]
pub struct StockReport {
    pub valid: bool,
    pub errors: Vec<String>,
    /// Items confirmed available (or fungible) in the target branch
    pub valid_items: Vec<CartItem>,
}

/// Availability checker over an [`InventoryApi`]
pub struct StockValidator<I> {
    api: I,
}

impl<I: InventoryApi> StockValidator<I> {
    pub fn new(api: I) -> Self {
        Self { api }
    }

    /// Check that every serialized unit is recorded as available in
    /// `target_branch`. Never deducts stock.
    pub async fn check_availability(
        &self,
        items: &[CartItem],
        target_branch: &str,
    ) -> ClientResult<StockReport> {
        let mut errors = Vec::new();
        let mut valid_items: Vec<CartItem> = Vec::new();
        let mut serialized: Vec<&CartItem> = Vec::new();

        for item in items {
            if item.is_serialized() {
                serialized.push(item);
            } else {
                valid_items.push(item.clone());
            }
        }

        if serialized.is_empty() {
            return Ok(StockReport { valid: true, errors, valid_items });
        }

        let request = StockCheckRequest {
            branch_code: target_branch.to_string(),
            check_only: true,
            items: serialized
                .iter()
                .map(|item| StockCheckItem {
                    product_id: item.product_ref.clone(),
                    quantity: item.quantity,
                    imei: item.serial_or_imei.clone(),
                })
                .collect(),
        };

        let result = self.api.check_stock(&request).await?;

        for item in serialized {
            let imei = item.serial_or_imei.as_deref().unwrap_or_default();
            let unit = result
                .results
                .iter()
                .find(|r| r.imei.as_deref() == Some(imei) || r.product_id == item.product_ref);

            match unit {
                Some(r) if r.available => valid_items.push(item.clone()),
                Some(r) => {
                    let message = match r.recorded_branch.as_deref() {
                        Some(recorded) if recorded != target_branch => format!(
                            "{} (IMEI {}) อยู่ที่สาขา {} ไม่ใช่สาขา {}",
                            item.name, imei, recorded, target_branch
                        ),
                        _ => format!(
                            "{} (IMEI {}) ไม่มีในสต๊อกของสาขา {}",
                            item.name, imei, target_branch
                        ),
                    };
                    tracing::warn!(
                        product = %item.product_ref,
                        imei,
                        recorded = ?r.recorded_branch,
                        target = target_branch,
                        "stock check failed for item"
                    );
                    errors.push(message);
                }
                None => {
                    errors.push(format!(
                        "{} (IMEI {}) ไม่พบข้อมูลสต๊อกในสาขา {}",
                        item.name, imei, target_branch
                    ));
                }
            }
        }

        Ok(StockReport { valid: errors.is_empty(), errors, valid_items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use installment_client::ClientError;
    use rust_decimal::Decimal;
    use shared::response::StockItemResult;

    struct FakeInventory {
        results: Vec<StockItemResult>,
        fail: bool,
    }

    #[async_trait]
    impl InventoryApi for FakeInventory {
        async fn check_stock(&self, _request: &StockCheckRequest) -> ClientResult<StockCheckResult> {
            if self.fail {
                return Err(ClientError::Transient { status: 503, body: "down".to_string() });
            }
            Ok(StockCheckResult { results: self.results.clone() })
        }
    }

    fn item(name: &str, imei: Option<&str>) -> CartItem {
        CartItem {
            product_ref: format!("p-{name}"),
            name: name.to_string(),
            unit_price: Decimal::from(1000),
            quantity: 1,
            serial_or_imei: imei.map(str::to_string),
            branch_code: "A".to_string(),
            has_vat: false,
            vat_rate: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_branch_mismatch_names_both_branches() {
        let validator = StockValidator::new(FakeInventory {
            results: vec![StockItemResult {
                product_id: "p-phone".to_string(),
                imei: Some("3569".to_string()),
                available: false,
                recorded_branch: Some("B".to_string()),
                error: None,
            }],
            fail: false,
        });

        let report = validator
            .check_availability(&[item("phone", Some("3569"))], "A")
            .await
            .unwrap();

        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("สาขา B"), "missing recorded branch: {}", report.errors[0]);
        assert!(report.errors[0].contains("สาขา A"), "missing target branch: {}", report.errors[0]);
    }

    #[tokio::test]
    async fn test_fungible_items_skip_inventory() {
        // would fail if the API were consulted
        let validator = StockValidator::new(FakeInventory { results: vec![], fail: true });

        let report = validator
            .check_availability(&[item("charger", None)], "A")
            .await
            .unwrap();

        assert!(report.valid);
        assert_eq!(report.valid_items.len(), 1);
    }

    #[tokio::test]
    async fn test_available_serialized_item_passes() {
        let validator = StockValidator::new(FakeInventory {
            results: vec![StockItemResult {
                product_id: "p-phone".to_string(),
                imei: Some("3569".to_string()),
                available: true,
                recorded_branch: Some("A".to_string()),
                error: None,
            }],
            fail: false,
        });

        let report = validator
            .check_availability(&[item("phone", Some("3569")), item("charger", None)], "A")
            .await
            .unwrap();

        assert!(report.valid);
        assert_eq!(report.valid_items.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_unit_reported() {
        let validator = StockValidator::new(FakeInventory { results: vec![], fail: false });

        let report = validator
            .check_availability(&[item("phone", Some("3569"))], "A")
            .await
            .unwrap();

        assert!(!report.valid);
        assert!(report.errors[0].contains("ไม่พบข้อมูลสต๊อก"));
    }
}
