//! Inventory items, listed by name

use crate::models::validation::require_text;
use crate::models::{Record, RecordId, SortOrder, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback restock target when `min_stock` is zero
const DEFAULT_STOCK_TARGET: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: RecordId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_value: f64,
    #[serde(default)]
    pub min_stock: i64,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// `quantity <= min_stock`
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }

    /// Value of the items on hand (`quantity × unit_value`)
    pub fn value(&self) -> f64 {
        self.quantity as f64 * self.unit_value
    }

    /// Fill level against the restock target, clamped to `0..=100`
    ///
    /// The target is three times `min_stock`, or 10 when `min_stock` is zero.
    pub fn stock_percent(&self) -> f64 {
        let target = match self.min_stock * 3 {
            0 => DEFAULT_STOCK_TARGET,
            target => target,
        };
        (self.quantity as f64 / target as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDraft {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_value: f64,
    pub min_stock: i64,
}

impl InventoryDraft {
    /// Full patch carrying every draft field (used when editing an item)
    pub fn to_patch(&self) -> InventoryPatch {
        InventoryPatch {
            name: Some(self.name.clone()),
            category: Some(self.category.clone()),
            quantity: Some(self.quantity),
            unit_value: Some(self.unit_value),
            min_stock: Some(self.min_stock),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i64>,
}

impl Record for InventoryItem {
    type Draft = InventoryDraft;
    type Patch = InventoryPatch;

    const TABLE: &'static str = "inventory";
    const ORDER: SortOrder = SortOrder::NameAscending;

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sort_name(&self) -> &str {
        &self.name
    }

    fn materialize(id: RecordId, created_at: DateTime<Utc>, draft: &InventoryDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            category: draft.category.clone(),
            quantity: draft.quantity,
            unit_value: draft.unit_value,
            min_stock: draft.min_stock,
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &InventoryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit_value) = patch.unit_value {
            self.unit_value = unit_value;
        }
        if let Some(min_stock) = patch.min_stock {
            self.min_stock = min_stock;
        }
    }

    fn validate_draft(draft: &InventoryDraft) -> Result<(), ValidationError> {
        require_text("name", &draft.name)?;
        if draft.quantity < 0 {
            return Err(ValidationError::InvalidQuantity {
                field: "quantity".to_string(),
                value: draft.quantity,
            });
        }
        if draft.min_stock < 0 {
            return Err(ValidationError::InvalidQuantity {
                field: "min_stock".to_string(),
                value: draft.min_stock,
            });
        }
        if !draft.unit_value.is_finite() || draft.unit_value < 0.0 {
            return Err(ValidationError::invalid_amount(format!(
                "unit value must be a non-negative number, got {}",
                draft.unit_value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, min_stock: i64) -> InventoryItem {
        InventoryItem::materialize(
            RecordId::Persisted(1),
            Utc::now(),
            &InventoryDraft {
                name: "Cable".to_string(),
                category: "Hardware".to_string(),
                quantity,
                unit_value: 2.5,
                min_stock,
            },
        )
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(item(5, 5).is_low_stock());
        assert!(item(2, 5).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
    }

    #[test]
    fn test_stock_percent() {
        // target = 3 × 5 = 15
        assert!((item(3, 5).stock_percent() - 20.0).abs() < 1e-9);
        // target falls back to 10 when min_stock is 0
        assert!((item(5, 0).stock_percent() - 50.0).abs() < 1e-9);
        assert_eq!(item(100, 1).stock_percent(), 100.0);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let draft = InventoryDraft {
            name: "Paper".to_string(),
            category: "Consommable".to_string(),
            quantity: -1,
            unit_value: 1.0,
            min_stock: 1,
        };
        assert!(matches!(
            InventoryItem::validate_draft(&draft),
            Err(ValidationError::InvalidQuantity { .. })
        ));
    }
}
