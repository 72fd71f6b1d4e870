//! Catalog entities: products and categories.

use chrono::{DateTime, Utc};
use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// A product in the catalog.
///
/// Stock is never negative; decrements happen through the store's
/// conditional decrement so a check-then-set cannot race. Products
/// referenced by historical orders are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub category_id: CategoryId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if at least one unit is available.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub category_id: CategoryId,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update of a product; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update of a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Product {
        Product {
            id: ProductId::new(),
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            price: Money::from_cents(1000),
            stock: 3,
            category_id: CategoryId::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn in_stock() {
        let mut product = widget();
        assert!(product.in_stock());
        product.stock = 0;
        assert!(!product.in_stock());
    }

    #[test]
    fn new_product_defaults_to_active() {
        let json = serde_json::json!({
            "name": "Widget",
            "description": "A widget",
            "price": 1000,
            "stock": 5,
            "category_id": CategoryId::new(),
        });
        let new: NewProduct = serde_json::from_value(json).unwrap();
        assert!(new.is_active);
    }

    #[test]
    fn patch_defaults_to_no_changes() {
        let patch = ProductPatch::default();
        assert!(patch.name.is_none());
        assert!(patch.is_active.is_none());
    }
}
